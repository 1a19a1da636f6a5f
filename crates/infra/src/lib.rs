mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
use repos::Repos;
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct PledgerContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub gateway: Arc<dyn IPaymentGateway>,
    pub transport: Arc<dyn INotificationTransport>,
}

struct ContextParams {
    pub postgres_connection_string: String,
    pub gateway: Arc<dyn IPaymentGateway>,
    pub transport: Arc<dyn INotificationTransport>,
}

impl PledgerContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        Self {
            repos,
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            gateway: params.gateway,
            transport: params.transport,
        }
    }

    /// Context backed entirely by inmemory collaborators, useful for tests
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            gateway: Arc::new(InMemoryPaymentGateway::new()),
            transport: Arc::new(InMemoryNotificationTransport::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> PledgerContext {
    PledgerContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
        gateway: Arc::new(HttpPaymentGateway::new(
            get_env_var("GATEWAY_API_URL"),
            get_env_var("GATEWAY_API_KEY"),
        )),
        transport: Arc::new(HttpNotificationTransport::new(
            get_env_var("RELAY_API_URL"),
            get_env_var("RELAY_API_KEY"),
        )),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

fn get_env_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{} env var to be present.", name))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
