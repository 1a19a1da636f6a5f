mod kv;
mod message;
mod pledge;
mod shared;
mod template;
mod template_usage;
mod transaction;

use kv::{IKeyValueRepo, InMemoryKeyValueRepo, PostgresKeyValueRepo};
use message::{IMessageRepo, InMemoryMessageRepo, PostgresMessageRepo};
use pledge::{IPledgeRepo, InMemoryPledgeRepo, PostgresPledgeRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use template::{ITemplateRepo, InMemoryTemplateRepo, PostgresTemplateRepo};
use template_usage::{ITemplateUsageRepo, InMemoryTemplateUsageRepo, PostgresTemplateUsageRepo};
use tracing::info;
use transaction::{ITransactionRepo, InMemoryTransactionRepo, PostgresTransactionRepo};

#[derive(Clone)]
pub struct Repos {
    pub pledges: Arc<dyn IPledgeRepo>,
    pub transactions: Arc<dyn ITransactionRepo>,
    pub messages: Arc<dyn IMessageRepo>,
    pub templates: Arc<dyn ITemplateRepo>,
    pub template_usages: Arc<dyn ITemplateUsageRepo>,
    pub key_value: Arc<dyn IKeyValueRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            pledges: Arc::new(PostgresPledgeRepo::new(pool.clone())),
            transactions: Arc::new(PostgresTransactionRepo::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepo::new(pool.clone())),
            templates: Arc::new(PostgresTemplateRepo::new(pool.clone())),
            template_usages: Arc::new(PostgresTemplateUsageRepo::new(pool.clone())),
            key_value: Arc::new(PostgresKeyValueRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            pledges: Arc::new(InMemoryPledgeRepo::new()),
            transactions: Arc::new(InMemoryTransactionRepo::new()),
            messages: Arc::new(InMemoryMessageRepo::new()),
            templates: Arc::new(InMemoryTemplateRepo::new()),
            template_usages: Arc::new(InMemoryTemplateUsageRepo::new()),
            key_value: Arc::new(InMemoryKeyValueRepo::new()),
        }
    }
}
