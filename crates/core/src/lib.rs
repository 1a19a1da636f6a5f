mod error;
mod job_schedulers;
pub mod message;
pub mod pledge;
mod shared;
pub mod template;

use job_schedulers::{start_charge_job_scheduler, start_message_job_scheduler};
use pledger_infra::PledgerContext;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

pub use error::PledgerError;
pub use shared::usecase::{execute, Subscriber, UseCase};

pub struct Application {
    context: PledgerContext,
}

impl Application {
    pub fn new(context: PledgerContext) -> Self {
        Self { context }
    }

    fn start_job_schedulers(
        context: PledgerContext,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        vec![
            start_charge_job_scheduler(context.clone(), shutdown.clone()),
            start_message_job_scheduler(context, shutdown),
        ]
    }

    /// Runs the job schedulers until a shutdown signal arrives, then
    /// drains them so a charge in flight is never cut off mid batch.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workers = Application::start_job_schedulers(self.context, shutdown_rx);

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received, draining the job schedulers");
        let _ = shutdown_tx.send(true);
        for worker in workers {
            let _ = worker.await;
        }

        Ok(())
    }
}
