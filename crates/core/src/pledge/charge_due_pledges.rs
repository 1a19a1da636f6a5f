use super::subscribers::SendReceiptsOnChargedPledges;
use crate::error::PledgerError;
use crate::shared::usecase::{Subscriber, UseCase};
use pledger_domain::{ChargeTransaction, PledgeStatus, RecurringPledge, ID};
use pledger_infra::{ChargeRequest, PledgerContext};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// One pass over every active pledge whose due date has elapsed. Each
/// pledge is charged in isolation, an outcome on one never blocks the
/// rest of the batch.
#[derive(Debug)]
pub struct ChargeDuePledgesUseCase {
    /// Flipped on shutdown. The pass finishes the pledge in flight and
    /// leaves the rest for the next tick.
    pub stop: Option<watch::Receiver<bool>>,
}

#[derive(Debug)]
pub struct ChargedPledge {
    pub pledge: RecurringPledge,
    pub transaction: ChargeTransaction,
}

#[derive(Debug)]
pub struct FailedCharge {
    pub pledge_id: ID,
    pub reason: String,
    /// Set when the attempt ceiling was reached and the pledge will not
    /// be retried until its payment method is replaced.
    pub terminal: bool,
}

#[derive(Debug, Default)]
pub struct ChargedBatch {
    pub charged: Vec<ChargedPledge>,
    pub failed: Vec<FailedCharge>,
    /// Pledges left untouched because their bookkeeping could not be
    /// stored. They stay due and are retried on the next tick.
    pub skipped: usize,
}

impl ChargedBatch {
    pub fn processed(&self) -> usize {
        self.charged.len() + self.failed.len()
    }
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ChargeDuePledgesUseCase {
    type Response = ChargedBatch;

    type Error = UseCaseError;

    const NAME: &'static str = "ChargeDuePledges";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.now();
        let due = ctx
            .repos
            .pledges
            .find_due(now, ctx.config.pledge_batch_limit)
            .await
            .map_err(|e| {
                error!("Unable to fetch due pledges: {:?}", e);
                UseCaseError::StorageError
            })?;

        if !due.is_empty() {
            info!("Charging {} due pledges", due.len());
        }

        let mut batch = ChargedBatch::default();
        for mut pledge in due {
            if self.stop_requested() {
                info!("Shutdown requested, leaving the rest of the charge batch");
                break;
            }

            let attempted_at = ctx.sys.now();
            let order_reference = pledge.order_reference(attempted_at);
            let request = ChargeRequest {
                amount: pledge.charge_amount(),
                currency: pledge.currency.clone(),
                payment_token: pledge.payment_token.clone(),
                order_reference: order_reference.clone(),
            };

            match ctx.gateway.charge(request).await {
                Ok(receipt) => {
                    let transaction = ChargeTransaction::new(
                        pledge.id.clone(),
                        pledge.charge_amount(),
                        pledge.currency.clone(),
                        receipt.transaction_reference,
                        order_reference,
                        attempted_at,
                    );
                    if let Err(e) = ctx.repos.transactions.insert(&transaction).await {
                        error!(
                            "Unable to store the charge transaction for pledge with id: {}. Error: {:?}",
                            pledge.id, e
                        );
                        batch.skipped += 1;
                        continue;
                    }
                    pledge.register_success(attempted_at);
                    if let Err(e) = ctx.repos.pledges.save(&pledge).await {
                        error!(
                            "Unable to save pledge with id: {} after a successful charge. Error: {:?}",
                            pledge.id, e
                        );
                        batch.skipped += 1;
                        continue;
                    }
                    batch.charged.push(ChargedPledge {
                        pledge,
                        transaction,
                    });
                }
                Err(e) => {
                    let reason = e.to_string();
                    pledge.register_failure(
                        attempted_at,
                        &reason,
                        ctx.config.max_failed_attempts,
                    );
                    let terminal = pledge.status == PledgeStatus::Failed;
                    if terminal {
                        warn!(
                            "Pledge with id: {} reached the attempt ceiling and was parked as failed",
                            pledge.id
                        );
                    }
                    if let Err(e) = ctx.repos.pledges.save(&pledge).await {
                        error!(
                            "Unable to save pledge with id: {} after a failed charge. Error: {:?}",
                            pledge.id, e
                        );
                        batch.skipped += 1;
                        continue;
                    }
                    batch.failed.push(FailedCharge {
                        pledge_id: pledge.id,
                        reason,
                        terminal,
                    });
                }
            }
        }

        Ok(batch)
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(SendReceiptsOnChargedPledges)]
    }
}

impl ChargeDuePledgesUseCase {
    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map(|stop| *stop.borrow()).unwrap_or(false)
    }
}
