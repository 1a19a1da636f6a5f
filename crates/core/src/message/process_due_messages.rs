use super::send_message::SendMessageUseCase;
use crate::error::PledgerError;
use crate::shared::usecase::{execute, UseCase};
use pledger_domain::Message;
use pledger_infra::PledgerContext;
use tracing::{error, info};

/// One dispatch pass. Always covers the scheduled batch, and also the
/// retry batch when the slower retry cadence has elapsed.
#[derive(Debug)]
pub struct ProcessDueMessagesUseCase {
    pub retry_pass_due: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct ProcessedMessages {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
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
impl UseCase for ProcessDueMessagesUseCase {
    type Response = ProcessedMessages;

    type Error = UseCaseError;

    const NAME: &'static str = "ProcessDueMessages";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.now();
        let limit = ctx.config.message_batch_limit;

        let scheduled = ctx
            .repos
            .messages
            .find_due_scheduled(now, limit)
            .await
            .map_err(|e| {
                error!("Unable to fetch due messages: {:?}", e);
                UseCaseError::StorageError
            })?;

        // Snapshot the retry batch up front so a message failing in the
        // scheduled batch below is not retried within the same pass.
        let retries = if self.retry_pass_due {
            ctx.repos
                .messages
                .find_retry_eligible(ctx.config.max_message_retries, limit)
                .await
                .map_err(|e| {
                    error!("Unable to fetch retry eligible messages: {:?}", e);
                    UseCaseError::StorageError
                })?
        } else {
            Vec::new()
        };

        let mut outcome = ProcessedMessages::default();
        dispatch_batch(ctx, scheduled, &mut outcome).await;
        dispatch_batch(ctx, retries, &mut outcome).await;

        if outcome.attempted > 0 {
            info!(
                "Dispatched {} messages, {} delivered and {} failed",
                outcome.attempted, outcome.delivered, outcome.failed
            );
        }

        Ok(outcome)
    }
}

async fn dispatch_batch(
    ctx: &PledgerContext,
    batch: Vec<Message>,
    outcome: &mut ProcessedMessages,
) {
    for message in batch {
        outcome.attempted += 1;
        let usecase = SendMessageUseCase {
            message_id: message.id,
        };
        // Outcomes live on the message records, a failure here never
        // stops the rest of the batch
        match execute(usecase, ctx).await {
            Ok(_) => outcome.delivered += 1,
            Err(_) => outcome.failed += 1,
        }
    }
}
