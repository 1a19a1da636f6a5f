use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{Message, MessageChannel, ID};
use pledger_infra::{EmailPayload, PledgerContext, SmsPayload};
use tracing::{error, warn};

/// Delivers one stored message over its channel and records the outcome
/// on the record itself.
#[derive(Debug)]
pub struct SendMessageUseCase {
    pub message_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    DeliveryFailed { message_id: ID, reason: String },
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(message_id) => Self::NotFound(format!(
                "The message with id: {}, was not found.",
                message_id
            )),
            UseCaseError::DeliveryFailed { message_id, reason } => Self::Conflict(format!(
                "The message with id: {}, could not be delivered: {}.",
                message_id, reason
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for SendMessageUseCase {
    type Response = Message;

    type Error = UseCaseError;

    const NAME: &'static str = "SendMessage";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let mut message = match ctx.repos.messages.find(&self.message_id).await {
            Some(message) => message,
            None => return Err(UseCaseError::NotFound(self.message_id.clone())),
        };

        // Read back right before dispatch, a concurrent pass may have
        // delivered the record already
        if message.is_sent {
            return Ok(message);
        }

        let mut subject = message.subject.clone();
        let mut body = message.body.clone();
        let mut is_html = message.is_html;

        // Template born messages are re-rendered from the template as it
        // is now, with the values captured when the message was created.
        // The stored content may be stale.
        if let Some(usage) = ctx.repos.template_usages.find_by_message(&message.id).await {
            match ctx.repos.templates.find(&usage.template_id).await {
                Some(template) => match template.render(&usage.values) {
                    Ok(rendered) => {
                        subject = rendered.subject.or(subject);
                        body = rendered.body;
                        is_html = template.is_html;
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        return self.record_failure(ctx, message, reason).await;
                    }
                },
                None => {
                    warn!(
                        "Template with id: {} behind message with id: {} is gone, sending the stored content",
                        usage.template_id, message.id
                    );
                }
            }
        }

        let delivery = match message.channel {
            MessageChannel::Email => {
                ctx.transport
                    .send_email(&EmailPayload {
                        to: message.recipient.clone(),
                        from: message.sender.clone(),
                        subject: subject.unwrap_or_default(),
                        body,
                        is_html,
                    })
                    .await
            }
            MessageChannel::Sms => {
                ctx.transport
                    .send_sms(&SmsPayload {
                        to: message.recipient.clone(),
                        from: message.sender.clone(),
                        body,
                    })
                    .await
            }
        };

        match delivery {
            Ok(()) => {
                message.mark_sent(ctx.sys.now());
                ctx.repos
                    .messages
                    .save(&message)
                    .await
                    .map_err(|e| {
                        error!(
                            "Unable to save message with id: {} after delivery. Error: {:?}",
                            message.id, e
                        );
                        UseCaseError::StorageError
                    })?;
                Ok(message)
            }
            Err(e) => {
                let reason = e.to_string();
                self.record_failure(ctx, message, reason).await
            }
        }
    }
}

impl SendMessageUseCase {
    async fn record_failure(
        &self,
        ctx: &PledgerContext,
        mut message: Message,
        reason: String,
    ) -> Result<Message, UseCaseError> {
        message.register_failure(&reason);
        if let Err(e) = ctx.repos.messages.save(&message).await {
            error!(
                "Unable to save message with id: {} after a failed delivery. Error: {:?}",
                message.id, e
            );
            return Err(UseCaseError::StorageError);
        }
        Err(UseCaseError::DeliveryFailed {
            message_id: message.id,
            reason,
        })
    }
}
