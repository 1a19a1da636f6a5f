use super::subscribers::DispatchImmediatelyOnScheduled;
use crate::error::PledgerError;
use crate::shared::usecase::{Subscriber, UseCase};
use chrono::{DateTime, Utc};
use pledger_domain::{Message, MessageChannel, PlaceholderValues, TemplateUsage, ID};
use pledger_infra::PledgerContext;

/// Content of a new message, either written out by the caller or
/// produced from a stored template.
#[derive(Debug)]
pub enum MessageContent {
    AdHoc {
        subject: Option<String>,
        body: String,
        is_html: bool,
    },
    FromTemplate {
        template_id: ID,
        values: PlaceholderValues,
    },
}

#[derive(Debug)]
pub struct ScheduleMessageUseCase {
    pub channel: MessageChannel,
    pub recipient: String,
    /// Falls back to the template's default sender on the template path.
    pub sender: Option<String>,
    /// None means send on the first opportunity.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub content: MessageContent,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidRecipient(String),
    MissingSender,
    MissingSubject,
    TemplateNotFound(ID),
    ChannelMismatch {
        requested: MessageChannel,
        template: MessageChannel,
    },
    MissingPlaceholderValues(Vec<String>),
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidRecipient(recipient) => Self::BadClientData(format!(
                "The recipient: {}, is not valid for the chosen channel.",
                recipient
            )),
            UseCaseError::MissingSender => {
                Self::BadClientData("A sender is required for an ad hoc message".into())
            }
            UseCaseError::MissingSubject => {
                Self::BadClientData("A subject is required for an email message".into())
            }
            UseCaseError::TemplateNotFound(template_id) => Self::NotFound(format!(
                "The message template with id: {}, was not found.",
                template_id
            )),
            UseCaseError::ChannelMismatch {
                requested,
                template,
            } => Self::BadClientData(format!(
                "The template is written for channel {} and cannot back a {} message.",
                template, requested
            )),
            UseCaseError::MissingPlaceholderValues(names) => Self::BadClientData(format!(
                "Values are missing for the placeholders: {}.",
                names.join(", ")
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleMessageUseCase {
    type Response = Message;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleMessage";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let valid_recipient = match self.channel {
            MessageChannel::Email => {
                !self.recipient.is_empty() && self.recipient.contains('@')
            }
            MessageChannel::Sms => !self.recipient.trim().is_empty(),
        };
        if !valid_recipient {
            return Err(UseCaseError::InvalidRecipient(self.recipient.clone()));
        }

        let now = ctx.sys.now();
        let (message, usage_values) = match &self.content {
            MessageContent::AdHoc {
                subject,
                body,
                is_html,
            } => {
                let sender = match &self.sender {
                    Some(sender) => sender.clone(),
                    None => return Err(UseCaseError::MissingSender),
                };
                if self.channel == MessageChannel::Email && subject.is_none() {
                    return Err(UseCaseError::MissingSubject);
                }
                let message = Message::new(
                    self.channel,
                    sender,
                    self.recipient.clone(),
                    subject.clone(),
                    body.clone(),
                    *is_html,
                    self.scheduled_at,
                    now,
                );
                (message, None)
            }
            MessageContent::FromTemplate {
                template_id,
                values,
            } => {
                let template = match ctx.repos.templates.find(template_id).await {
                    Some(template) => template,
                    None => return Err(UseCaseError::TemplateNotFound(template_id.clone())),
                };
                if template.channel != self.channel {
                    return Err(UseCaseError::ChannelMismatch {
                        requested: self.channel,
                        template: template.channel,
                    });
                }
                let rendered = template
                    .render(values)
                    .map_err(|e| match e {
                        pledger_domain::TemplateError::MissingPlaceholderValues(names) => {
                            UseCaseError::MissingPlaceholderValues(names)
                        }
                    })?;
                if self.channel == MessageChannel::Email && rendered.subject.is_none() {
                    return Err(UseCaseError::MissingSubject);
                }
                let sender = self
                    .sender
                    .clone()
                    .unwrap_or_else(|| template.default_sender.clone());
                let message = Message::new(
                    self.channel,
                    sender,
                    self.recipient.clone(),
                    rendered.subject,
                    rendered.body,
                    template.is_html,
                    self.scheduled_at,
                    now,
                );
                (message, Some((template.id.clone(), values.clone())))
            }
        };

        ctx.repos
            .messages
            .insert(&message)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        if let Some((template_id, values)) = usage_values {
            let usage = TemplateUsage::new(message.id.clone(), template_id, values, now);
            ctx.repos
                .template_usages
                .insert(&usage)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        Ok(message)
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(DispatchImmediatelyOnScheduled)]
    }
}
