use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{MessageChannel, MessageTemplate};
use pledger_infra::PledgerContext;

#[derive(Debug)]
pub struct CreateTemplateUseCase {
    pub name: String,
    pub category: String,
    pub channel: MessageChannel,
    pub is_html: bool,
    pub default_sender: String,
    pub default_subject: Option<String>,
    pub body: String,
    /// Placeholder names callers are allowed to supply values for.
    pub placeholders: Vec<String>,
    pub is_default: bool,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    MissingName,
    DuplicateName(String),
    UndeclaredPlaceholders(Vec<String>),
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingName => {
                Self::BadClientData("A template needs a non empty name".into())
            }
            UseCaseError::DuplicateName(name) => Self::Conflict(format!(
                "A template with the name: {}, already exists.",
                name
            )),
            UseCaseError::UndeclaredPlaceholders(names) => Self::BadClientData(format!(
                "The template uses placeholders it does not declare: {}.",
                names.join(", ")
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CreateTemplateUseCase {
    type Response = MessageTemplate;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateTemplate";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        if self.name.trim().is_empty() {
            return Err(UseCaseError::MissingName);
        }
        if ctx.repos.templates.find_by_name(&self.name).await.is_some() {
            return Err(UseCaseError::DuplicateName(self.name.clone()));
        }

        let mut template = MessageTemplate::new(
            self.name.clone(),
            self.category.clone(),
            self.channel,
            self.is_html,
            self.default_sender.clone(),
            self.default_subject.clone(),
            self.body.clone(),
            self.placeholders.clone(),
            ctx.sys.now(),
        );

        let undeclared = template.undeclared_placeholders();
        if !undeclared.is_empty() {
            return Err(UseCaseError::UndeclaredPlaceholders(undeclared));
        }

        if self.is_default {
            // At most one default per category and channel pair
            ctx.repos
                .templates
                .unset_defaults(&self.category, self.channel)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            template.is_default = true;
        }

        ctx.repos
            .templates
            .insert(&template)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(template)
    }
}
