use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{PledgeStateError, RecurringPledge, ID};
use pledger_infra::PledgerContext;

#[derive(Debug)]
pub struct UpdatePaymentMethodUseCase {
    pub pledge_id: ID,
    pub payment_token: String,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    MissingPaymentToken,
    InvalidTransition(PledgeStateError),
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(pledge_id) => {
                Self::NotFound(format!("The pledge with id: {}, was not found.", pledge_id))
            }
            UseCaseError::MissingPaymentToken => {
                Self::BadClientData("A payment token is required".into())
            }
            UseCaseError::InvalidTransition(e) => Self::Conflict(e.to_string()),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for UpdatePaymentMethodUseCase {
    type Response = RecurringPledge;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdatePaymentMethod";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        if self.payment_token.trim().is_empty() {
            return Err(UseCaseError::MissingPaymentToken);
        }

        let mut pledge = match ctx.repos.pledges.find(&self.pledge_id).await {
            Some(pledge) => pledge,
            None => return Err(UseCaseError::NotFound(self.pledge_id.clone())),
        };

        pledge
            .update_payment_method(ctx.sys.now(), self.payment_token.clone())
            .map_err(UseCaseError::InvalidTransition)?;

        ctx.repos
            .pledges
            .save(&pledge)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(pledge)
    }
}
