use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{PledgeStateError, RecurringPledge, ID};
use pledger_infra::PledgerContext;

#[derive(Debug)]
pub struct ResumePledgeUseCase {
    pub pledge_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidTransition(PledgeStateError),
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(pledge_id) => {
                Self::NotFound(format!("The pledge with id: {}, was not found.", pledge_id))
            }
            UseCaseError::InvalidTransition(e) => Self::Conflict(e.to_string()),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ResumePledgeUseCase {
    type Response = RecurringPledge;

    type Error = UseCaseError;

    const NAME: &'static str = "ResumePledge";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let mut pledge = match ctx.repos.pledges.find(&self.pledge_id).await {
            Some(pledge) => pledge,
            None => return Err(UseCaseError::NotFound(self.pledge_id.clone())),
        };

        pledge
            .resume(ctx.sys.now())
            .map_err(UseCaseError::InvalidTransition)?;

        ctx.repos
            .pledges
            .save(&pledge)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(pledge)
    }
}
