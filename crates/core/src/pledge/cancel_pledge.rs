use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{PledgeStateError, RecurringPledge, ID};
use pledger_infra::PledgerContext;

#[derive(Debug)]
pub struct CancelPledgeUseCase {
    pub pledge_id: ID,
    /// Who asked for the cancellation, donor or operator.
    pub cancelled_by: String,
    pub reason: Option<String>,
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
impl UseCase for CancelPledgeUseCase {
    type Response = RecurringPledge;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelPledge";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let mut pledge = match ctx.repos.pledges.find(&self.pledge_id).await {
            Some(pledge) => pledge,
            None => return Err(UseCaseError::NotFound(self.pledge_id.clone())),
        };

        pledge
            .cancel(ctx.sys.now(), &self.cancelled_by, self.reason.clone())
            .map_err(UseCaseError::InvalidTransition)?;

        ctx.repos
            .pledges
            .save(&pledge)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(pledge)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use pledger_domain::{CurrencyCode, Donor, Frequency, PledgeStatus};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn cancels_and_stays_cancelled_on_repeat() {
        let ctx = PledgerContext::create_inmemory();
        let pledge = RecurringPledge::new(
            Donor {
                name: "Ada Donor".into(),
                email: "ada@example.org".into(),
                phone: None,
            },
            Decimal::new(1000, 2),
            None,
            CurrencyCode::new("USD").unwrap(),
            Frequency::Monthly,
            "tok_123".into(),
            Utc::now(),
            Utc::now(),
        );
        ctx.repos.pledges.insert(&pledge).await.unwrap();

        let mut usecase = CancelPledgeUseCase {
            pledge_id: pledge.id.clone(),
            cancelled_by: "donor".into(),
            reason: Some("moving away".into()),
        };
        let cancelled = usecase.execute(&ctx).await.unwrap();
        assert_eq!(cancelled.status, PledgeStatus::Cancelled);
        let first_cancellation = cancelled.cancellation.clone().unwrap();

        // A second cancellation keeps the original audit trail
        let mut repeat = CancelPledgeUseCase {
            pledge_id: pledge.id.clone(),
            cancelled_by: "operator".into(),
            reason: None,
        };
        let cancelled_again = repeat.execute(&ctx).await.unwrap();
        assert_eq!(cancelled_again.status, PledgeStatus::Cancelled);
        assert_eq!(cancelled_again.cancellation.unwrap(), first_cancellation);
    }
}
