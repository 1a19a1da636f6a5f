use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use pledger_domain::{PledgeStateError, RecurringPledge, ID};
use pledger_infra::PledgerContext;

#[derive(Debug)]
pub struct PausePledgeUseCase {
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
impl UseCase for PausePledgeUseCase {
    type Response = RecurringPledge;

    type Error = UseCaseError;

    const NAME: &'static str = "PausePledge";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        let mut pledge = match ctx.repos.pledges.find(&self.pledge_id).await {
            Some(pledge) => pledge,
            None => return Err(UseCaseError::NotFound(self.pledge_id.clone())),
        };

        pledge
            .pause(ctx.sys.now())
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

    async fn insert_pledge(ctx: &PledgerContext) -> RecurringPledge {
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
        pledge
    }

    #[tokio::test]
    async fn pauses_active_pledge() {
        let ctx = PledgerContext::create_inmemory();
        let pledge = insert_pledge(&ctx).await;

        let mut usecase = PausePledgeUseCase {
            pledge_id: pledge.id.clone(),
        };
        let paused = usecase.execute(&ctx).await.unwrap();

        assert_eq!(paused.status, PledgeStatus::Paused);
        let stored = ctx.repos.pledges.find(&pledge.id).await.unwrap();
        assert_eq!(stored.status, PledgeStatus::Paused);
    }

    #[tokio::test]
    async fn rejects_unknown_pledge() {
        let ctx = PledgerContext::create_inmemory();

        let mut usecase = PausePledgeUseCase {
            pledge_id: Default::default(),
        };
        assert!(matches!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotFound(_)
        ));
    }
}
