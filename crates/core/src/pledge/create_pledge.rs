use crate::error::PledgerError;
use crate::shared::usecase::UseCase;
use chrono::{DateTime, Utc};
use pledger_domain::{CurrencyCode, Donor, Frequency, RecurringPledge};
use pledger_infra::PledgerContext;
use rust_decimal::Decimal;

#[derive(Debug)]
pub struct CreatePledgeUseCase {
    pub donor: Donor,
    pub amount: Decimal,
    pub covered_fee: Option<Decimal>,
    pub currency: CurrencyCode,
    pub frequency: Frequency,
    pub payment_token: String,
    pub start_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidDonorEmail(String),
    InvalidAmount(Decimal),
    MissingPaymentToken,
    StorageError,
}

impl From<UseCaseError> for PledgerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidDonorEmail(email) => Self::BadClientData(format!(
                "The donor email: {}, is not a valid email address.",
                email
            )),
            UseCaseError::InvalidAmount(amount) => Self::BadClientData(format!(
                "The pledge amount: {}, must be greater than zero.",
                amount
            )),
            UseCaseError::MissingPaymentToken => {
                Self::BadClientData("A payment token is required for a recurring pledge".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CreatePledgeUseCase {
    type Response = RecurringPledge;

    type Error = UseCaseError;

    const NAME: &'static str = "CreatePledge";

    async fn execute(&mut self, ctx: &PledgerContext) -> Result<Self::Response, Self::Error> {
        if self.donor.email.is_empty() || !self.donor.email.contains('@') {
            return Err(UseCaseError::InvalidDonorEmail(self.donor.email.clone()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(UseCaseError::InvalidAmount(self.amount));
        }
        if let Some(fee) = self.covered_fee {
            if fee < Decimal::ZERO {
                return Err(UseCaseError::InvalidAmount(fee));
            }
        }
        if self.payment_token.trim().is_empty() {
            return Err(UseCaseError::MissingPaymentToken);
        }

        let pledge = RecurringPledge::new(
            self.donor.clone(),
            self.amount,
            self.covered_fee,
            self.currency.clone(),
            self.frequency,
            self.payment_token.clone(),
            self.start_at,
            ctx.sys.now(),
        );

        ctx.repos
            .pledges
            .insert(&pledge)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(pledge)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pledger_domain::PledgeStatus;

    fn valid_usecase() -> CreatePledgeUseCase {
        CreatePledgeUseCase {
            donor: Donor {
                name: "Ada Donor".into(),
                email: "ada@example.org".into(),
                phone: None,
            },
            amount: Decimal::new(2500, 2),
            covered_fee: None,
            currency: "EUR".parse().unwrap(),
            frequency: Frequency::Monthly,
            payment_token: "tok_123".into(),
            start_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn creates_active_pledge_due_one_cycle_later() {
        let ctx = PledgerContext::create_inmemory();
        let start_at = Utc::now();
        let mut usecase = CreatePledgeUseCase {
            start_at,
            ..valid_usecase()
        };

        let pledge = usecase.execute(&ctx).await.unwrap();

        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(pledge.next_charge_at, Frequency::Monthly.advance(start_at));
        assert!(ctx.repos.pledges.find(&pledge.id).await.is_some());
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let ctx = PledgerContext::create_inmemory();

        let mut usecase = CreatePledgeUseCase {
            amount: Decimal::ZERO,
            ..valid_usecase()
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidAmount(Decimal::ZERO)
        );

        let mut usecase = valid_usecase();
        usecase.donor.email = "not-an-email".into();
        assert!(matches!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidDonorEmail(_)
        ));

        let mut usecase = CreatePledgeUseCase {
            payment_token: "  ".into(),
            ..valid_usecase()
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::MissingPaymentToken
        );
    }
}
