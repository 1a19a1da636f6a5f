use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donor {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyCode(String);

#[derive(Error, Debug)]
pub enum InvalidCurrencyError {
    #[error("Currency code: {0} is malformed, expected a three letter code")]
    Malformed(String),
}

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self, InvalidCurrencyError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_uppercase()))
        } else {
            Err(InvalidCurrencyError::Malformed(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::new(code)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Annually,
}

impl Frequency {
    /// Calendar aware advance by one billing cycle. Day of month values
    /// past the end of the target month clamp to its last day.
    pub fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Monthly => from + Months::new(1),
            Self::Annually => from + Months::new(12),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annually => write!(f, "annually"),
        }
    }
}

impl FromStr for Frequency {
    type Err = ();

    fn from_str(freq: &str) -> Result<Self, Self::Err> {
        match freq {
            "monthly" => Ok(Self::Monthly),
            "annually" => Ok(Self::Annually),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PledgeStatus {
    Active,
    Paused,
    Cancelled,
    Failed,
}

impl Display for PledgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PledgeStatus {
    type Err = ();

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cancellation {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: String,
    pub reason: Option<String>,
}

#[derive(Error, Debug, PartialEq)]
pub enum PledgeStateError {
    #[error("Pledge cannot move from status {from} to status {to}")]
    InvalidTransition {
        from: PledgeStatus,
        to: PledgeStatus,
    },
}

/// A donor's standing instruction to charge a fixed amount on a fixed
/// cadence. Mutated only through the methods below so that the status
/// and `next_charge_at` always move together.
#[derive(Debug, Clone)]
pub struct RecurringPledge {
    pub id: ID,
    pub donor: Donor,
    pub amount: Decimal,
    pub covered_fee: Option<Decimal>,
    pub currency: CurrencyCode,
    pub frequency: Frequency,
    pub payment_token: String,
    pub status: PledgeStatus,
    pub next_charge_at: DateTime<Utc>,
    pub success_count: u32,
    pub failed_attempts: u32,
    pub last_error: Option<String>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringPledge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        donor: Donor,
        amount: Decimal,
        covered_fee: Option<Decimal>,
        currency: CurrencyCode,
        frequency: Frequency,
        payment_token: String,
        start_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            donor,
            amount,
            covered_fee,
            currency,
            frequency,
            payment_token,
            status: PledgeStatus::Active,
            next_charge_at: frequency.advance(start_at),
            success_count: 0,
            failed_attempts: 0,
            last_error: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn charge_amount(&self) -> Decimal {
        self.amount + self.covered_fee.unwrap_or_default()
    }

    // Fresh per attempt so the gateway can tell a repeated attempt apart
    // from an accidental double submission of the same attempt.
    pub fn order_reference(&self, attempted_at: DateTime<Utc>) -> String {
        format!("{}-{}", self.id, attempted_at.timestamp_millis())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PledgeStatus::Active && self.next_charge_at <= now
    }

    pub fn register_success(&mut self, charged_at: DateTime<Utc>) {
        self.success_count += 1;
        self.last_error = None;
        self.next_charge_at = self.frequency.advance(charged_at);
        self.updated_at = charged_at;
    }

    pub fn register_failure(
        &mut self,
        attempted_at: DateTime<Utc>,
        reason: &str,
        max_failed_attempts: u32,
    ) {
        self.failed_attempts += 1;
        self.last_error = Some(reason.to_string());
        if self.failed_attempts >= max_failed_attempts {
            // No further auto retry and no new due date until the donor
            // refreshes their payment method.
            self.status = PledgeStatus::Failed;
        } else {
            // Next attempt on the following natural cycle, never immediately.
            self.next_charge_at = self.frequency.advance(attempted_at);
        }
        self.updated_at = attempted_at;
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), PledgeStateError> {
        match self.status {
            PledgeStatus::Active | PledgeStatus::Paused => {
                self.status = PledgeStatus::Paused;
                self.updated_at = now;
                Ok(())
            }
            from => Err(PledgeStateError::InvalidTransition {
                from,
                to: PledgeStatus::Paused,
            }),
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), PledgeStateError> {
        match self.status {
            PledgeStatus::Active => Ok(()),
            PledgeStatus::Paused => {
                self.status = PledgeStatus::Active;
                if self.next_charge_at <= now {
                    // A long pause yields one prompt charge, not one charge
                    // per missed cycle.
                    self.next_charge_at = now;
                }
                self.updated_at = now;
                Ok(())
            }
            from => Err(PledgeStateError::InvalidTransition {
                from,
                to: PledgeStatus::Active,
            }),
        }
    }

    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
        cancelled_by: &str,
        reason: Option<String>,
    ) -> Result<(), PledgeStateError> {
        match self.status {
            // Cancelling twice is a no-op, not an error
            PledgeStatus::Cancelled => Ok(()),
            PledgeStatus::Active | PledgeStatus::Paused => {
                self.status = PledgeStatus::Cancelled;
                self.cancellation = Some(Cancellation {
                    cancelled_at: now,
                    cancelled_by: cancelled_by.to_string(),
                    reason,
                });
                self.updated_at = now;
                Ok(())
            }
            from => Err(PledgeStateError::InvalidTransition {
                from,
                to: PledgeStatus::Cancelled,
            }),
        }
    }

    pub fn update_payment_method(
        &mut self,
        now: DateTime<Utc>,
        new_token: String,
    ) -> Result<(), PledgeStateError> {
        if self.status == PledgeStatus::Cancelled {
            return Err(PledgeStateError::InvalidTransition {
                from: PledgeStatus::Cancelled,
                to: PledgeStatus::Active,
            });
        }
        self.payment_token = new_token;
        self.failed_attempts = 0;
        self.last_error = None;
        if self.status == PledgeStatus::Failed {
            // The stored due date is usually in the past at this point, so
            // the next processing pass picks the pledge up promptly.
            self.status = PledgeStatus::Active;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for RecurringPledge {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn test_pledge(frequency: Frequency, start_at: DateTime<Utc>) -> RecurringPledge {
        RecurringPledge::new(
            Donor {
                name: "Ann Donor".into(),
                email: "ann@cool.com".into(),
                phone: None,
            },
            Decimal::new(2500, 2),
            None,
            CurrencyCode::new("USD").unwrap(),
            frequency,
            "tok_123".into(),
            start_at,
            start_at,
        )
    }

    #[test]
    fn it_advances_by_calendar_cycles() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(jan_1),
            Utc.with_ymd_and_hms(2021, 2, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(
            Frequency::Annually.advance(jan_1),
            Utc.with_ymd_and_hms(2022, 1, 1, 12, 0, 0).unwrap()
        );

        // Month end days clamp instead of spilling into the next month
        let jan_31 = Utc.with_ymd_and_hms(2021, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(jan_31),
            Utc.with_ymd_and_hms(2021, 2, 28, 12, 0, 0).unwrap()
        );
        let jan_31_leap = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(jan_31_leap),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn it_creates_pledge_due_one_cycle_after_start() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let pledge = test_pledge(Frequency::Monthly, jan_1);

        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(
            pledge.next_charge_at,
            Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(pledge.success_count, 0);
        assert_eq!(pledge.failed_attempts, 0);
        assert!(!pledge.is_due(jan_1));
        assert!(pledge.is_due(pledge.next_charge_at));
    }

    #[test]
    fn it_computes_charge_amount_with_covered_fee() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);
        assert_eq!(pledge.charge_amount(), Decimal::new(2500, 2));

        pledge.covered_fee = Some(Decimal::new(75, 2));
        assert_eq!(pledge.charge_amount(), Decimal::new(2575, 2));
    }

    #[test]
    fn it_advances_from_processing_date_on_success() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);

        // Processed ten days late
        let charged_at = Utc.with_ymd_and_hms(2021, 2, 11, 9, 30, 0).unwrap();
        pledge.register_success(charged_at);

        assert_eq!(pledge.success_count, 1);
        assert_eq!(pledge.last_error, None);
        assert_eq!(
            pledge.next_charge_at,
            Utc.with_ymd_and_hms(2021, 3, 11, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn it_fails_terminally_at_the_attempt_ceiling() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);

        let feb_1 = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
        pledge.register_failure(feb_1, "Card declined", 3);
        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(pledge.failed_attempts, 1);
        assert_eq!(
            pledge.next_charge_at,
            Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap()
        );

        let mar_1 = pledge.next_charge_at;
        pledge.register_failure(mar_1, "Card declined", 3);
        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(pledge.failed_attempts, 2);

        let apr_1 = pledge.next_charge_at;
        pledge.register_failure(apr_1, "Card declined", 3);
        assert_eq!(pledge.status, PledgeStatus::Failed);
        assert_eq!(pledge.failed_attempts, 3);
        // Terminal failure leaves the due date alone
        assert_eq!(pledge.next_charge_at, apr_1);
        assert_eq!(pledge.last_error, Some("Card declined".to_string()));
    }

    #[test]
    fn it_resumes_with_at_most_one_catchup_charge() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);
        pledge.pause(jan_1).unwrap();

        // Resumed 40 days after the stored due date elapsed
        let now = Utc.with_ymd_and_hms(2021, 3, 13, 0, 0, 0).unwrap();
        pledge.resume(now).unwrap();

        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(pledge.next_charge_at, now);
        assert!(pledge.is_due(now));
    }

    #[test]
    fn it_keeps_future_due_date_on_resume() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);
        let feb_1 = pledge.next_charge_at;
        pledge.pause(jan_1).unwrap();

        let now = Utc.with_ymd_and_hms(2021, 1, 15, 0, 0, 0).unwrap();
        pledge.resume(now).unwrap();
        assert_eq!(pledge.next_charge_at, feb_1);
    }

    #[test]
    fn it_cancels_idempotently() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);

        pledge
            .cancel(jan_1, "ann@cool.com", Some("Moving abroad".into()))
            .unwrap();
        assert_eq!(pledge.status, PledgeStatus::Cancelled);
        let cancellation = pledge.cancellation.clone().unwrap();
        assert_eq!(cancellation.cancelled_by, "ann@cool.com");

        // Second cancel keeps the original cancellation metadata
        let later = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
        pledge.cancel(later, "someone@else.com", None).unwrap();
        assert_eq!(pledge.cancellation.unwrap().cancelled_by, "ann@cool.com");
    }

    #[test]
    fn it_rejects_transitions_out_of_cancelled() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);
        pledge.cancel(jan_1, "ann@cool.com", None).unwrap();

        assert!(pledge.pause(jan_1).is_err());
        assert!(pledge.resume(jan_1).is_err());
        assert!(pledge
            .update_payment_method(jan_1, "tok_new".into())
            .is_err());
    }

    #[test]
    fn it_restores_failed_pledge_on_payment_method_update() {
        let jan_1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mut pledge = test_pledge(Frequency::Monthly, jan_1);
        for _ in 0..3 {
            let attempted_at = pledge.next_charge_at;
            pledge.register_failure(attempted_at, "Card expired", 3);
        }
        assert_eq!(pledge.status, PledgeStatus::Failed);
        let stale_due_date = pledge.next_charge_at;

        let now = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        pledge.update_payment_method(now, "tok_new".into()).unwrap();

        assert_eq!(pledge.status, PledgeStatus::Active);
        assert_eq!(pledge.failed_attempts, 0);
        assert_eq!(pledge.last_error, None);
        assert_eq!(pledge.payment_token, "tok_new");
        // Due date untouched, so the next pass charges promptly
        assert_eq!(pledge.next_charge_at, stale_due_date);
        assert!(pledge.is_due(now));
    }

    #[test]
    fn it_validates_currency_codes() {
        assert_eq!(CurrencyCode::new("usd").unwrap().as_str(), "USD");
        assert_eq!(CurrencyCode::new(" NOK ").unwrap().as_str(), "NOK");
        assert!(CurrencyCode::new("").is_err());
        assert!(CurrencyCode::new("US").is_err());
        assert!(CurrencyCode::new("DOLLARS").is_err());
        assert!(CurrencyCode::new("U2D").is_err());
    }
}
