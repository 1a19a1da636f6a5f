use super::IPledgeRepo;
use chrono::{DateTime, Utc};
use pledger_domain::{
    Cancellation, Donor, Frequency, PledgeStatus, RecurringPledge, ID,
};
use rust_decimal::Decimal;
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresPledgeRepo {
    pool: PgPool,
}

impl PostgresPledgeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PledgeRaw {
    pledge_uid: Uuid,
    donor_name: String,
    donor_email: String,
    donor_phone: Option<String>,
    amount: Decimal,
    covered_fee: Option<Decimal>,
    currency: String,
    frequency: String,
    payment_token: String,
    status: String,
    next_charge_at: DateTime<Utc>,
    success_count: i32,
    failed_attempts: i32,
    last_error: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Into<RecurringPledge> for PledgeRaw {
    fn into(self) -> RecurringPledge {
        let cancellation = self.cancelled_at.map(|cancelled_at| Cancellation {
            cancelled_at,
            cancelled_by: self.cancelled_by.unwrap_or_default(),
            reason: self.cancellation_reason,
        });
        RecurringPledge {
            id: self.pledge_uid.into(),
            donor: Donor {
                name: self.donor_name,
                email: self.donor_email,
                phone: self.donor_phone,
            },
            amount: self.amount,
            covered_fee: self.covered_fee,
            currency: self.currency.parse().unwrap_or("USD".parse().unwrap()),
            frequency: self.frequency.parse().unwrap_or(Frequency::Monthly),
            payment_token: self.payment_token,
            // An unknown status must never look chargeable
            status: self.status.parse().unwrap_or(PledgeStatus::Paused),
            next_charge_at: self.next_charge_at,
            success_count: self.success_count as u32,
            failed_attempts: self.failed_attempts as u32,
            last_error: self.last_error,
            cancellation,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl IPledgeRepo for PostgresPledgeRepo {
    async fn insert(&self, pledge: &RecurringPledge) -> anyhow::Result<()> {
        let cancellation = pledge.cancellation.as_ref();
        sqlx::query(
            r#"
            INSERT INTO recurring_pledges(
                pledge_uid, donor_name, donor_email, donor_phone, amount, covered_fee,
                currency, frequency, payment_token, status, next_charge_at,
                success_count, failed_attempts, last_error,
                cancelled_at, cancelled_by, cancellation_reason,
                created_at, updated_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(pledge.id.inner_ref())
        .bind(&pledge.donor.name)
        .bind(&pledge.donor.email)
        .bind(&pledge.donor.phone)
        .bind(pledge.amount)
        .bind(pledge.covered_fee)
        .bind(pledge.currency.as_str())
        .bind(pledge.frequency.to_string())
        .bind(&pledge.payment_token)
        .bind(pledge.status.to_string())
        .bind(pledge.next_charge_at)
        .bind(pledge.success_count as i32)
        .bind(pledge.failed_attempts as i32)
        .bind(&pledge.last_error)
        .bind(cancellation.map(|c| c.cancelled_at))
        .bind(cancellation.map(|c| c.cancelled_by.clone()))
        .bind(cancellation.and_then(|c| c.reason.clone()))
        .bind(pledge.created_at)
        .bind(pledge.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, pledge: &RecurringPledge) -> anyhow::Result<()> {
        let cancellation = pledge.cancellation.as_ref();
        sqlx::query(
            r#"
            UPDATE recurring_pledges
            SET payment_token = $2,
            status = $3,
            next_charge_at = $4,
            success_count = $5,
            failed_attempts = $6,
            last_error = $7,
            cancelled_at = $8,
            cancelled_by = $9,
            cancellation_reason = $10,
            updated_at = $11
            WHERE pledge_uid = $1
            "#,
        )
        .bind(pledge.id.inner_ref())
        .bind(&pledge.payment_token)
        .bind(pledge.status.to_string())
        .bind(pledge.next_charge_at)
        .bind(pledge.success_count as i32)
        .bind(pledge.failed_attempts as i32)
        .bind(&pledge.last_error)
        .bind(cancellation.map(|c| c.cancelled_at))
        .bind(cancellation.map(|c| c.cancelled_by.clone()))
        .bind(cancellation.and_then(|c| c.reason.clone()))
        .bind(pledge.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, pledge_id: &ID) -> Option<RecurringPledge> {
        let pledge: PledgeRaw = match sqlx::query_as(
            r#"
            SELECT * FROM recurring_pledges
            WHERE pledge_uid = $1
            "#,
        )
        .bind(pledge_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(pledge) => pledge,
            Err(_) => return None,
        };
        Some(pledge.into())
    }

    async fn find_due(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<RecurringPledge>> {
        let pledges: Vec<PledgeRaw> = sqlx::query_as(
            r#"
            SELECT * FROM recurring_pledges
            WHERE status = 'active' AND next_charge_at <= $1
            ORDER BY next_charge_at
            LIMIT $2
            "#,
        )
        .bind(before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(pledges.into_iter().map(|pledge| pledge.into()).collect())
    }
}
