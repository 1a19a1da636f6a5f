use super::ITransactionRepo;
use chrono::{DateTime, Utc};
use pledger_domain::{ChargeTransaction, ID};
use rust_decimal::Decimal;
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresTransactionRepo {
    pool: PgPool,
}

impl PostgresTransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TransactionRaw {
    transaction_uid: Uuid,
    pledge_uid: Uuid,
    amount: Decimal,
    currency: String,
    gateway_reference: String,
    order_reference: String,
    charged_at: DateTime<Utc>,
}

impl Into<ChargeTransaction> for TransactionRaw {
    fn into(self) -> ChargeTransaction {
        ChargeTransaction {
            id: self.transaction_uid.into(),
            pledge_id: self.pledge_uid.into(),
            amount: self.amount,
            currency: self.currency.parse().unwrap_or("USD".parse().unwrap()),
            gateway_reference: self.gateway_reference,
            order_reference: self.order_reference,
            charged_at: self.charged_at,
        }
    }
}

#[async_trait::async_trait]
impl ITransactionRepo for PostgresTransactionRepo {
    async fn insert(&self, transaction: &ChargeTransaction) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO charge_transactions(
                transaction_uid, pledge_uid, amount, currency,
                gateway_reference, order_reference, charged_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transaction.id.inner_ref())
        .bind(transaction.pledge_id.inner_ref())
        .bind(transaction.amount)
        .bind(transaction.currency.as_str())
        .bind(&transaction.gateway_reference)
        .bind(&transaction.order_reference)
        .bind(transaction.charged_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_pledge(&self, pledge_id: &ID) -> Vec<ChargeTransaction> {
        let transactions: Vec<TransactionRaw> = sqlx::query_as(
            r#"
            SELECT * FROM charge_transactions
            WHERE pledge_uid = $1
            ORDER BY charged_at
            "#,
        )
        .bind(pledge_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or(vec![]);

        transactions.into_iter().map(|tx| tx.into()).collect()
    }
}
