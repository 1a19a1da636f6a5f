mod inmemory;
mod postgres;

pub use inmemory::InMemoryTransactionRepo;
use pledger_domain::{ChargeTransaction, ID};
pub use postgres::PostgresTransactionRepo;

#[async_trait::async_trait]
pub trait ITransactionRepo: Send + Sync {
    async fn insert(&self, transaction: &ChargeTransaction) -> anyhow::Result<()>;
    async fn find_by_pledge(&self, pledge_id: &ID) -> Vec<ChargeTransaction>;
}

#[cfg(test)]
mod tests {
    use crate::PledgerContext;
    use chrono::{TimeZone, Utc};
    use pledger_domain::{ChargeTransaction, CurrencyCode, ID};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn insert_and_find_by_pledge() {
        let ctx = PledgerContext::create_inmemory();
        let pledge_id = ID::new();
        let charged_at = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();

        let tx = ChargeTransaction::new(
            pledge_id.clone(),
            Decimal::new(2500, 2),
            CurrencyCode::new("USD").unwrap(),
            "gw_tx_1".into(),
            format!("{}-{}", pledge_id, charged_at.timestamp_millis()),
            charged_at,
        );
        ctx.repos.transactions.insert(&tx).await.unwrap();

        let found = ctx.repos.transactions.find_by_pledge(&pledge_id).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].gateway_reference, "gw_tx_1");

        let other = ctx.repos.transactions.find_by_pledge(&ID::new()).await;
        assert!(other.is_empty());
    }
}
