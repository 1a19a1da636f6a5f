use super::ITransactionRepo;
use crate::repos::shared::inmemory_repo::*;
use pledger_domain::{ChargeTransaction, ID};

pub struct InMemoryTransactionRepo {
    transactions: std::sync::Mutex<Vec<ChargeTransaction>>,
}

impl InMemoryTransactionRepo {
    pub fn new() -> Self {
        Self {
            transactions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ITransactionRepo for InMemoryTransactionRepo {
    async fn insert(&self, transaction: &ChargeTransaction) -> anyhow::Result<()> {
        insert(transaction, &self.transactions);
        Ok(())
    }

    async fn find_by_pledge(&self, pledge_id: &ID) -> Vec<ChargeTransaction> {
        find_by(&self.transactions, |tx| tx.pledge_id == *pledge_id)
    }
}
