mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
pub use inmemory::InMemoryPledgeRepo;
use pledger_domain::{RecurringPledge, ID};
pub use postgres::PostgresPledgeRepo;

#[async_trait::async_trait]
pub trait IPledgeRepo: Send + Sync {
    async fn insert(&self, pledge: &RecurringPledge) -> anyhow::Result<()>;
    async fn save(&self, pledge: &RecurringPledge) -> anyhow::Result<()>;
    async fn find(&self, pledge_id: &ID) -> Option<RecurringPledge>;
    /// Active pledges whose due date has elapsed, oldest due date first.
    async fn find_due(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<RecurringPledge>>;
}
