mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
pub use inmemory::InMemoryMessageRepo;
use pledger_domain::{Message, ID};
pub use postgres::PostgresMessageRepo;

#[async_trait::async_trait]
pub trait IMessageRepo: Send + Sync {
    async fn insert(&self, message: &Message) -> anyhow::Result<()>;
    async fn save(&self, message: &Message) -> anyhow::Result<()>;
    async fn find(&self, message_id: &ID) -> Option<Message>;
    /// Unsent messages that have never failed and whose scheduled time,
    /// if any, has elapsed. Oldest first.
    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>>;
    /// Unsent messages with at least one failed attempt, still under the
    /// retry ceiling. Oldest first.
    async fn find_retry_eligible(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>>;
}
