mod inmemory;
mod postgres;

pub use inmemory::InMemoryTemplateUsageRepo;
use pledger_domain::{TemplateUsage, ID};
pub use postgres::PostgresTemplateUsageRepo;

#[async_trait::async_trait]
pub trait ITemplateUsageRepo: Send + Sync {
    async fn insert(&self, usage: &TemplateUsage) -> anyhow::Result<()>;
    async fn find_by_message(&self, message_id: &ID) -> Option<TemplateUsage>;
}
