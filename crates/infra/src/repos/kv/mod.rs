mod inmemory;
mod postgres;

pub use inmemory::InMemoryKeyValueRepo;
pub use postgres::PostgresKeyValueRepo;

/// Mutable settings store. Loops read their cadence settings from here at
/// startup and seed the defaults for keys that are absent.
#[async_trait::async_trait]
pub trait IKeyValueRepo: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
