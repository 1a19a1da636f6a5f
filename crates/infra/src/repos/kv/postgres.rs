use super::IKeyValueRepo;
use sqlx::{FromRow, PgPool};

pub struct PostgresKeyValueRepo {
    pool: PgPool,
}

impl PostgresKeyValueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct KeyValueRaw {
    value: String,
}

#[async_trait::async_trait]
impl IKeyValueRepo for PostgresKeyValueRepo {
    async fn get(&self, key: &str) -> Option<String> {
        let entry: KeyValueRaw = match sqlx::query_as(
            r#"
            SELECT value FROM key_values
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        {
            Ok(entry) => entry,
            Err(_) => return None,
        };
        Some(entry.value)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO key_values(key, value)
            VALUES($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
