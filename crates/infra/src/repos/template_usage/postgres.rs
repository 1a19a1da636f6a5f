use super::ITemplateUsageRepo;
use chrono::{DateTime, Utc};
use pledger_domain::{TemplateUsage, ID};
use sqlx::{
    types::{Json, Uuid},
    FromRow, PgPool,
};

pub struct PostgresTemplateUsageRepo {
    pool: PgPool,
}

impl PostgresTemplateUsageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateUsageRaw {
    usage_uid: Uuid,
    message_uid: Uuid,
    template_uid: Uuid,
    placeholder_values: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl Into<TemplateUsage> for TemplateUsageRaw {
    fn into(self) -> TemplateUsage {
        TemplateUsage {
            id: self.usage_uid.into(),
            message_id: self.message_uid.into(),
            template_id: self.template_uid.into(),
            values: serde_json::from_value(self.placeholder_values).unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

#[async_trait::async_trait]
impl ITemplateUsageRepo for PostgresTemplateUsageRepo {
    async fn insert(&self, usage: &TemplateUsage) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_template_usages(
                usage_uid, message_uid, template_uid, placeholder_values, created_at
            )
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(usage.id.inner_ref())
        .bind(usage.message_id.inner_ref())
        .bind(usage.template_id.inner_ref())
        .bind(Json(&usage.values))
        .bind(usage.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_message(&self, message_id: &ID) -> Option<TemplateUsage> {
        let usage: TemplateUsageRaw = match sqlx::query_as(
            r#"
            SELECT * FROM message_template_usages
            WHERE message_uid = $1
            "#,
        )
        .bind(message_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(usage) => usage,
            Err(_) => return None,
        };
        Some(usage.into())
    }
}
