use super::ITemplateRepo;
use chrono::{DateTime, Utc};
use pledger_domain::{MessageChannel, MessageTemplate, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresTemplateRepo {
    pool: PgPool,
}

impl PostgresTemplateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRaw {
    template_uid: Uuid,
    name: String,
    category: String,
    channel: String,
    is_html: bool,
    default_sender: String,
    default_subject: Option<String>,
    body: String,
    placeholders: Vec<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Into<MessageTemplate> for TemplateRaw {
    fn into(self) -> MessageTemplate {
        MessageTemplate {
            id: self.template_uid.into(),
            name: self.name,
            category: self.category,
            channel: self.channel.parse().unwrap_or(MessageChannel::Email),
            is_html: self.is_html,
            default_sender: self.default_sender,
            default_subject: self.default_subject,
            body: self.body,
            placeholders: self.placeholders,
            is_default: self.is_default,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl ITemplateRepo for PostgresTemplateRepo {
    async fn insert(&self, template: &MessageTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_templates(
                template_uid, name, category, channel, is_html, default_sender,
                default_subject, body, placeholders, is_default, created_at, updated_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(template.id.inner_ref())
        .bind(&template.name)
        .bind(&template.category)
        .bind(template.channel.to_string())
        .bind(template.is_html)
        .bind(&template.default_sender)
        .bind(&template.default_subject)
        .bind(&template.body)
        .bind(&template.placeholders)
        .bind(template.is_default)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, template: &MessageTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE message_templates
            SET name = $2,
            category = $3,
            channel = $4,
            is_html = $5,
            default_sender = $6,
            default_subject = $7,
            body = $8,
            placeholders = $9,
            is_default = $10,
            updated_at = $11
            WHERE template_uid = $1
            "#,
        )
        .bind(template.id.inner_ref())
        .bind(&template.name)
        .bind(&template.category)
        .bind(template.channel.to_string())
        .bind(template.is_html)
        .bind(&template.default_sender)
        .bind(&template.default_subject)
        .bind(&template.body)
        .bind(&template.placeholders)
        .bind(template.is_default)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, template_id: &ID) -> Option<MessageTemplate> {
        let template: TemplateRaw = match sqlx::query_as(
            r#"
            SELECT * FROM message_templates
            WHERE template_uid = $1
            "#,
        )
        .bind(template_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(template) => template,
            Err(_) => return None,
        };
        Some(template.into())
    }

    async fn find_by_name(&self, name: &str) -> Option<MessageTemplate> {
        let template: TemplateRaw = match sqlx::query_as(
            r#"
            SELECT * FROM message_templates
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        {
            Ok(template) => template,
            Err(_) => return None,
        };
        Some(template.into())
    }

    async fn find_default(
        &self,
        category: &str,
        channel: MessageChannel,
    ) -> Option<MessageTemplate> {
        let template: TemplateRaw = match sqlx::query_as(
            r#"
            SELECT * FROM message_templates
            WHERE category = $1 AND channel = $2 AND is_default
            "#,
        )
        .bind(category)
        .bind(channel.to_string())
        .fetch_one(&self.pool)
        .await
        {
            Ok(template) => template,
            Err(_) => return None,
        };
        Some(template.into())
    }

    async fn unset_defaults(&self, category: &str, channel: MessageChannel) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE message_templates
            SET is_default = FALSE
            WHERE category = $1 AND channel = $2 AND is_default
            "#,
        )
        .bind(category)
        .bind(channel.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
