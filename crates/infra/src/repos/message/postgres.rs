use super::IMessageRepo;
use chrono::{DateTime, Utc};
use pledger_domain::{Message, MessageChannel, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresMessageRepo {
    pool: PgPool,
}

impl PostgresMessageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MessageRaw {
    message_uid: Uuid,
    channel: String,
    sender: String,
    recipient: String,
    subject: Option<String>,
    body: String,
    is_html: bool,
    scheduled_at: Option<DateTime<Utc>>,
    is_sent: bool,
    sent_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    retry_count: i32,
    created_at: DateTime<Utc>,
}

impl Into<Message> for MessageRaw {
    fn into(self) -> Message {
        Message {
            id: self.message_uid.into(),
            channel: self.channel.parse().unwrap_or(MessageChannel::Email),
            sender: self.sender,
            recipient: self.recipient,
            subject: self.subject,
            body: self.body,
            is_html: self.is_html,
            scheduled_at: self.scheduled_at,
            is_sent: self.is_sent,
            sent_at: self.sent_at,
            last_error: self.last_error,
            retry_count: self.retry_count as u32,
            created_at: self.created_at,
        }
    }
}

#[async_trait::async_trait]
impl IMessageRepo for PostgresMessageRepo {
    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages(
                message_uid, channel, sender, recipient, subject, body, is_html,
                scheduled_at, is_sent, sent_at, last_error, retry_count, created_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(message.id.inner_ref())
        .bind(message.channel.to_string())
        .bind(&message.sender)
        .bind(&message.recipient)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.is_html)
        .bind(message.scheduled_at)
        .bind(message.is_sent)
        .bind(message.sent_at)
        .bind(&message.last_error)
        .bind(message.retry_count as i32)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, message: &Message) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET is_sent = $2,
            sent_at = $3,
            last_error = $4,
            retry_count = $5
            WHERE message_uid = $1
            "#,
        )
        .bind(message.id.inner_ref())
        .bind(message.is_sent)
        .bind(message.sent_at)
        .bind(&message.last_error)
        .bind(message.retry_count as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, message_id: &ID) -> Option<Message> {
        let message: MessageRaw = match sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE message_uid = $1
            "#,
        )
        .bind(message_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(message) => message,
            Err(_) => return None,
        };
        Some(message.into())
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>> {
        let messages: Vec<MessageRaw> = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE NOT is_sent AND retry_count = 0
                AND (scheduled_at IS NULL OR scheduled_at <= $1)
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(|message| message.into()).collect())
    }

    async fn find_retry_eligible(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>> {
        let messages: Vec<MessageRaw> = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE NOT is_sent AND retry_count >= 1 AND retry_count < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(max_retries as i32)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(|message| message.into()).collect())
    }
}
