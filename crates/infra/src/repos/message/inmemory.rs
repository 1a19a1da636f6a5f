use super::IMessageRepo;
use crate::repos::shared::inmemory_repo::*;
use chrono::{DateTime, Utc};
use pledger_domain::{Message, ID};

pub struct InMemoryMessageRepo {
    messages: std::sync::Mutex<Vec<Message>>,
}

impl InMemoryMessageRepo {
    pub fn new() -> Self {
        Self {
            messages: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IMessageRepo for InMemoryMessageRepo {
    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        insert(message, &self.messages);
        Ok(())
    }

    async fn save(&self, message: &Message) -> anyhow::Result<()> {
        save(message, &self.messages);
        Ok(())
    }

    async fn find(&self, message_id: &ID) -> Option<Message> {
        find(message_id, &self.messages)
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>> {
        let mut due = find_by(&self.messages, |message| message.is_due(now));
        due.sort_by_key(|message| message.created_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn find_retry_eligible(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>> {
        let mut eligible = find_by(&self.messages, |message| {
            message.is_retry_eligible(max_retries)
        });
        eligible.sort_by_key(|message| message.created_at);
        eligible.truncate(limit);
        Ok(eligible)
    }
}
