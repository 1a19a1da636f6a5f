use super::ITemplateUsageRepo;
use crate::repos::shared::inmemory_repo::*;
use pledger_domain::{TemplateUsage, ID};

pub struct InMemoryTemplateUsageRepo {
    usages: std::sync::Mutex<Vec<TemplateUsage>>,
}

impl InMemoryTemplateUsageRepo {
    pub fn new() -> Self {
        Self {
            usages: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ITemplateUsageRepo for InMemoryTemplateUsageRepo {
    async fn insert(&self, usage: &TemplateUsage) -> anyhow::Result<()> {
        insert(usage, &self.usages);
        Ok(())
    }

    async fn find_by_message(&self, message_id: &ID) -> Option<TemplateUsage> {
        find_by(&self.usages, |usage| usage.message_id == *message_id)
            .into_iter()
            .next()
    }
}
