use super::ITemplateRepo;
use crate::repos::shared::inmemory_repo::*;
use pledger_domain::{MessageChannel, MessageTemplate, ID};

pub struct InMemoryTemplateRepo {
    templates: std::sync::Mutex<Vec<MessageTemplate>>,
}

impl InMemoryTemplateRepo {
    pub fn new() -> Self {
        Self {
            templates: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ITemplateRepo for InMemoryTemplateRepo {
    async fn insert(&self, template: &MessageTemplate) -> anyhow::Result<()> {
        insert(template, &self.templates);
        Ok(())
    }

    async fn save(&self, template: &MessageTemplate) -> anyhow::Result<()> {
        save(template, &self.templates);
        Ok(())
    }

    async fn find(&self, template_id: &ID) -> Option<MessageTemplate> {
        find(template_id, &self.templates)
    }

    async fn find_by_name(&self, name: &str) -> Option<MessageTemplate> {
        find_by(&self.templates, |template| template.name == name)
            .into_iter()
            .next()
    }

    async fn find_default(
        &self,
        category: &str,
        channel: MessageChannel,
    ) -> Option<MessageTemplate> {
        find_by(&self.templates, |template| {
            template.is_default && template.category == category && template.channel == channel
        })
        .into_iter()
        .next()
    }

    async fn unset_defaults(&self, category: &str, channel: MessageChannel) -> anyhow::Result<()> {
        update_many(
            &self.templates,
            |template| {
                template.is_default && template.category == category && template.channel == channel
            },
            |template| template.is_default = false,
        );
        Ok(())
    }
}
