mod inmemory;
mod postgres;

pub use inmemory::InMemoryTemplateRepo;
use pledger_domain::{MessageChannel, MessageTemplate, ID};
pub use postgres::PostgresTemplateRepo;

#[async_trait::async_trait]
pub trait ITemplateRepo: Send + Sync {
    async fn insert(&self, template: &MessageTemplate) -> anyhow::Result<()>;
    async fn save(&self, template: &MessageTemplate) -> anyhow::Result<()>;
    async fn find(&self, template_id: &ID) -> Option<MessageTemplate>;
    async fn find_by_name(&self, name: &str) -> Option<MessageTemplate>;
    async fn find_default(
        &self,
        category: &str,
        channel: MessageChannel,
    ) -> Option<MessageTemplate>;
    async fn unset_defaults(&self, category: &str, channel: MessageChannel) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::PledgerContext;
    use chrono::{TimeZone, Utc};
    use pledger_domain::{MessageChannel, MessageTemplate};

    fn receipt_template(name: &str) -> MessageTemplate {
        MessageTemplate::new(
            name.into(),
            "donation_receipt".into(),
            MessageChannel::Email,
            true,
            "giving@cool.com".into(),
            Some("Thank you {{donor_name}}!".into()),
            "<p>Dear {{donor_name}}, thank you.</p>".into(),
            vec!["donor_name".into()],
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn find_by_name_and_default_lookup() {
        let ctx = PledgerContext::create_inmemory();

        let mut template = receipt_template("receipt_en");
        template.is_default = true;
        ctx.repos.templates.insert(&template).await.unwrap();

        let by_name = ctx.repos.templates.find_by_name("receipt_en").await.unwrap();
        assert_eq!(by_name.id, template.id);

        let default = ctx
            .repos
            .templates
            .find_default("donation_receipt", MessageChannel::Email)
            .await
            .unwrap();
        assert_eq!(default.id, template.id);

        assert!(ctx
            .repos
            .templates
            .find_default("donation_receipt", MessageChannel::Sms)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unset_defaults_clears_the_pair_only() {
        let ctx = PledgerContext::create_inmemory();

        let mut email_default = receipt_template("receipt_en");
        email_default.is_default = true;
        let mut sms_default = receipt_template("receipt_sms");
        sms_default.channel = MessageChannel::Sms;
        sms_default.is_default = true;
        ctx.repos.templates.insert(&email_default).await.unwrap();
        ctx.repos.templates.insert(&sms_default).await.unwrap();

        ctx.repos
            .templates
            .unset_defaults("donation_receipt", MessageChannel::Email)
            .await
            .unwrap();

        assert!(ctx
            .repos
            .templates
            .find_default("donation_receipt", MessageChannel::Email)
            .await
            .is_none());
        assert!(ctx
            .repos
            .templates
            .find_default("donation_receipt", MessageChannel::Sms)
            .await
            .is_some());
    }
}
