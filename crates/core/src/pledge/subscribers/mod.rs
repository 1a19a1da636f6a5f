use super::charge_due_pledges::{ChargeDuePledgesUseCase, ChargedBatch, ChargedPledge};
use crate::message::schedule_message::{MessageContent, ScheduleMessageUseCase};
use crate::shared::usecase::{execute, Subscriber};
use pledger_domain::{MessageChannel, PlaceholderValues};
use tracing::warn;

/// Template category the receipt mails are drawn from.
pub const DONATION_RECEIPT_CATEGORY: &str = "donation_receipt";

pub struct SendReceiptsOnChargedPledges;

#[async_trait::async_trait]
impl Subscriber<ChargeDuePledgesUseCase> for SendReceiptsOnChargedPledges {
    async fn notify(&self, batch: &ChargedBatch, ctx: &pledger_infra::PledgerContext) {
        if batch.charged.is_empty() {
            return;
        }

        let template = match ctx
            .repos
            .templates
            .find_default(DONATION_RECEIPT_CATEGORY, MessageChannel::Email)
            .await
        {
            Some(template) => template,
            None => {
                warn!(
                    "No default {} template is configured, skipping {} receipts",
                    DONATION_RECEIPT_CATEGORY,
                    batch.charged.len()
                );
                return;
            }
        };

        for charged in &batch.charged {
            let schedule_receipt = ScheduleMessageUseCase {
                channel: MessageChannel::Email,
                recipient: charged.pledge.donor.email.clone(),
                sender: None,
                scheduled_at: None,
                content: MessageContent::FromTemplate {
                    template_id: template.id.clone(),
                    values: receipt_values(charged),
                },
            };

            // Receipts are best effort and never touch the charge outcome
            if let Err(e) = execute(schedule_receipt, ctx).await {
                warn!(
                    "Unable to schedule a receipt for pledge with id: {}. Error: {:?}",
                    charged.pledge.id, e
                );
            }
        }
    }
}

fn receipt_values(charged: &ChargedPledge) -> PlaceholderValues {
    let mut values = PlaceholderValues::new();
    values.insert("donor_name".into(), charged.pledge.donor.name.clone());
    values.insert("amount".into(), charged.transaction.amount.to_string());
    values.insert("currency".into(), charged.transaction.currency.to_string());
    values.insert(
        "charged_at".into(),
        charged.transaction.charged_at.format("%Y-%m-%d").to_string(),
    );
    values.insert(
        "next_charge_at".into(),
        charged.pledge.next_charge_at.format("%Y-%m-%d").to_string(),
    );
    values
}
