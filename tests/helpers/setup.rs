use pledger_core::execute;
use pledger_core::template::create_template::CreateTemplateUseCase;
use pledger_domain::{MessageChannel, MessageTemplate};
use pledger_infra::{InMemoryNotificationTransport, InMemoryPaymentGateway, PledgerContext};
use std::sync::Arc;

pub struct TestApp {
    pub ctx: PledgerContext,
    pub gateway: Arc<InMemoryPaymentGateway>,
    pub transport: Arc<InMemoryNotificationTransport>,
}

// Context wired against inmemory collaborators, with handles on the
// gateway and relay doubles kept around for assertions
pub fn spawn_app() -> TestApp {
    let mut ctx = PledgerContext::create_inmemory();
    let gateway = Arc::new(InMemoryPaymentGateway::new());
    let transport = Arc::new(InMemoryNotificationTransport::new());
    ctx.gateway = gateway.clone();
    ctx.transport = transport.clone();

    TestApp {
        ctx,
        gateway,
        transport,
    }
}

/// The default receipt template charged pledges thank their donors with.
pub async fn create_receipt_template(ctx: &PledgerContext) -> MessageTemplate {
    let usecase = CreateTemplateUseCase {
        name: "donation_receipt_en".into(),
        category: "donation_receipt".into(),
        channel: MessageChannel::Email,
        is_html: true,
        default_sender: "giving@coolcharity.org".into(),
        default_subject: Some("Thank you {{donor_name}}!".into()),
        body: "<p>Dear {{donor_name}}, we received your {{amount}} {{currency}} donation.</p>"
            .into(),
        placeholders: vec!["donor_name".into(), "amount".into(), "currency".into()],
        is_default: true,
    };

    execute(usecase, ctx)
        .await
        .expect("To create the receipt template")
}
