mod helpers;

use chrono::{DateTime, Duration, Utc};
use helpers::setup::{spawn_app, TestApp};
use pledger_core::execute;
use pledger_core::message::process_due_messages::{ProcessDueMessagesUseCase, ProcessedMessages};
use pledger_core::message::schedule_message::{MessageContent, ScheduleMessageUseCase};
use pledger_core::template::create_template::CreateTemplateUseCase;
use pledger_domain::{Message, MessageChannel, MessageTemplate, PlaceholderValues};
use pledger_infra::PledgerContext;

async fn schedule_email(
    ctx: &PledgerContext,
    recipient: &str,
    scheduled_at: Option<DateTime<Utc>>,
) -> Message {
    let usecase = ScheduleMessageUseCase {
        channel: MessageChannel::Email,
        recipient: recipient.into(),
        sender: Some("hello@coolcharity.org".into()),
        scheduled_at,
        content: MessageContent::AdHoc {
            subject: Some("A quick note".into()),
            body: "Hello from the giving team".into(),
            is_html: false,
        },
    };

    execute(usecase, ctx)
        .await
        .expect("To schedule the message")
}

async fn create_welcome_template(ctx: &PledgerContext) -> MessageTemplate {
    let usecase = CreateTemplateUseCase {
        name: "welcome_en".into(),
        category: "welcome".into(),
        channel: MessageChannel::Email,
        is_html: false,
        default_sender: "hello@coolcharity.org".into(),
        default_subject: Some("Welcome {{donor_name}}!".into()),
        body: "Dear {{donor_name}}, welcome to the monthly giving circle.".into(),
        placeholders: vec!["donor_name".into()],
        is_default: false,
    };

    execute(usecase, ctx)
        .await
        .expect("To create the welcome template")
}

#[tokio::test]
async fn messages_without_a_send_time_are_dispatched_right_away() {
    let TestApp { ctx, transport, .. } = spawn_app();

    let message = schedule_email(&ctx, "ada@example.org", None).await;

    let emails = transport.emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "ada@example.org");
    assert_eq!(emails[0].from, "hello@coolcharity.org");
    assert_eq!(emails[0].subject, "A quick note");
    assert!(!emails[0].is_html);

    let stored = ctx.repos.messages.find(&message.id).await.unwrap();
    assert!(stored.is_sent);
    assert!(stored.sent_at.is_some());
}

#[tokio::test]
async fn scheduled_messages_wait_for_their_send_time() {
    let TestApp { ctx, transport, .. } = spawn_app();

    schedule_email(&ctx, "elapsed@example.org", Some(Utc::now() - Duration::minutes(10))).await;
    schedule_email(&ctx, "tomorrow@example.org", Some(Utc::now() + Duration::hours(24))).await;

    // Neither had an immediate dispatch
    assert!(transport.emails().is_empty());

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: false }, &ctx)
        .await
        .expect("To run the dispatch pass");
    assert_eq!(
        processed,
        ProcessedMessages {
            attempted: 1,
            delivered: 1,
            failed: 0
        }
    );

    let emails = transport.emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "elapsed@example.org");

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: false }, &ctx)
        .await
        .expect("To run the dispatch pass");
    assert_eq!(processed.attempted, 0);
}

#[tokio::test]
async fn failed_template_message_is_retried_with_the_current_template_body() {
    let TestApp { ctx, transport, .. } = spawn_app();
    let template = create_welcome_template(&ctx).await;
    transport.set_failing(Some("Relay overloaded"));

    let mut values = PlaceholderValues::new();
    values.insert("donor_name".into(), "Ada".into());
    let usecase = ScheduleMessageUseCase {
        channel: MessageChannel::Email,
        recipient: "ada@example.org".into(),
        sender: None,
        scheduled_at: Some(Utc::now() - Duration::minutes(10)),
        content: MessageContent::FromTemplate {
            template_id: template.id.clone(),
            values,
        },
    };
    let message = execute(usecase, &ctx)
        .await
        .expect("To schedule the message");

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: false }, &ctx)
        .await
        .expect("To run the dispatch pass");
    assert_eq!(processed.failed, 1);

    let stored = ctx.repos.messages.find(&message.id).await.unwrap();
    assert!(!stored.is_sent);
    assert_eq!(stored.retry_count, 1);
    assert_eq!(
        stored.last_error,
        Some("Delivery failed: Relay overloaded".to_string())
    );

    // The template is reworded while the message waits for its retry
    let mut template = template;
    template.body = "Dear {{donor_name}}, welcome aboard!".into();
    ctx.repos.templates.save(&template).await.unwrap();
    transport.set_failing(None);

    // A plain pass leaves failed messages alone
    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: false }, &ctx)
        .await
        .expect("To run the dispatch pass");
    assert_eq!(processed.attempted, 0);

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: true }, &ctx)
        .await
        .expect("To run the retry pass");
    assert_eq!(
        processed,
        ProcessedMessages {
            attempted: 1,
            delivered: 1,
            failed: 0
        }
    );

    // The retry rendered from the reworded template, not the stale content
    let emails = transport.emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "Welcome Ada!");
    assert_eq!(emails[0].body, "Dear Ada, welcome aboard!");
}

#[tokio::test]
async fn messages_stop_retrying_at_the_retry_ceiling() {
    let TestApp {
        mut ctx, transport, ..
    } = spawn_app();
    ctx.config.max_message_retries = 2;
    transport.set_failing(Some("Relay overloaded"));

    let message =
        schedule_email(&ctx, "ada@example.org", Some(Utc::now() - Duration::minutes(10))).await;

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: false }, &ctx)
        .await
        .expect("To run the dispatch pass");
    assert_eq!(processed.failed, 1);

    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: true }, &ctx)
        .await
        .expect("To run the retry pass");
    assert_eq!(processed.failed, 1);

    // The second failure reached the attempt ceiling, no third try
    let processed = execute(ProcessDueMessagesUseCase { retry_pass_due: true }, &ctx)
        .await
        .expect("To run the retry pass");
    assert_eq!(processed.attempted, 0);

    let stored = ctx.repos.messages.find(&message.id).await.unwrap();
    assert!(!stored.is_sent);
    assert_eq!(stored.retry_count, 2);
    assert!(stored.last_error.is_some());
}

#[tokio::test]
async fn sms_messages_go_through_the_sms_relay() {
    let TestApp { ctx, transport, .. } = spawn_app();

    let usecase = ScheduleMessageUseCase {
        channel: MessageChannel::Sms,
        recipient: "+4799887766".into(),
        sender: Some("COOLCHARITY".into()),
        scheduled_at: None,
        content: MessageContent::AdHoc {
            subject: None,
            body: "Thank you for your pledge, Ada!".into(),
            is_html: false,
        },
    };
    execute(usecase, &ctx)
        .await
        .expect("To schedule the message");

    assert!(transport.emails().is_empty());
    let sms_messages = transport.sms_messages();
    assert_eq!(sms_messages.len(), 1);
    assert_eq!(sms_messages[0].to, "+4799887766");
    assert_eq!(sms_messages[0].from, "COOLCHARITY");
    assert_eq!(sms_messages[0].body, "Thank you for your pledge, Ada!");
}
