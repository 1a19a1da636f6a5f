use super::schedule_message::ScheduleMessageUseCase;
use super::send_message::SendMessageUseCase;
use crate::shared::usecase::{execute, Subscriber};
use pledger_domain::Message;

pub struct DispatchImmediatelyOnScheduled;

#[async_trait::async_trait]
impl Subscriber<ScheduleMessageUseCase> for DispatchImmediatelyOnScheduled {
    async fn notify(&self, message: &Message, ctx: &pledger_infra::PledgerContext) {
        // A schedule is only dispatched right away when no send time was
        // given. A failure here is recorded on the record and the retry
        // pass picks it up later.
        if message.scheduled_at.is_some() {
            return;
        }

        let send_message = SendMessageUseCase {
            message_id: message.id.clone(),
        };

        // Sideeffect, ignore result
        let _ = execute(send_message, ctx).await;
    }
}
