use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageChannel {
    Email,
    Sms,
}

impl Display for MessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Sms => write!(f, "sms"),
        }
    }
}

impl FromStr for MessageChannel {
    type Err = ();

    fn from_str(channel: &str) -> Result<Self, Self::Err> {
        match channel {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            _ => Err(()),
        }
    }
}

/// A single outbound notification, ad hoc or generated from a template.
/// `scheduled_at = None` means send on the first opportunity. Delivery
/// outcomes are recorded here and nowhere else, so a record can always
/// tell whether it still needs work.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: ID,
    pub channel: MessageChannel,
    pub sender: String,
    pub recipient: String,
    /// Email only
    pub subject: Option<String>,
    pub body: String,
    pub is_html: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel: MessageChannel,
        sender: String,
        recipient: String,
        subject: Option<String>,
        body: String,
        is_html: bool,
        scheduled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            channel,
            sender,
            recipient,
            subject,
            body,
            is_html,
            scheduled_at,
            is_sent: false,
            sent_at: None,
            last_error: None,
            retry_count: 0,
            created_at: now,
        }
    }

    pub fn mark_sent(&mut self, sent_at: DateTime<Utc>) {
        self.is_sent = true;
        self.sent_at = Some(sent_at);
        self.last_error = None;
    }

    pub fn register_failure(&mut self, reason: &str) {
        self.last_error = Some(reason.to_string());
        // A non zero count moves the record from the scheduled pass over
        // to the slower retry pass.
        self.retry_count += 1;
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_sent && self.retry_count == 0 && self.scheduled_at.map_or(true, |at| at <= now)
    }

    pub fn is_retry_eligible(&self, max_retries: u32) -> bool {
        !self.is_sent && self.retry_count >= 1 && self.retry_count < max_retries
    }
}

impl Entity for Message {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn test_message(scheduled_at: Option<DateTime<Utc>>) -> Message {
        Message::new(
            MessageChannel::Email,
            "giving@cool.com".into(),
            "ann@cool.com".into(),
            Some("Thank you".into()),
            "<p>Thank you Ann</p>".into(),
            true,
            scheduled_at,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn it_is_due_immediately_without_schedule() {
        let msg = test_message(None);
        let now = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert!(msg.is_due(now));
    }

    #[test]
    fn it_is_due_once_the_scheduled_time_elapses() {
        let scheduled_at = Utc.with_ymd_and_hms(2021, 1, 2, 10, 0, 0).unwrap();
        let msg = test_message(Some(scheduled_at));

        assert!(!msg.is_due(Utc.with_ymd_and_hms(2021, 1, 2, 9, 59, 59).unwrap()));
        assert!(msg.is_due(scheduled_at));
        assert!(msg.is_due(Utc.with_ymd_and_hms(2021, 1, 5, 0, 0, 0).unwrap()));
    }

    #[test]
    fn it_moves_to_the_retry_pass_after_a_failure() {
        let mut msg = test_message(None);
        let now = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

        msg.register_failure("Relay timeout");
        assert!(!msg.is_due(now));
        assert!(msg.is_retry_eligible(5));
        assert_eq!(msg.last_error, Some("Relay timeout".to_string()));
    }

    #[test]
    fn it_exhausts_retries_at_the_ceiling() {
        let mut msg = test_message(None);
        for _ in 0..5 {
            msg.register_failure("Relay timeout");
        }
        assert!(!msg.is_retry_eligible(5));
        assert!(!msg.is_sent);
    }

    #[test]
    fn it_clears_the_error_when_sent() {
        let mut msg = test_message(None);
        msg.register_failure("Relay timeout");

        let sent_at = Utc.with_ymd_and_hms(2021, 1, 1, 8, 0, 0).unwrap();
        msg.mark_sent(sent_at);

        assert!(msg.is_sent);
        assert_eq!(msg.sent_at, Some(sent_at));
        assert_eq!(msg.last_error, None);
        assert!(!msg.is_due(sent_at));
        assert!(!msg.is_retry_eligible(5));
    }
}
