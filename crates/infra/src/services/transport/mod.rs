use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct EmailPayload {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsPayload {
    pub to: String,
    pub from: String,
    pub body: String,
}

#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Recipient is not valid: {0}")]
    InvalidRecipient(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait::async_trait]
pub trait INotificationTransport: Send + Sync {
    async fn send_email(&self, email: &EmailPayload) -> Result<(), TransportError>;
    async fn send_sms(&self, sms: &SmsPayload) -> Result<(), TransportError>;
}

fn validate_email_recipient(to: &str) -> Result<(), TransportError> {
    if to.trim().is_empty() || !to.contains('@') {
        return Err(TransportError::InvalidRecipient(to.to_string()));
    }
    Ok(())
}

fn validate_sms_recipient(to: &str) -> Result<(), TransportError> {
    if to.trim().is_empty() {
        return Err(TransportError::InvalidRecipient(to.to_string()));
    }
    Ok(())
}

/// Delivery relay client. The relay accepts a rendered message and owns
/// the actual SMTP / SMS provider plumbing.
pub struct HttpNotificationTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpNotificationTransport {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<(), TransportError> {
        let res = self
            .client
            .post(&format!("{}/{}", self.base_url, path))
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Delivery relay {} error: {:?}", path, e);
                TransportError::Delivery(e.to_string())
            })?;
        let res = res.json::<RelayResponseBody>().await.map_err(|e| {
            warn!("Delivery relay {} deserialize error: {:?}", path, e);
            TransportError::Delivery(e.to_string())
        })?;

        if res.success {
            Ok(())
        } else {
            Err(TransportError::Delivery(
                res.error_message
                    .unwrap_or_else(|| "Unknown delivery error".into()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayResponseBody {
    success: bool,
    error_message: Option<String>,
}

#[async_trait::async_trait]
impl INotificationTransport for HttpNotificationTransport {
    async fn send_email(&self, email: &EmailPayload) -> Result<(), TransportError> {
        validate_email_recipient(&email.to)?;
        self.post("email", email).await
    }

    async fn send_sms(&self, sms: &SmsPayload) -> Result<(), TransportError> {
        validate_sms_recipient(&sms.to)?;
        self.post("sms", sms).await
    }
}

/// Records deliveries instead of performing them. Used by tests and by
/// inmemory contexts.
pub struct InMemoryNotificationTransport {
    fail_with: Mutex<Option<String>>,
    emails: Mutex<Vec<EmailPayload>>,
    sms_messages: Mutex<Vec<SmsPayload>>,
}

impl InMemoryNotificationTransport {
    pub fn new() -> Self {
        Self {
            fail_with: Mutex::new(None),
            emails: Mutex::new(Vec::new()),
            sms_messages: Mutex::new(Vec::new()),
        }
    }

    /// While set, every delivery fails with the given reason.
    pub fn set_failing(&self, reason: Option<&str>) {
        *self.fail_with.lock().unwrap() = reason.map(|r| r.to_string());
    }

    pub fn emails(&self) -> Vec<EmailPayload> {
        self.emails.lock().unwrap().clone()
    }

    pub fn sms_messages(&self) -> Vec<SmsPayload> {
        self.sms_messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl INotificationTransport for InMemoryNotificationTransport {
    async fn send_email(&self, email: &EmailPayload) -> Result<(), TransportError> {
        validate_email_recipient(&email.to)?;
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(TransportError::Delivery(reason));
        }
        self.emails.lock().unwrap().push(email.clone());
        Ok(())
    }

    async fn send_sms(&self, sms: &SmsPayload) -> Result<(), TransportError> {
        validate_sms_recipient(&sms.to)?;
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(TransportError::Delivery(reason));
        }
        self.sms_messages.lock().unwrap().push(sms.clone());
        Ok(())
    }
}
