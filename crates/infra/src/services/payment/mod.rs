use pledger_domain::CurrencyCode;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub payment_token: String,
    /// Unique per attempt, lets the gateway separate a retried attempt
    /// from a double submission of the same attempt.
    pub order_reference: String,
}

#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub transaction_reference: String,
}

#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Charge was declined: {0}")]
    Declined(String),
    #[error("Payment gateway could not be reached: {0}")]
    Unreachable(String),
}

#[async_trait::async_trait]
pub trait IPaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, GatewayError>;
}

pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChargeRequestBody<'a> {
    amount: Decimal,
    currency: &'a str,
    payment_token: &'a str,
    order_reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChargeResponseBody {
    success: bool,
    transaction_id: Option<String>,
    error_message: Option<String>,
}

#[async_trait::async_trait]
impl IPaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let body = ChargeRequestBody {
            amount: request.amount,
            currency: request.currency.as_str(),
            payment_token: &request.payment_token,
            order_reference: &request.order_reference,
        };
        let res = self
            .client
            .post(&format!("{}/charges", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Payment gateway charge error: {:?}", e);
                GatewayError::Unreachable(e.to_string())
            })?;
        let res = res.json::<ChargeResponseBody>().await.map_err(|e| {
            warn!("Payment gateway charge deserialize error: {:?}", e);
            GatewayError::Unreachable(e.to_string())
        })?;

        if !res.success {
            return Err(GatewayError::Declined(
                res.error_message
                    .unwrap_or_else(|| "Unknown decline reason".into()),
            ));
        }
        match res.transaction_id {
            Some(transaction_reference) => Ok(ChargeReceipt {
                transaction_reference,
            }),
            None => Err(GatewayError::Unreachable(
                "Gateway approved the charge without a transaction id".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBehaviour {
    Approve,
    Decline,
    Unreachable,
}

/// Records charges instead of performing them. Used by tests and by
/// inmemory contexts.
pub struct InMemoryPaymentGateway {
    behaviour: Mutex<GatewayBehaviour>,
    charges: Mutex<Vec<ChargeRequest>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self {
            behaviour: Mutex::new(GatewayBehaviour::Approve),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behaviour(&self, behaviour: GatewayBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Every charge the gateway has seen, in order.
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IPaymentGateway for InMemoryPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let behaviour = *self.behaviour.lock().unwrap();
        match behaviour {
            // An unreachable gateway never sees the request
            GatewayBehaviour::Unreachable => {
                Err(GatewayError::Unreachable("Gateway offline".into()))
            }
            GatewayBehaviour::Decline => {
                self.charges.lock().unwrap().push(request);
                Err(GatewayError::Declined("Card declined".into()))
            }
            GatewayBehaviour::Approve => {
                let mut charges = self.charges.lock().unwrap();
                charges.push(request);
                Ok(ChargeReceipt {
                    transaction_reference: format!("gw_tx_{}", charges.len()),
                })
            }
        }
    }
}
