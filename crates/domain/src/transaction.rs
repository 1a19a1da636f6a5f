use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pledge::CurrencyCode;

/// Record of one successful charge against a pledge. Insert only, the
/// financial audit trail is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeTransaction {
    pub id: ID,
    pub pledge_id: ID,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// Transaction id assigned by the payment gateway.
    pub gateway_reference: String,
    /// The order reference this process supplied for the attempt.
    pub order_reference: String,
    pub charged_at: DateTime<Utc>,
}

impl ChargeTransaction {
    pub fn new(
        pledge_id: ID,
        amount: Decimal,
        currency: CurrencyCode,
        gateway_reference: String,
        order_reference: String,
        charged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            pledge_id,
            amount,
            currency,
            gateway_reference,
            order_reference,
            charged_at,
        }
    }
}

impl Entity for ChargeTransaction {
    fn id(&self) -> &ID {
        &self.id
    }
}
