mod message;
mod pledge;
mod shared;
mod template;
mod transaction;

pub use message::{Message, MessageChannel};
pub use pledge::{
    Cancellation, CurrencyCode, Donor, Frequency, InvalidCurrencyError, PledgeStateError,
    PledgeStatus, RecurringPledge,
};
pub use shared::entity::{Entity, ID};
pub use template::{
    extract_placeholders, missing_placeholders, render_placeholders, MessageTemplate,
    PlaceholderValues, RenderedMessage, TemplateError, TemplateUsage,
};
pub use transaction::ChargeTransaction;
