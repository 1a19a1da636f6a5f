mod payment;
mod transport;

pub use payment::{
    ChargeReceipt, ChargeRequest, GatewayBehaviour, GatewayError, HttpPaymentGateway,
    IPaymentGateway, InMemoryPaymentGateway,
};
pub use transport::{
    EmailPayload, HttpNotificationTransport, INotificationTransport, InMemoryNotificationTransport,
    SmsPayload, TransportError,
};
