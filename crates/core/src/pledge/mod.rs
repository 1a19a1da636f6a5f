pub mod cancel_pledge;
pub mod charge_due_pledges;
pub mod create_pledge;
pub mod pause_pledge;
pub mod resume_pledge;
pub mod subscribers;
pub mod update_payment_method;
