pub mod process_due_messages;
pub mod schedule_message;
pub mod send_message;
pub mod subscribers;
