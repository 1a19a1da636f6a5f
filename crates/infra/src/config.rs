use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// How many consecutive failed charges a pledge may accumulate before
    /// it is parked as failed and left alone.
    pub max_failed_attempts: u32,
    /// How many failed delivery attempts a message may accumulate before
    /// the retry pass stops picking it up.
    pub max_message_retries: u32,
    /// Cadence of the recurring charge loop.
    pub pledge_poll_interval_minutes: u32,
    /// Upper bound on pledges charged per tick.
    pub pledge_batch_limit: usize,
    /// Upper bound on messages fetched per dispatch batch.
    pub message_batch_limit: usize,
}

fn env_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    let raw = match std::env::var(name) {
        Ok(raw) => raw,
        Err(_) => return default,
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                "The given {}: {} is not valid, falling back to the default: {}.",
                name, raw, default
            );
            default
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_failed_attempts: env_number("MAX_FAILED_ATTEMPTS", 3),
            max_message_retries: env_number("MAX_MESSAGE_RETRIES", 5),
            pledge_poll_interval_minutes: env_number("PLEDGE_POLL_INTERVAL_MINUTES", 15),
            pledge_batch_limit: env_number("PLEDGE_BATCH_LIMIT", 250),
            message_batch_limit: env_number("MESSAGE_BATCH_LIMIT", 250),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
