use crate::message::process_due_messages::ProcessDueMessagesUseCase;
use crate::pledge::charge_due_pledges::ChargeDuePledgesUseCase;
use crate::shared::usecase::execute;
use chrono::{DateTime, Duration, Utc};
use pledger_infra::PledgerContext;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const MESSAGE_SCHEDULED_INTERVAL_KEY: &str = "message_scheduled_interval_minutes";
pub const MESSAGE_RETRY_INTERVAL_KEY: &str = "message_failed_retry_interval_minutes";

const DEFAULT_SCHEDULED_INTERVAL_MINUTES: i64 = 5;
const DEFAULT_RETRY_INTERVAL_MINUTES: i64 = 480;

/// Cadences of the message dispatch loop, kept in the key value store
/// so operators can tune them without a deploy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageJobSettings {
    pub scheduled_interval: Duration,
    pub retry_interval: Duration,
}

impl MessageJobSettings {
    pub async fn load(ctx: &PledgerContext) -> Self {
        Self {
            scheduled_interval: Duration::minutes(
                load_interval_minutes(
                    ctx,
                    MESSAGE_SCHEDULED_INTERVAL_KEY,
                    DEFAULT_SCHEDULED_INTERVAL_MINUTES,
                )
                .await,
            ),
            retry_interval: Duration::minutes(
                load_interval_minutes(
                    ctx,
                    MESSAGE_RETRY_INTERVAL_KEY,
                    DEFAULT_RETRY_INTERVAL_MINUTES,
                )
                .await,
            ),
        }
    }
}

async fn load_interval_minutes(ctx: &PledgerContext, key: &str, default: i64) -> i64 {
    match ctx.repos.key_value.get(key).await {
        Some(raw) => match raw.parse::<i64>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                warn!(
                    "The stored {}: {} is not a valid interval, falling back to the default: {}.",
                    key, raw, default
                );
                default
            }
        },
        None => {
            // Seed the store so the knob is discoverable
            if let Err(e) = ctx.repos.key_value.set(key, &default.to_string()).await {
                warn!("Unable to seed {} in the key value store: {:?}", key, e);
            }
            default
        }
    }
}

pub fn retry_pass_due(
    last_retry_pass: DateTime<Utc>,
    now: DateTime<Utc>,
    retry_interval: Duration,
) -> bool {
    now - last_retry_pass >= retry_interval
}

pub fn start_charge_job_scheduler(
    ctx: PledgerContext,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let poll_interval =
            std::time::Duration::from_secs(ctx.config.pledge_poll_interval_minutes as u64 * 60);
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("Charge job scheduler shutting down");
                    return;
                }
            }

            let usecase = ChargeDuePledgesUseCase {
                stop: Some(shutdown.clone()),
            };
            let _ = execute(usecase, &ctx).await;
        }
    })
}

pub fn start_message_job_scheduler(
    ctx: PledgerContext,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let settings = MessageJobSettings::load(&ctx).await;
        info!(
            "Message dispatch running every {} minutes with a retry pass every {} minutes",
            settings.scheduled_interval.num_minutes(),
            settings.retry_interval.num_minutes()
        );

        let tick =
            std::time::Duration::from_secs(settings.scheduled_interval.num_seconds() as u64);
        let mut interval = tokio::time::interval(tick);
        // The retry cadence restarts on boot, a pending retry batch is
        // picked up at most one retry interval late.
        let mut last_retry_pass = ctx.sys.now();

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("Message job scheduler shutting down");
                    return;
                }
            }

            let now = ctx.sys.now();
            let retry_due = retry_pass_due(last_retry_pass, now, settings.retry_interval);
            let usecase = ProcessDueMessagesUseCase {
                retry_pass_due: retry_due,
            };
            let _ = execute(usecase, &ctx).await;
            if retry_due {
                // Advanced even when the batch was empty so an idle
                // system does not run the retry pass on every tick
                last_retry_pass = now;
            }
        }
    })
}
