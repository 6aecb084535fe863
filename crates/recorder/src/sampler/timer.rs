//! Timer role of the scheduler

use common::TriggerSender;
use std::time::Duration;
use tracing::{debug, warn};

/// Post a trigger, sleep one record period, repeat
///
/// The first trigger is posted immediately. Returns only when the worker
/// has gone away and a post fails; dropping the future stops posting.
pub async fn run_timer(triggers: &mut TriggerSender, period: Duration) -> common::Result<()> {
    loop {
        let trigger = triggers.post().await?;

        let backlog = triggers.backlog();
        if backlog > 1 {
            warn!(
                "Sampling is falling behind: {} triggers queued (record period {:?})",
                backlog, period
            );
        } else {
            debug!("Posted trigger {}", trigger.sequence);
        }

        tokio::time::sleep(period).await;
    }
}
