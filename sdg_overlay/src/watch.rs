//! Keeps an overlay session going across server restarts and dropped connections.
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::*;

use crate::{
    client::DonationServerClient,
    renderer::AlertRenderer,
    session::{run_session, SessionSummary},
};

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// How long to wait before reconnecting.
    pub retry: Duration,
    /// Stop after the first session, or the first failed connection attempt.
    pub once: bool,
    /// Give up after this many failed connection attempts in a row. `None` retries forever.
    pub max_failures: Option<u32>,
}

/// Fetches the alert settings, follows the alert stream and plays it through `renderer`. When the connection drops, or
/// cannot be made at all, it tries again after `options.retry`.
///
/// Settings are re-read on every connection, so changes take effect after a reconnect.
pub async fn watch<R: AlertRenderer>(
    client: &DonationServerClient,
    renderer: &mut R,
    options: WatchOptions,
) -> Result<()> {
    let mut failures = 0u32;
    loop {
        match connect_and_play(client, renderer).await {
            Ok(summary) => {
                failures = 0;
                info!(
                    "📡️ Alert stream ended. {} shown, {} skipped, {} discarded.",
                    summary.shown, summary.skipped, summary.dropped
                );
            },
            Err(e) if options.once => return Err(e),
            Err(e) => {
                failures += 1;
                warn!("📡️ Could not follow the alert stream on {}. {e}", client.server());
                if options.max_failures.is_some_and(|max| failures >= max) {
                    return Err(anyhow!("Giving up after {failures} failed connection attempts. {e}"));
                }
            },
        }
        if options.once {
            return Ok(());
        }
        info!("📡️ Reconnecting in {}s", options.retry.as_secs_f32());
        tokio::time::sleep(options.retry).await;
    }
}

async fn connect_and_play<R: AlertRenderer>(
    client: &DonationServerClient,
    renderer: &mut R,
) -> Result<SessionSummary> {
    let settings = client.alert_settings().await?;
    let stream = client.alert_stream().await?;
    info!("📡️ Watching for donations on {}", client.server());
    Ok(run_session(stream, &settings, renderer).await)
}
