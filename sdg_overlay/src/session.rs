//! The overlay session: follows an alert stream and plays every alert through a renderer, one after the other.
use std::{collections::VecDeque, fmt::Display};

use futures::{Stream, StreamExt};
use log::*;
use sdg_engine::{db_types::AlertSettings, events::AlertEvent};
use tokio::time::{sleep_until, Instant};

use crate::{
    playback::{AlertTiming, Playback, PlaybackAction},
    renderer::AlertRenderer,
    template::render_headline,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Alerts that made it on screen.
    pub shown: usize,
    /// Alerts that could not be rendered and were passed over.
    pub skipped: usize,
    /// Alerts that were still queued when the stream ended.
    pub dropped: usize,
}

/// Plays alerts from `events` until the stream ends or fails.
///
/// When the stream goes away, playback stops at once. The alert on screen is cleared, pending timers are cancelled and
/// queued alerts are discarded.
pub async fn run_session<S, E, R>(events: S, settings: &AlertSettings, renderer: &mut R) -> SessionSummary
where
    S: Stream<Item = Result<AlertEvent, E>>,
    E: Display,
    R: AlertRenderer,
{
    let mut events = std::pin::pin!(events);
    let mut playback = Playback::new(AlertTiming::from(settings));
    let mut summary = SessionSummary::default();
    loop {
        let deadline = playback.next_deadline();
        let actions = tokio::select! {
            next = events.next() => match next {
                Some(Ok(alert)) => {
                    debug!("🎬️ Alert {} received", alert.id);
                    playback.enqueue(alert, Instant::now())
                },
                Some(Err(e)) => {
                    warn!("🎬️ Alert stream failed. {e}");
                    break;
                },
                None => {
                    info!("🎬️ Alert stream closed");
                    break;
                },
            },
            _ = wait_until(deadline) => playback.advance(Instant::now()),
        };
        perform(actions, &mut playback, settings, renderer, &mut summary);
    }
    if !playback.is_idle() {
        if let Err(e) = renderer.clear() {
            warn!("🎬️ Could not clear the screen. {e}");
        }
    }
    summary.dropped = playback.clear().len();
    if summary.dropped > 0 {
        info!("🎬️ {} queued alerts were discarded", summary.dropped);
    }
    summary
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn perform<R: AlertRenderer>(
    actions: Vec<PlaybackAction>,
    playback: &mut Playback,
    settings: &AlertSettings,
    renderer: &mut R,
    summary: &mut SessionSummary,
) {
    let mut actions = VecDeque::from(actions);
    let mut failed = Vec::new();
    while let Some(action) = actions.pop_front() {
        match action {
            PlaybackAction::Show(alert) => {
                let headline = render_headline(&settings.message_template, &alert.donor_name, alert.amount);
                match renderer.show(&alert, &headline, settings) {
                    Ok(()) => {
                        info!("🎬️ Showing alert {}: {headline}", alert.id);
                        summary.shown += 1;
                    },
                    Err(e) => {
                        warn!("🎬️ Could not show alert {}. Skipping it. {e}", alert.id);
                        summary.skipped += 1;
                        if playback.current().is_some_and(|current| current.id == alert.id) {
                            actions.extend(playback.skip_current(Instant::now()));
                        }
                        failed.push(alert.id);
                    },
                }
            },
            PlaybackAction::Hide(alert) if !failed.contains(&alert.id) => {
                if let Err(e) = renderer.hide(&alert) {
                    warn!("🎬️ Could not hide alert {}. {e}", alert.id);
                }
            },
            PlaybackAction::Finished(alert) if !failed.contains(&alert.id) => {
                trace!("🎬️ Alert {} finished", alert.id);
                if let Err(e) = renderer.clear() {
                    warn!("🎬️ Could not clear the screen. {e}");
                }
            },
            PlaybackAction::Hide(_) | PlaybackAction::Finished(_) => {},
        }
    }
}
