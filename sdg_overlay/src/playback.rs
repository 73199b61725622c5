//! Alert playback
//!
//! Alerts are played one at a time, in arrival order. While an alert is on screen, new arrivals wait in a FIFO queue.
//!
//! ```text
//!          arrival (queue empty)              display elapsed
//!   Idle ───────────────────────▶ Visible ─────────────────▶ Exiting
//!    ▲                                ▲                         │ exit animation elapsed
//!    │ queue empty                    └─────────────────────────┤ queue not empty: show the next alert
//!    └──────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Playback`] never reads the clock. Every method takes the current instant, and [`Playback::next_deadline`] tells
//! the caller when to come back.
use std::collections::VecDeque;

use log::*;
use sdg_engine::{db_types::AlertSettings, events::AlertEvent};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTiming {
    /// How long an alert stays fully on screen.
    pub display: Duration,
    /// How long the exit animation runs before the next alert may start.
    pub exit_animation: Duration,
}

impl From<&AlertSettings> for AlertTiming {
    fn from(settings: &AlertSettings) -> Self {
        let millis = |ms: i64| Duration::from_millis(u64::try_from(ms).unwrap_or_default());
        Self { display: millis(settings.duration_ms), exit_animation: millis(settings.animation_duration_ms) }
    }
}

impl Default for AlertTiming {
    fn default() -> Self {
        Self::from(&AlertSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Visible { alert: AlertEvent, until: Instant },
    Exiting { alert: AlertEvent, until: Instant },
}

/// What the renderer should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Put this alert on screen.
    Show(AlertEvent),
    /// Start the exit animation for this alert.
    Hide(AlertEvent),
    /// The alert is gone. The screen is empty until the next `Show`.
    Finished(AlertEvent),
}

#[derive(Debug, Clone)]
pub struct Playback {
    timing: AlertTiming,
    queue: VecDeque<AlertEvent>,
    phase: Phase,
}

impl Playback {
    pub fn new(timing: AlertTiming) -> Self {
        Self { timing, queue: VecDeque::new(), phase: Phase::Idle }
    }

    pub fn timing(&self) -> AlertTiming {
        self.timing
    }

    /// New timings apply from the next alert onwards.
    pub fn set_timing(&mut self, timing: AlertTiming) {
        self.timing = timing;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// The number of alerts waiting their turn. The alert on screen is not counted.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn current(&self) -> Option<&AlertEvent> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Visible { alert, .. } | Phase::Exiting { alert, .. } => Some(alert),
        }
    }

    /// When [`Self::advance`] next has something to do, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Visible { until, .. } | Phase::Exiting { until, .. } => Some(*until),
        }
    }

    /// A new alert arrived. It is shown at once if nothing else is playing, and queued otherwise.
    pub fn enqueue(&mut self, alert: AlertEvent, now: Instant) -> Vec<PlaybackAction> {
        self.queue.push_back(alert);
        if self.is_idle() {
            self.show_next(now).into_iter().collect()
        } else {
            trace!("🎬️ Alert queued. {} waiting.", self.queue.len());
            Vec::new()
        }
    }

    /// Applies every phase change that is due at `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<PlaybackAction> {
        let mut actions = Vec::new();
        loop {
            match &self.phase {
                Phase::Visible { alert, until } if *until <= now => {
                    let alert = alert.clone();
                    let until = *until + self.timing.exit_animation;
                    self.phase = Phase::Exiting { alert: alert.clone(), until };
                    actions.push(PlaybackAction::Hide(alert));
                },
                Phase::Exiting { alert, until } if *until <= now => {
                    let alert = alert.clone();
                    let due = *until;
                    self.phase = Phase::Idle;
                    actions.push(PlaybackAction::Finished(alert));
                    // The next alert starts when the previous one actually finished, not when we noticed
                    actions.extend(self.show_next(due));
                },
                _ => return actions,
            }
        }
    }

    /// Drops the alert on screen without any animation, and moves on to the next one.
    ///
    /// Used when an alert could not be rendered, so that one bad alert does not hold up the rest.
    pub fn skip_current(&mut self, now: Instant) -> Option<PlaybackAction> {
        if let Some(alert) = self.current() {
            debug!("🎬️ Skipping alert {}", alert.id);
        }
        self.phase = Phase::Idle;
        self.show_next(now)
    }

    /// Empties the queue and the screen. Returns the alerts that never got played.
    pub fn clear(&mut self) -> Vec<AlertEvent> {
        self.phase = Phase::Idle;
        self.queue.drain(..).collect()
    }

    fn show_next(&mut self, now: Instant) -> Option<PlaybackAction> {
        let alert = self.queue.pop_front()?;
        self.phase = Phase::Visible { alert: alert.clone(), until: now + self.timing.display };
        Some(PlaybackAction::Show(alert))
    }
}
