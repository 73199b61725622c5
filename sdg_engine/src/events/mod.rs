//! Alert fan-out
//!
//! Confirmed donations are turned into [`AlertEvent`]s and published on a [`NotificationBus`]. Every connected overlay
//! holds its own subscription. Delivery is live only: a subscriber sees the events published after it subscribed,
//! and nothing is replayed.
mod bus;
mod event_types;

pub use bus::{NotificationBus, DEFAULT_ALERT_BUFFER_SIZE};
pub use event_types::*;
