use log::*;
use tokio::sync::broadcast;

use crate::events::AlertEvent;

pub const DEFAULT_ALERT_BUFFER_SIZE: usize = 256;

/// In-process broadcast of confirmed donations to every connected overlay.
///
/// Cloning the bus is cheap, and every clone publishes to the same set of subscribers. A subscriber that falls more
/// than `capacity` events behind skips the oldest ones rather than slowing the publisher down.
#[derive(Clone, Debug)]
pub struct NotificationBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes the event to all current subscribers and returns how many there were. Never blocks.
    pub fn publish(&self, event: AlertEvent) -> usize {
        let id = event.id.clone();
        match self.sender.send(event) {
            Ok(n) => {
                debug!("📬️ Alert {id} sent to {n} overlay(s)");
                n
            },
            Err(_) => {
                info!("📬️ Alert {id} was not delivered. No overlays are connected.");
                0
            },
        }
    }

    /// A live feed of alerts published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        trace!("📬️ New alert subscriber");
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_BUFFER_SIZE)
    }
}
