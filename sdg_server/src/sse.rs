//! Server-sent event framing for the live alert stream.
//!
//! Each confirmed donation becomes one `new-donation` event whose data is the JSON-encoded [`AlertEvent`]. When
//! nothing happens for a while, a comment line is sent so that proxies keep the connection open.
use std::{convert::Infallible, future::ready, time::Duration};

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use log::*;
use sdg_engine::events::{AlertEvent, NEW_DONATION_EVENT};
use tokio::{
    sync::broadcast::{error::RecvError, Receiver},
    time::{interval_at, Instant, MissedTickBehavior},
};

/// Turns a bus subscription into an SSE byte stream. The stream ends when the bus is dropped.
pub fn alert_event_stream(
    receiver: Receiver<AlertEvent>,
    keep_alive: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let mut ticker = interval_at(Instant::now() + keep_alive, keep_alive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let events = stream::unfold((receiver, ticker), |(mut receiver, mut ticker)| async move {
        let frame = tokio::select! {
            received = receiver.recv() => match received {
                Ok(event) => {
                    ticker.reset();
                    event_frame(&event)
                },
                Err(RecvError::Lagged(n)) => {
                    warn!("📬️ An alert stream subscriber fell behind and skipped {n} alerts");
                    comment_frame(&format!("skipped {n} alerts"))
                },
                Err(RecvError::Closed) => {
                    debug!("📬️ Notification bus closed. Ending alert stream.");
                    return None;
                },
            },
            _ = ticker.tick() => comment_frame("keep-alive"),
        };
        Some((Ok(Bytes::from(frame)), (receiver, ticker)))
    });
    stream::once(ready(Ok(Bytes::from(comment_frame("connected"))))).chain(events)
}

pub fn event_frame(event: &AlertEvent) -> String {
    let data = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            error!("📬️ Could not serialize alert {}. {e}", event.id);
            return comment_frame("unserializable alert");
        },
    };
    format!("event: {NEW_DONATION_EVENT}\nid: {}\ndata: {data}\n\n", event.id)
}

pub fn comment_frame(text: &str) -> String {
    format!(": {text}\n\n")
}
