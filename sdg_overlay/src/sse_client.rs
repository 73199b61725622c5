//! A minimal server-sent events decoder, enough to follow the donation server's alert stream.
use futures::{Stream, StreamExt};
use log::*;
use sdg_engine::events::{AlertEvent, NEW_DONATION_EVENT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Turns arbitrary chunks of an SSE body into complete frames.
///
/// Frames that carry neither an event name nor data (keep-alive comments, for instance) are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);
        // A chunk boundary may fall inside a multi-byte character. Keep the incomplete tail for next time.
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                warn!("📡️ Alert stream contains invalid UTF-8. {e}");
                self.pending.clear();
                return Vec::new();
            },
        };
        let text = String::from_utf8_lossy(&self.pending[..valid]).replace('\r', "");
        self.pending.drain(..valid);
        self.buffer.push_str(&text);

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block = self.buffer[..end].to_string();
            self.buffer.drain(..end + 2);
            if let Some(frame) = parse_block(&block) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data = Vec::new();
    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => frame.event = Some(value.to_string()),
            "id" => frame.id = Some(value.to_string()),
            "data" => data.push(value),
            _ => trace!("📡️ Ignoring SSE field {field}"),
        }
    }
    if frame.event.is_none() && data.is_empty() {
        return None;
    }
    frame.data = data.join("\n");
    Some(frame)
}

/// Decodes an SSE body into alerts. Frames for other events, or with unreadable data, are skipped with a warning.
///
/// A transport error is passed on and ends the stream.
pub fn alert_events<S, B, E>(body: S) -> impl Stream<Item = anyhow::Result<AlertEvent>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = (Box::pin(body), SseDecoder::new(), std::collections::VecDeque::<AlertEvent>::new(), false);
    futures::stream::unfold(state, |(mut body, mut decoder, mut ready, done)| async move {
        if done {
            return None;
        }
        loop {
            if let Some(alert) = ready.pop_front() {
                return Some((Ok(alert), (body, decoder, ready, false)));
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.push(chunk.as_ref()).into_iter().filter_map(to_alert)),
                Some(Err(e)) => return Some((Err(anyhow::Error::new(e)), (body, decoder, ready, true))),
                None => return None,
            }
        }
    })
}

fn to_alert(frame: SseFrame) -> Option<AlertEvent> {
    if frame.event.as_deref() != Some(NEW_DONATION_EVENT) {
        debug!("📡️ Ignoring {:?} event", frame.event);
        return None;
    }
    match serde_json::from_str::<AlertEvent>(&frame.data) {
        Ok(alert) => Some(alert),
        Err(e) => {
            warn!("📡️ Could not read alert {:?}. {e}. Data: {}", frame.id, frame.data);
            None
        },
    }
}
