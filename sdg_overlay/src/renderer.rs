//! Alert renderers
//!
//! A renderer puts alerts on screen. The playback loop decides *when*; the renderer only decides *how*.
use std::io::Write;

use log::*;
use sdg_engine::{db_types::AlertSettings, events::AlertEvent};
use thiserror::Error;
use url::Url;

use crate::template::{Headline, Segment};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Could not write to the output. {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not load {kind} asset {url}. {reason}")]
    Asset { kind: &'static str, url: String, reason: String },
}

pub trait AlertRenderer {
    /// Puts an alert on screen. An error means the alert could not be shown at all.
    fn show(&mut self, alert: &AlertEvent, headline: &Headline, settings: &AlertSettings) -> Result<(), RenderError>;
    /// Starts the exit animation for the alert on screen.
    fn hide(&mut self, alert: &AlertEvent) -> Result<(), RenderError>;
    /// The exit animation is over and the screen is empty.
    fn clear(&mut self) -> Result<(), RenderError>;
}

/// Prints alerts as lines of text. Handy for checking a setup from a terminal, or for piping alerts into other tools.
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AlertRenderer for TerminalRenderer<W> {
    fn show(&mut self, alert: &AlertEvent, headline: &Headline, settings: &AlertSettings) -> Result<(), RenderError> {
        let image = asset("image", settings.image_url.as_deref())?;
        let sound = asset("sound", settings.sound_url.as_deref())?;
        let tag = if alert.is_test() { " [test]" } else { "" };
        let mut line = String::new();
        for segment in &headline.segments {
            match segment {
                Segment::Text(s) => line.push_str(s),
                Segment::Amount(a) => line.push_str(&format!("*{a}*")),
            }
        }
        writeln!(self.out, "🎉 {line}{tag}")?;
        if let Some(message) = alert.message.as_deref().filter(|m| !m.is_empty()) {
            writeln!(self.out, "   💬 {message}")?;
        }
        if let Some(url) = image {
            writeln!(self.out, "   🖼️ {url}")?;
        }
        if let Some(url) = sound {
            writeln!(self.out, "   🔊 {url}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn hide(&mut self, alert: &AlertEvent) -> Result<(), RenderError> {
        trace!("🖥️ Hiding alert {}", alert.id);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        writeln!(self.out, "---")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Blank asset URLs mean "no asset". Anything else must at least be a valid URL.
fn asset(kind: &'static str, url: Option<&str>) -> Result<Option<Url>, RenderError> {
    match url.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Url::parse(s)
            .map(Some)
            .map_err(|e| RenderError::Asset { kind, url: s.to_string(), reason: e.to_string() }),
    }
}
