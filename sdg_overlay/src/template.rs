//! Headline templates
//!
//! The streamer writes a template such as `{name} 贊助了 ${amount}`. The first `{name}` is replaced by the donor's
//! name, and every `{amount}` by the amount. The amount is kept as a separate segment so that renderers can style it.
use std::fmt::Display;

use sdg_engine::db_types::{DonationAmount, DEFAULT_MESSAGE_TEMPLATE};

pub const NAME_PLACEHOLDER: &str = "{name}";
pub const AMOUNT_PLACEHOLDER: &str = "{amount}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Amount(DonationAmount),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub segments: Vec<Segment>,
}

impl Display for Headline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(s) => write!(f, "{s}")?,
                Segment::Amount(a) => write!(f, "{a}")?,
            }
        }
        Ok(())
    }
}

/// Fills in `template`. A blank template falls back to the default one.
///
/// The template is split on `{amount}` before the name goes in, so a donor called `{amount}` stays `{amount}`.
pub fn render_headline(template: &str, donor_name: &str, amount: DonationAmount) -> Headline {
    let template = if template.trim().is_empty() { DEFAULT_MESSAGE_TEMPLATE } else { template };
    let mut name_placed = false;
    let mut segments = Vec::new();
    for (i, part) in template.split(AMOUNT_PLACEHOLDER).enumerate() {
        if i > 0 {
            segments.push(Segment::Amount(amount));
        }
        let text = if !name_placed && part.contains(NAME_PLACEHOLDER) {
            name_placed = true;
            part.replacen(NAME_PLACEHOLDER, donor_name, 1)
        } else {
            part.to_string()
        };
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
    }
    Headline { segments }
}
