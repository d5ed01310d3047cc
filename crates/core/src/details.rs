//! Assertion detail decoding
//!
//! The text after ` - ` on an assertion line carries, in this order and all
//! optional: a free-form message, an `expected: '..', got: '..'` pair, a
//! `matcher: '..'` and a `source: at ..` location.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyed fields that may follow the message.
static KEYED_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:expected: '(?P<expected>.+)', got: '(?P<got>.+?)'(?:, )?)?",
        r"(?:matcher: '(?P<matcher>.+?)'(?:, )?)?",
        r"(?:source:\s+at\s+(?P<source>.+?))?$",
    ))
    .expect("details pattern is valid")
});

/// Where a keyed tail can start.
const TAIL_PREFIXES: [&str; 3] = ["expected: '", "matcher: '", "source:"];

/// Decoded assertion details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub message: Option<String>,
    pub expected: Option<String>,
    pub got: Option<String>,
    pub matcher: Option<String>,
    pub source: Option<String>,
}

impl Details {
    /// Decode the details blob of an assertion line.
    ///
    /// Text that cannot be split into a message and keyed fields is kept
    /// whole as the message.
    pub fn decode(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }

        // Keyed fields with no message
        if let Some(details) = Self::keyed(text) {
            return details;
        }

        // Shortest message whose remainder is a valid keyed tail. The end of
        // the text always qualifies, so this cannot fall through.
        for split in (1..=text.len()).filter(|&i| text.is_char_boundary(i)) {
            let rest = &text[split..];
            let rest = rest.strip_prefix(", ").unwrap_or(rest);
            if !rest.is_empty() && !TAIL_PREFIXES.iter().any(|p| rest.starts_with(p)) {
                continue;
            }
            if let Some(mut details) = Self::keyed(rest) {
                details.message = Some(text[..split].to_string());
                return details;
            }
        }

        Self::message_only(text)
    }

    /// Whether an expected/got pair was reported
    pub fn has_expectation(&self) -> bool {
        self.expected.is_some() && self.got.is_some()
    }

    fn keyed(text: &str) -> Option<Self> {
        let caps = KEYED_TAIL_RE.captures(text)?;
        let field = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        Some(Self {
            message: None,
            expected: field("expected"),
            got: field("got"),
            matcher: field("matcher"),
            source: field("source"),
        })
    }

    fn message_only(text: &str) -> Self {
        Self {
            message: Some(text.to_string()),
            ..Default::default()
        }
    }
}
