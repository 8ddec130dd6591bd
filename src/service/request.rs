//! History request parsing and execution.
//!
//! A request names a comma-separated channel list and two numeric bounds.
//! Bounds are coerced, not validated: a bound that does not parse becomes
//! NaN, every comparison against NaN is false, and the request returns no
//! samples. A missing bound behaves the same way. An empty bound counts as 0.
//!
//! Coercion follows the usual numeric-cast rules for strings:
//! - surrounding whitespace is ignored
//! - decimal literals with an optional sign, fraction and exponent
//! - `Infinity`, `+Infinity`, `-Infinity` (exact spelling)
//! - unsigned `0x`, `0o`, `0b` integer literals
//!
//! Everything else, including `inf`, `nan` and `1_000`, is NaN.

use crate::storage::HistoryStore;
use crate::types::{ChannelId, Sample, TimeRange};

/// Parsed history query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    /// Channels in the order requested (duplicates kept)
    pub ids: Vec<ChannelId>,
    pub range: TimeRange,
}

impl HistoryRequest {
    pub fn new(ids: Vec<ChannelId>, range: TimeRange) -> Self {
        Self { ids, range }
    }

    /// Build a request from the raw path segment and query values.
    pub fn parse(ids: &str, start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            ids: parse_channel_list(ids),
            range: TimeRange::new(parse_bound(start), parse_bound(end)),
        }
    }

    /// Run the request against `store`.
    ///
    /// Samples come back grouped by channel in request order, each group in
    /// timestamp order. Unknown channels contribute nothing.
    pub fn execute(&self, store: &HistoryStore) -> Vec<Sample> {
        store.query(&self.ids, self.range)
    }
}

/// Split a comma-separated channel list. Empty segments are skipped.
pub fn parse_channel_list(raw: &str) -> Vec<ChannelId> {
    raw.split(',')
        .filter(|id| !id.is_empty())
        .map(ChannelId::from)
        .collect()
}

/// Numeric coercion for a time bound.
pub fn parse_bound(raw: Option<&str>) -> f64 {
    match raw {
        None => f64::NAN,
        Some(value) => coerce_number(value),
    }
}

fn coerce_number(raw: &str) -> f64 {
    let text = raw.trim();
    match text {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(value) = radix_literal(text) {
        return value;
    }

    // f64::from_str also takes inf/infinity/nan spellings
    if text
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// `0x..`, `0o..`, `0b..`; `None` when `text` has no radix prefix.
fn radix_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let value = digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(value.unwrap_or(f64::NAN))
}
