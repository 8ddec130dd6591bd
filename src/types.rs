//! Core data types shared by the store, the hub and both services.

use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ================================================================================================
// CHANNEL ID
// ================================================================================================

/// Opaque identifier of a telemetry channel (e.g. `prop.fuel`).
///
/// Any string is accepted; channels do not need to be declared anywhere
/// before they are queried or subscribed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        ChannelId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        ChannelId(id.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        ChannelId(id)
    }
}

// ================================================================================================
// SAMPLE
// ================================================================================================

/// Value carried by a sample: either numeric or textual (e.g. `"ON"`).
///
/// Whole numbers are written without a fraction (`77`, not `77.0`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Text(String),
}

/// 2^53, the largest magnitude below which every integer is exact in f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SampleValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            SampleValue::Number(n) => serializer.serialize_f64(*n),
            SampleValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl SampleValue {
    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Number(n) => Some(*n),
            SampleValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SampleValue::Number(_) => None,
            SampleValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Number(n) => write!(f, "{}", n),
            SampleValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(n: f64) -> Self {
        SampleValue::Number(n)
    }
}

impl From<&str> for SampleValue {
    fn from(s: &str) -> Self {
        SampleValue::Text(s.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(s: String) -> Self {
        SampleValue::Text(s)
    }
}

/// One timestamped observation of a channel.
///
/// Serialized as `{"timestamp": .., "value": .., "id": ..}` on both the
/// query endpoint and the realtime push channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since UNIX epoch
    pub timestamp: u64,
    pub value: SampleValue,
    pub id: ChannelId,
}

impl Sample {
    pub fn new(id: impl Into<ChannelId>, timestamp: u64, value: impl Into<SampleValue>) -> Self {
        Sample {
            timestamp,
            value: value.into(),
            id: id.into(),
        }
    }
}

// ================================================================================================
// TIME RANGE
// ================================================================================================

/// Exclusive time window `(start, end)` used by history queries.
///
/// Bounds are `f64` so that an unparseable bound can be carried as `NaN`:
/// every comparison against `NaN` is false, so such a window matches nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        TimeRange { start, end }
    }

    /// Window covering every representable timestamp.
    pub fn unbounded() -> Self {
        TimeRange {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    /// True when no timestamp can fall inside: `start >= end` or a `NaN` bound.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn is_empty(&self) -> bool {
        !(self.start < self.end)
    }

    /// Strict containment: `start < timestamp < end`.
    #[inline]
    pub fn contains(&self, timestamp: u64) -> bool {
        let ts = timestamp as f64;
        ts > self.start && ts < self.end
    }
}
