//! Storage configuration and statistics.
//!
//! Shared by the history store and the health endpoint.

/// Configuration for the history store.
#[derive(Clone, Debug, Default)]
pub struct HistoryConfig {
    /// Maximum samples retained per channel. `None` keeps everything;
    /// `Some(n)` evicts the oldest samples (front of the log) beyond `n`.
    pub retention: Option<usize>,
}

impl HistoryConfig {
    /// Unbounded retention.
    pub fn unbounded() -> Self {
        Self { retention: None }
    }

    /// Per-channel FIFO cap of `max_samples`.
    pub fn capped(max_samples: usize) -> Self {
        Self {
            retention: Some(max_samples),
        }
    }
}

/// Statistics about history usage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Number of channels with a log
    pub channels: usize,
    /// Samples currently retained across all channels
    pub samples: usize,
    /// Samples appended since startup
    pub appended: u64,
    /// Samples evicted by the retention cap
    pub evicted: u64,
}
