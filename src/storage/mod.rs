//! In-memory history storage.
//!
//! One append-only log per channel, kept in timestamp order:
//! - **Append**: O(1) amortized, single writer (the tick driver)
//! - **Query**: binary search on each requested channel, concurrent readers
//! - **Retention**: unbounded by default, optional FIFO cap per channel

pub mod history;
pub mod types;

pub use history::HistoryStore;
pub use types::{HistoryConfig, HistoryStats};
