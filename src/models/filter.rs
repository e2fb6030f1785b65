use serde::{Deserialize, Serialize};

/// Progress of a running memory filter. `None` whenever no drain is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterProgress {
    pub current: u64,
    pub total: u64,
}

/// One round of the server-side memory filter queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterBatch {
    pub processed: u64,
    pub filtered_count: u64,
    pub done: bool,
}

/// Totals of a completed memory filter run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct FilterSummary {
    pub total: u64,
    pub processed: u64,
    pub filtered: u64,
    pub batches: u32,
}
