//! Destinations for results: checkpoints during a run and the final write.

use crate::core::error::Result;
use crate::core::models::ContactResult;

use std::collections::BTreeMap;

/// Receives results as a run progresses.
///
/// `persist` is called with every result completed so far, first at each
/// checkpoint with `complete == false`, then once at the end with `true`.
/// Implementations upsert by `ContactResult::row`, so repeated calls with
/// growing sets are safe.
pub trait ResultSink: Send {
    /// Called once per completed contact, before any checkpoint that includes it.
    fn record(&mut self, _result: &ContactResult) {}

    fn persist(&mut self, results: &[ContactResult], complete: bool) -> Result<()>;
}

/// Keeps the latest persisted results in memory, ordered by row.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: BTreeMap<usize, ContactResult>,
    checkpoints: usize,
    complete: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted results in input order.
    pub fn results(&self) -> Vec<ContactResult> {
        self.rows.values().cloned().collect()
    }

    /// Number of partial (non-final) persists seen.
    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

impl ResultSink for MemorySink {
    fn persist(&mut self, results: &[ContactResult], complete: bool) -> Result<()> {
        for result in results {
            self.rows.insert(result.row, result.clone());
        }
        if complete {
            self.complete = true;
        } else {
            self.checkpoints += 1;
        }
        Ok(())
    }
}
