//! Constancy interval detection
//!
//! Compresses a state-like channel into the spans during which its value did
//! not change. Spans that are too short to be a real state are dropped, not
//! merged, so consumers must expect gaps between intervals.

use serde::{Deserialize, Serialize};

/// Runs whose boundary distance is below this are dropped
pub const DEFAULT_MIN_RUN_LENGTH: usize = 10;

/// Index span `[start, end]` (both inclusive) holding one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstancyInterval {
    pub start: usize,
    pub end: usize,
    pub value: u8,
}

impl ConstancyInterval {
    /// Number of samples covered
    pub fn samples(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// Scan adjacent pairs and emit the runs of constant value.
///
/// A boundary is declared at `i` whenever `channel[i] != channel[i + 1]`, and
/// unconditionally at the last comparable index so the trailing run is always
/// evaluated. A run is emitted when `i - run_start >= min_run_length`.
pub fn detect_intervals(channel: &[u8], min_run_length: usize) -> Vec<ConstancyInterval> {
    let mut out = Vec::new();
    if channel.len() < 2 {
        return out;
    }

    let last = channel.len() - 2;
    let mut run_start = 0;
    for i in 0..=last {
        if channel[i] != channel[i + 1] || i == last {
            if i - run_start >= min_run_length {
                out.push(ConstancyInterval {
                    start: run_start,
                    end: i,
                    value: channel[run_start],
                });
            }
            run_start = i + 1;
        }
    }
    out
}
