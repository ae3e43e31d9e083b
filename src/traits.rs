use anyhow::Result;

use crate::ingest::RecordOutcome;

#[cfg_attr(test, mockall::automock)]
pub trait FrameSource {
    /// Read the next record. Returns Ok(Some(outcome)) for every row, accepted
    /// or rejected, and Ok(None) once the source is exhausted.
    /// Err is reserved for failures of the underlying reader.
    fn next_record(&mut self) -> Result<Option<RecordOutcome>>;
}
