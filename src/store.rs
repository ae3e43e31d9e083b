//! Frame Store
//!
//! Groups samples by frame identifier. Every identifier owns one timestamp
//! sequence and one value sequence per payload byte, all of the same length.
//! A sample whose payload width differs from the first sample seen for that
//! identifier is a damaged frame and is dropped.

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::analysis::Analysis;
use crate::config::SystemConfig;
use crate::ingest::RecordOutcome;
use crate::traits::FrameSource;

/// History of one frame identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStream {
    timestamps: Vec<i64>,
    channels: Vec<Vec<u8>>,
}

impl FrameStream {
    fn with_first(timestamp: i64, values: &[u8]) -> Self {
        FrameStream {
            timestamps: vec![timestamp],
            channels: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn channel(&self, index: usize) -> Option<&[u8]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub(crate) fn into_parts(self) -> (Vec<i64>, Vec<Vec<u8>>) {
        (self.timestamps, self.channels)
    }
}

/// Result of offering one sample to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored; true if this sample created the stream
    Accepted { created: bool },
    /// Payload width does not match the stream ("frame damaged")
    Damaged { expected: usize, found: usize },
}

/// Ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_accepted: u64,
    pub rows_rejected: u64,
    pub frames_damaged: u64,
}

impl IngestStats {
    fn merge(&mut self, other: &IngestStats) {
        self.rows_accepted += other.rows_accepted;
        self.rows_rejected += other.rows_rejected;
        self.frames_damaged += other.frames_damaged;
    }
}

/// Owned registry of frame streams, keyed by identifier
#[derive(Debug, Default)]
pub struct FrameStore {
    streams: BTreeMap<String, FrameStream>,
    stats: IngestStats,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample to the stream of `identifier`
    pub fn add_sample(&mut self, identifier: &str, timestamp: i64, values: &[u8]) -> AddOutcome {
        let Some(stream) = self.streams.get_mut(identifier) else {
            self.streams
                .insert(identifier.to_string(), FrameStream::with_first(timestamp, values));
            return AddOutcome::Accepted { created: true };
        };

        if values.len() != stream.channels.len() {
            debug!(
                "[Store] {} frame damaged: {} bytes, expected {}",
                identifier,
                values.len(),
                stream.channels.len()
            );
            return AddOutcome::Damaged {
                expected: stream.channels.len(),
                found: values.len(),
            };
        }

        stream.timestamps.push(timestamp);
        for (channel, &v) in stream.channels.iter_mut().zip(values) {
            channel.push(v);
        }
        AddOutcome::Accepted { created: false }
    }

    /// Drain a source into the store. Rejected rows and damaged frames are
    /// logged and counted; only a failing reader aborts.
    pub fn ingest<S: FrameSource>(&mut self, source: &mut S) -> Result<IngestStats> {
        let mut run = IngestStats::default();

        while let Some(outcome) = source.next_record()? {
            match outcome {
                RecordOutcome::Accepted(rec) => {
                    match self.add_sample(&rec.identifier, rec.timestamp, &rec.values) {
                        AddOutcome::Accepted { .. } => run.rows_accepted += 1,
                        AddOutcome::Damaged { .. } => run.frames_damaged += 1,
                    }
                }
                RecordOutcome::Rejected { line, reason } => {
                    warn!("Skip row {}: {}", line, reason);
                    run.rows_rejected += 1;
                }
            }
        }

        info!(
            "Log parsed: {} rows accepted, {} rejected, {} damaged frames, {} identifiers",
            run.rows_accepted,
            run.rows_rejected,
            run.frames_damaged,
            self.streams.len()
        );
        self.stats.merge(&run);
        Ok(run)
    }

    pub fn stream(&self, identifier: &str) -> Option<&FrameStream> {
        self.streams.get(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Cumulative ingestion counters
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Finish ingestion and run correction, classification and interval
    /// detection over every channel.
    pub fn analyze(self, config: &SystemConfig) -> Analysis {
        Analysis::run(self, config)
    }

    pub(crate) fn into_streams(self) -> BTreeMap<String, FrameStream> {
        self.streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{FrameRecord, RejectReason};
    use crate::traits::MockFrameSource;

    fn check_aligned(store: &FrameStore) {
        for id in store.identifiers() {
            let s = store.stream(id).expect("stream");
            for i in 0..s.channel_count() {
                assert_eq!(s.channel(i).expect("channel").len(), s.len());
            }
        }
    }

    #[test]
    fn test_first_sample_creates_stream() {
        let mut store = FrameStore::new();
        assert_eq!(
            store.add_sample("0x202", 100, &[1, 2, 3]),
            AddOutcome::Accepted { created: true }
        );
        let s = store.stream("0x202").expect("stream");
        assert_eq!(s.len(), 1);
        assert_eq!(s.channel_count(), 3);
        assert_eq!(s.timestamps(), &[100]);
        assert_eq!(s.channel(2), Some(&[3u8][..]));
        assert_eq!(s.channel(3), None);
    }

    #[test]
    fn test_matching_arity_appends() {
        let mut store = FrameStore::new();
        store.add_sample("0x202", 100, &[1, 2]);
        assert_eq!(
            store.add_sample("0x202", 110, &[3, 4]),
            AddOutcome::Accepted { created: false }
        );
        let s = store.stream("0x202").expect("stream");
        assert_eq!(s.timestamps(), &[100, 110]);
        assert_eq!(s.channel(0), Some(&[1u8, 3][..]));
        assert_eq!(s.channel(1), Some(&[2u8, 4][..]));
        check_aligned(&store);
    }

    #[test]
    fn test_arity_mismatch_leaves_stream_unchanged() {
        let mut store = FrameStore::new();
        store.add_sample("0x202", 100, &[1, 2]);
        store.add_sample("0x202", 110, &[3, 4]);
        let before = store.stream("0x202").cloned();

        assert_eq!(
            store.add_sample("0x202", 120, &[5, 6, 7]),
            AddOutcome::Damaged { expected: 2, found: 3 }
        );
        assert_eq!(
            store.add_sample("0x202", 130, &[]),
            AddOutcome::Damaged { expected: 2, found: 0 }
        );
        assert_eq!(store.stream("0x202").cloned(), before);
        check_aligned(&store);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let mut store = FrameStore::new();
        store.add_sample("0x204", 1, &[1]);
        store.add_sample("0x202", 2, &[1, 2, 3, 4]);
        store.add_sample("0x204", 3, &[2]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.identifiers().collect::<Vec<_>>(), vec!["0x202", "0x204"]);
        assert_eq!(store.stream("0x204").expect("stream").len(), 2);
        assert_eq!(store.stream("0x202").expect("stream").len(), 1);
    }

    #[test]
    fn test_ingest_counts_outcomes() {
        let mut records = vec![
            RecordOutcome::Accepted(FrameRecord {
                identifier: "0x100".to_string(),
                timestamp: 1,
                values: vec![1, 2],
            }),
            RecordOutcome::Rejected {
                line: 2,
                reason: RejectReason::BadTimestamp("x".to_string()),
            },
            RecordOutcome::Accepted(FrameRecord {
                identifier: "0x100".to_string(),
                timestamp: 2,
                values: vec![1],
            }),
            RecordOutcome::Accepted(FrameRecord {
                identifier: "0x100".to_string(),
                timestamp: 3,
                values: vec![3, 4],
            }),
        ]
        .into_iter();

        let mut source = MockFrameSource::new();
        source
            .expect_next_record()
            .times(5)
            .returning(move || Ok(records.next()));

        let mut store = FrameStore::new();
        let stats = store.ingest(&mut source).expect("ingest failed");
        assert_eq!(
            stats,
            IngestStats { rows_accepted: 2, rows_rejected: 1, frames_damaged: 1 }
        );
        assert_eq!(store.stats(), stats);
        assert_eq!(store.stream("0x100").expect("stream").timestamps(), &[1, 3]);
    }

    #[test]
    fn test_ingest_propagates_reader_failure() {
        let mut source = MockFrameSource::new();
        source
            .expect_next_record()
            .returning(|| Err(anyhow::anyhow!("disk gone")));

        let mut store = FrameStore::new();
        assert!(store.ingest(&mut source).is_err());
        assert!(store.is_empty());
    }
}
