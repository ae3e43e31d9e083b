//! Analysis results and read-only queries
//!
//! `Analysis::run` consumes the frame store, so once correction has started no
//! further samples can be added. Each channel goes through the same sequence:
//! glitch correction in place, classification of the corrected values, and
//! interval detection for state-like channels.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::classify::{self, Activity, ChannelClass};
use crate::config::SystemConfig;
use crate::glitch::GlitchCorrector;
use crate::intervals::{self, ConstancyInterval};
use crate::store::FrameStore;

/// One corrected channel and everything derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAnalysis {
    values: Vec<u8>,
    corrections: usize,
    class: ChannelClass,
    activity: Activity,
    intervals: Vec<ConstancyInterval>,
}

impl ChannelAnalysis {
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Glitches repaired in this channel
    pub fn corrections(&self) -> usize {
        self.corrections
    }

    pub fn class(&self) -> ChannelClass {
        self.class
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Always empty for numeric channels
    pub fn intervals(&self) -> &[ConstancyInterval] {
        &self.intervals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamAnalysis {
    timestamps: Vec<i64>,
    channels: Vec<ChannelAnalysis>,
}

impl StreamAnalysis {
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn channels(&self) -> &[ChannelAnalysis] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelAnalysis> {
        self.channels.get(index)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub streams: usize,
    pub channels: usize,
    pub corrections: u64,
    pub numeric_channels: usize,
    pub state_like_channels: usize,
    pub intervals: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    streams: BTreeMap<String, StreamAnalysis>,
    summary: AnalysisSummary,
}

impl Analysis {
    pub fn run(store: FrameStore, config: &SystemConfig) -> Self {
        let mut corrector = GlitchCorrector::new();
        let mut summary = AnalysisSummary::default();
        let mut streams = BTreeMap::new();

        for (id, stream) in store.into_streams() {
            let (timestamps, raw_channels) = stream.into_parts();

            let channels: Vec<ChannelAnalysis> = raw_channels
                .into_iter()
                .map(|mut values| {
                    let corrections = corrector.correct(&mut values);
                    let class = classify::classify(&values, config.analysis.cardinality_threshold);
                    let intervals = match class {
                        ChannelClass::StateLike => {
                            intervals::detect_intervals(&values, config.analysis.min_run_length)
                        }
                        ChannelClass::Numeric => Vec::new(),
                    };
                    let activity = classify::activity(&values, config.activity.noise_threshold);
                    ChannelAnalysis {
                        values,
                        corrections,
                        class,
                        activity,
                        intervals,
                    }
                })
                .collect();

            for (b, ch) in channels.iter().enumerate() {
                debug!(
                    "[Analysis] {} byte {}: {:?}, {} corrections, {} intervals, {:?}",
                    id,
                    b,
                    ch.class,
                    ch.corrections,
                    ch.intervals.len(),
                    ch.activity
                );
                match ch.class {
                    ChannelClass::Numeric => summary.numeric_channels += 1,
                    ChannelClass::StateLike => summary.state_like_channels += 1,
                }
                summary.intervals += ch.intervals.len();
            }
            summary.channels += channels.len();

            streams.insert(
                id,
                StreamAnalysis {
                    timestamps,
                    channels,
                },
            );
        }

        summary.streams = streams.len();
        summary.corrections = corrector.corrections();

        let (scanned, samples, fixed, ratio) = corrector.stats();
        info!(
            "Errors fixed (bytes): {} of {} samples in {} channels ({:.3}%)",
            fixed, samples, scanned, ratio
        );
        info!(
            "Classified {} channels: {} numeric, {} state-like, {} constant intervals",
            summary.channels, summary.numeric_channels, summary.state_like_channels, summary.intervals
        );

        Analysis { streams, summary }
    }

    pub fn summary(&self) -> AnalysisSummary {
        self.summary
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    pub fn stream(&self, identifier: &str) -> Option<&StreamAnalysis> {
        self.streams.get(identifier)
    }

    pub fn streams(&self) -> impl Iterator<Item = (&str, &StreamAnalysis)> {
        self.streams.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Corrected values of one channel
    pub fn channel(&self, identifier: &str, index: usize) -> Option<&[u8]> {
        self.channel_analysis(identifier, index).map(ChannelAnalysis::values)
    }

    pub fn classification(&self, identifier: &str, index: usize) -> Option<ChannelClass> {
        self.channel_analysis(identifier, index).map(ChannelAnalysis::class)
    }

    pub fn intervals(&self, identifier: &str, index: usize) -> Option<&[ConstancyInterval]> {
        self.channel_analysis(identifier, index).map(ChannelAnalysis::intervals)
    }

    pub fn timestamps(&self, identifier: &str) -> Option<&[i64]> {
        self.stream(identifier).map(StreamAnalysis::timestamps)
    }

    fn channel_analysis(&self, identifier: &str, index: usize) -> Option<&ChannelAnalysis> {
        self.stream(identifier)?.channel(index)
    }
}
