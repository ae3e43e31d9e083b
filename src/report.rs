use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analysis::{Analysis, AnalysisSummary};
use crate::classify::{Activity, ChannelClass};
use crate::intervals::ConstancyInterval;

/// Export snapshot of one frame identifier
///
/// This struct carries everything a plotting or reporting layer needs:
/// - the shared timestamp axis
/// - the corrected values of every byte
/// - the class, activity and constancy intervals of every byte
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Frame identifier as it appeared in the log ("0x204")
    pub identifier: String,

    /// Sample timestamps (milliseconds by convention)
    pub timestamps: Vec<i64>,

    pub channels: Vec<ChannelReport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChannelReport {
    /// Byte position within the payload
    pub index: usize,

    /// Values after glitch correction
    pub values: Vec<u8>,

    pub corrections: usize,

    pub class: ChannelClass,

    pub activity: Activity,

    /// Empty for numeric channels
    pub intervals: Vec<ConstancyInterval>,
}

/// Top-level export document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Report {
    pub streams: usize,
    pub channels: usize,
    pub corrections: u64,
    pub numeric_channels: usize,
    pub state_like_channels: usize,
    pub intervals: usize,
    pub frames: Vec<FrameReport>,
}

impl From<AnalysisSummary> for Report {
    fn from(s: AnalysisSummary) -> Self {
        Report {
            streams: s.streams,
            channels: s.channels,
            corrections: s.corrections,
            numeric_channels: s.numeric_channels,
            state_like_channels: s.state_like_channels,
            intervals: s.intervals,
            frames: Vec::new(),
        }
    }
}

/// Snapshot the analysis, one entry per identifier in identifier order
pub fn build(analysis: &Analysis) -> Report {
    let mut report = Report::from(analysis.summary());
    report.frames = analysis
        .streams()
        .map(|(id, stream)| FrameReport {
            identifier: id.to_string(),
            timestamps: stream.timestamps().to_vec(),
            channels: stream
                .channels()
                .iter()
                .enumerate()
                .map(|(index, ch)| ChannelReport {
                    index,
                    values: ch.values().to_vec(),
                    corrections: ch.corrections(),
                    class: ch.class(),
                    activity: ch.activity(),
                    intervals: ch.intervals().to_vec(),
                })
                .collect(),
        })
        .collect();
    report
}

/// Interval count per byte, e.g. "[ 2, 0, 1 ]"
pub fn interval_counts(frame: &FrameReport) -> String {
    let counts: Vec<String> = frame
        .channels
        .iter()
        .map(|c| c.intervals.len().to_string())
        .collect();
    format!("[ {} ]", counts.join(", "))
}

pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writer.flush().context("Failed to flush report")?;
    Ok(())
}
