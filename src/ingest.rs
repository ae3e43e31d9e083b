//! Log ingestion
//!
//! Turns rows of the form `id,time,b0,b1,...` into frame records. The id must
//! carry the `0x` tag, the time is decimal and the payload bytes are hex.
//! Rows that do not fit are rejected one by one; a bad row never stops the
//! ingestion of the rows after it.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::traits::FrameSource;

/// Prefix every frame identifier must start with
pub const ID_TAG: &str = "0x";
/// id, time and at least one payload byte
const MIN_FIELDS: usize = 3;

/// One well-formed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub identifier: String,
    pub timestamp: i64,
    pub values: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooFewFields(usize),
    BadTag(String),
    BadTimestamp(String),
    BadByte(String),
    Malformed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewFields(n) => write!(f, "only {} fields", n),
            RejectReason::BadTag(id) => write!(f, "identifier {:?} lacks {} tag", id, ID_TAG),
            RejectReason::BadTimestamp(t) => write!(f, "incorrect time {:?}", t),
            RejectReason::BadByte(b) => write!(f, "incorrect byte {:?}", b),
            RejectReason::Malformed(e) => write!(f, "malformed row: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted(FrameRecord),
    Rejected { line: u64, reason: RejectReason },
}

fn parse_byte(field: &str) -> Option<u8> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u8::from_str_radix(digits, 16).ok()
}

/// Parse the fields of one row
pub fn parse_fields<'a, I>(fields: I) -> std::result::Result<FrameRecord, RejectReason>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields: Vec<&str> = fields.into_iter().collect();
    if fields.len() < MIN_FIELDS {
        return Err(RejectReason::TooFewFields(fields.len()));
    }

    let identifier = fields[0];
    if !identifier.starts_with(ID_TAG) {
        return Err(RejectReason::BadTag(identifier.to_string()));
    }

    let timestamp = fields[1]
        .parse::<i64>()
        .map_err(|_| RejectReason::BadTimestamp(fields[1].to_string()))?;

    let values = fields[2..]
        .iter()
        .map(|f| parse_byte(f).ok_or_else(|| RejectReason::BadByte(f.to_string())))
        .collect::<std::result::Result<Vec<u8>, _>>()?;

    Ok(FrameRecord {
        identifier: identifier.to_string(),
        timestamp,
        values,
    })
}

/// Comma-separated frame log reader
pub struct CsvFrameSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: Read> CsvFrameSource<R> {
    pub fn from_reader(rdr: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        CsvFrameSource {
            reader,
            record: csv::StringRecord::new(),
        }
    }
}

impl CsvFrameSource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open log {}", path.display()))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> FrameSource for CsvFrameSource<R> {
    fn next_record(&mut self) -> Result<Option<RecordOutcome>> {
        let line = self.reader.position().line();
        match self.reader.read_record(&mut self.record) {
            Ok(false) => Ok(None),
            Ok(true) => {
                let line = self.record.position().map_or(line, |p| p.line());
                Ok(Some(match parse_fields(self.record.iter()) {
                    Ok(rec) => RecordOutcome::Accepted(rec),
                    Err(reason) => RecordOutcome::Rejected { line, reason },
                }))
            }
            Err(e) if e.is_io_error() => {
                Err(anyhow::Error::new(e).context("Failed to read frame log"))
            }
            Err(e) => Ok(Some(RecordOutcome::Rejected {
                line,
                reason: RejectReason::Malformed(e.to_string()),
            })),
        }
    }
}
