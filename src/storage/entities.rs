use anyhow::Result;
use chrono::{DateTime, FixedOffset};

use crate::utils::time::{format_hms, parse_hms};

/// The two actions a punch clock knows. Everything the service does is an
/// append of one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchAction {
    Start,
    Pause,
}

impl PunchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunchAction::Start => "start",
            PunchAction::Pause => "pause",
        }
    }

    fn from_record_field(value: &str) -> Option<Self> {
        match value {
            "start" => Some(PunchAction::Start),
            "pause" => Some(PunchAction::Pause),
            _ => None,
        }
    }
}

/// One persisted line of a daily record file:
/// `action,HH:MM:SS,RFC3339-timestamp`. The duration field carries the closed
/// worked seconds at the moment of the action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub action: PunchAction,
    pub total_worked: i64,
    pub timestamp: DateTime<FixedOffset>,
}

impl ActionRecord {
    /// Encodes the record as one CSV line, terminator included.
    pub fn to_csv_line(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record([
            self.action.as_str(),
            &format_hms(self.total_worked),
            &self.timestamp.to_rfc3339(),
        ])?;
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("finishing record line: {e}"))
    }

    /// Decodes a record line, substituting defaults for whatever does not
    /// parse: an unknown action reads as `pause`, unparsable duration
    /// components as zero, an unreadable timestamp as `now`. Returns the
    /// record and whether any substitution happened, so the caller can flag
    /// the tail as corrupt instead of failing recovery.
    pub fn parse_line(line: &str, now: DateTime<FixedOffset>) -> (ActionRecord, bool) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let fields = match reader.records().next() {
            Some(Ok(record)) => record,
            Some(Err(_)) | None => csv::StringRecord::new(),
        };

        let mut degraded = fields.len() != 3;

        let action = match fields.get(0).and_then(PunchAction::from_record_field) {
            Some(action) => action,
            None => {
                degraded = true;
                PunchAction::Pause
            }
        };

        let total_worked = match fields.get(1).and_then(parse_hms) {
            Some(parsed) => {
                degraded |= !parsed.exact;
                parsed.seconds
            }
            None => {
                degraded = true;
                0
            }
        };

        let timestamp = match fields.get(2).map(DateTime::parse_from_rfc3339) {
            Some(Ok(timestamp)) => timestamp,
            Some(Err(_)) | None => {
                degraded = true;
                now
            }
        };

        (
            ActionRecord {
                action,
                total_worked,
                timestamp,
            },
            degraded,
        )
    }
}
