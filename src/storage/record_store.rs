use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::{
    fs::operations::read_last_line,
    storage::{
        entities::ActionRecord,
        history::{day_totals, DayTotal},
    },
    utils::time::date_to_record_name,
};

/// What recovery finds at the end of a daily file. The last line fully
/// determines the reconstructed clock state; earlier history is never
/// replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Tail {
    /// No file for the day, or an empty one. Fresh state, not an error.
    None,
    /// The last line parsed cleanly.
    Intact(ActionRecord),
    /// The last line was damaged; the record carries partial defaults.
    Corrupt(ActionRecord),
}

impl Tail {
    pub fn record(&self) -> Option<&ActionRecord> {
        match self {
            Tail::None => None,
            Tail::Intact(record) | Tail::Corrupt(record) => Some(record),
        }
    }
}

/// Interface for abstracting storage of punch records, one file per calendar
/// day.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends one record to the file for `date`, creating it if absent. The
    /// file handle is locked, flushed and released within the call.
    async fn append(&self, date: NaiveDate, record: &ActionRecord) -> Result<()>;

    /// Reads the tail of the file for `date`. `now` substitutes an
    /// unreadable timestamp in a corrupt tail.
    async fn load_last(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> Result<Tail>;

    /// Summarizes every recorded day, newest first.
    async fn day_totals(&self) -> Result<Vec<DayTotal>>;
}

/// The main realization of [RecordStore], backed by `YYYY-MM-DD.csv` files in
/// a single directory.
pub struct CsvRecordStore {
    record_dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    fn record_path(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn append(&self, date: NaiveDate, record: &ActionRecord) -> Result<()> {
        let path = self.record_path(date);
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = append_locked(&mut file, record).await;
        file.unlock_async().await?;
        result
    }

    async fn load_last(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> Result<Tail> {
        let path = self.record_path(date);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No record file at {path:?}, starting fresh");
                return Ok(Tail::None);
            }
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let line = read_last_line(&mut file, &mut vec![0; 1024]).await;
        file.unlock_async().await?;

        let Some(line) = line? else {
            return Ok(Tail::None);
        };

        let (record, degraded) = ActionRecord::parse_line(&line, now);
        if degraded {
            // Might happen after a shutdown cutting off a write.
            warn!("Corrupt tail {line:?} in {path:?}, recovering with defaults");
            Ok(Tail::Corrupt(record))
        } else {
            Ok(Tail::Intact(record))
        }
    }

    async fn day_totals(&self) -> Result<Vec<DayTotal>> {
        day_totals(&self.record_dir).await
    }
}

async fn append_locked(file: &mut File, record: &ActionRecord) -> Result<()> {
    let line = record.to_csv_line()?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::DateTime;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    use crate::{
        storage::{
            entities::{ActionRecord, PunchAction},
            record_store::{CsvRecordStore, RecordStore, Tail},
        },
        utils::logging::TEST_LOGGING,
    };

    fn fixed_now() -> DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z").unwrap()
    }

    fn record(action: PunchAction, total_worked: i64, timestamp: &str) -> ActionRecord {
        ActionRecord {
            action,
            total_worked,
            timestamp: DateTime::parse_from_rfc3339(timestamp).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_then_load_last_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        let date = fixed_now().date_naive();

        let start = record(PunchAction::Start, 0, "2024-01-01T09:00:00Z");
        let pause = record(PunchAction::Pause, 300, "2024-01-01T09:05:00Z");
        store.append(date, &start).await?;
        store.append(date, &pause).await?;

        let tail = store.load_last(date, fixed_now()).await?;
        assert_eq!(tail, Tail::Intact(pause));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_last_missing_file_is_fresh_state() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;

        let tail = store.load_last(fixed_now().date_naive(), fixed_now()).await?;
        assert_eq!(tail, Tail::None);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_last_empty_file_is_fresh_state() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        let date = fixed_now().date_naive();
        tokio::fs::File::create(dir.path().join("2024-01-01.csv")).await?;

        let tail = store.load_last(date, fixed_now()).await?;
        assert_eq!(tail, Tail::None);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_last_only_reads_the_tail() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        let date = fixed_now().date_naive();

        // An earlier damaged line must not matter as long as the tail is
        // intact.
        let mut file = tokio::fs::File::create(dir.path().join("2024-01-01.csv")).await?;
        file.write_all(b"garbage that is not a record\n").await?;
        file.write_all(b"start,01:30:00,2024-01-01T09:00:00Z\n")
            .await?;
        file.flush().await?;

        let tail = store.load_last(date, fixed_now()).await?;
        assert_eq!(
            tail,
            Tail::Intact(record(PunchAction::Start, 5400, "2024-01-01T09:00:00Z"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_load_last_corrupt_tail_degrades() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        let date = fixed_now().date_naive();

        let mut file = tokio::fs::File::create(dir.path().join("2024-01-01.csv")).await?;
        file.write_all(b"start,00:30:00,2024-01-01T09:00:00Z\n")
            .await?;
        file.write_all(b"pause,01:0").await?;
        file.flush().await?;

        let tail = store.load_last(date, fixed_now()).await?;
        let Tail::Corrupt(recovered) = tail else {
            panic!("expected a corrupt tail, got {tail:?}");
        };
        assert_eq!(recovered.action, PunchAction::Pause);
        assert_eq!(recovered.total_worked, 0);
        assert_eq!(recovered.timestamp, fixed_now());
        Ok(())
    }

    #[tokio::test]
    async fn test_append_creates_file_lazily() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        let date = fixed_now().date_naive();
        assert!(!dir.path().join("2024-01-01.csv").exists());

        store
            .append(date, &record(PunchAction::Start, 0, "2024-01-01T09:00:00Z"))
            .await?;

        let content = tokio::fs::read_to_string(dir.path().join("2024-01-01.csv")).await?;
        assert_eq!(content, "start,00:00:00,2024-01-01T09:00:00+00:00\n");
        Ok(())
    }
}
