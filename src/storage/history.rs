use std::path::Path;

use anyhow::{bail, Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::Serialize;
use tokio::fs::File;
use tracing::warn;

use crate::{
    fs::operations::read_last_line,
    utils::time::{date_key_from_record_name, decimal_hours, parse_hms},
};

/// Total worked hours for one recorded day, derived from the file's last
/// record. Serialized straight into the `/history` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub date: String,
    pub hours: f64,
}

/// Scans `record_dir` (non-recursive) for daily record files and summarizes
/// each, newest first. A file whose tail cannot be read as a record is
/// logged and omitted without aborting the scan; a directory read failure
/// propagates.
pub async fn day_totals(record_dir: &Path) -> Result<Vec<DayTotal>> {
    let mut entries = tokio::fs::read_dir(record_dir)
        .await
        .with_context(|| format!("reading record directory {record_dir:?}"))?;

    let mut totals = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(date) = date_key_from_record_name(name) else {
            continue;
        };

        match day_total_from_file(&entry.path(), date).await {
            Ok(total) => totals.push(total),
            Err(e) => {
                warn!("Skipping record file {:?}: {e:?}", entry.path());
            }
        }
    }

    // `YYYY-MM-DD` keys sort in date order as plain strings.
    totals.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(totals)
}

async fn day_total_from_file(path: &Path, date: &str) -> Result<DayTotal> {
    let mut file = File::open(path).await?;
    file.lock_shared()?;
    let line = read_last_line(&mut file, &mut vec![0; 1024]).await;
    file.unlock_async().await?;

    // A day with a file but no records still shows up, at zero hours.
    let Some(line) = line? else {
        return Ok(DayTotal {
            date: date.to_owned(),
            hours: 0.0,
        });
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let fields = match reader.records().next() {
        Some(fields) => fields?,
        None => bail!("empty record line"),
    };
    if fields.len() != 3 {
        bail!("expected 3 fields, found {}: {line:?}", fields.len());
    }
    let Some(duration) = fields.get(1) else {
        bail!("record has no duration field: {line:?}");
    };
    let Some(parsed) = parse_hms(duration) else {
        bail!("invalid duration {duration:?}");
    };

    Ok(DayTotal {
        date: date.to_owned(),
        hours: decimal_hours(parsed.seconds),
    })
}
