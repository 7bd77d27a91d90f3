use chrono::NaiveDate;

/// This is the standard way of naming a daily record file in timepunch.
pub fn date_to_record_name(date: NaiveDate) -> String {
    format!("{}.csv", date.format("%Y-%m-%d"))
}

/// Returns the `YYYY-MM-DD` key when `name` looks like a daily record file.
/// Anything else (directories, logs, stray files) yields `None`.
pub fn date_key_from_record_name(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".csv")?;
    let bytes = stem.as_bytes();
    if bytes.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' {
        Some(stem)
    } else {
        None
    }
}

/// Formats worked seconds as `HH:MM:SS`. Hours are not wrapped at 24, a long
/// stretch stays readable as `123:00:05`.
pub fn format_hms(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHms {
    pub seconds: i64,
    /// False when any component had to be substituted with zero.
    pub exact: bool,
}

/// Converts an `HH:MM:SS` string back into seconds. The string must split
/// into exactly three parts; a component that fails to parse counts as zero
/// instead of rejecting the whole value.
pub fn parse_hms(value: &str) -> Option<ParsedHms> {
    let parts = value.split(':').collect::<Vec<_>>();
    if parts.len() != 3 {
        return None;
    }

    let mut seconds = 0i64;
    let mut exact = true;
    for (part, scale) in parts.into_iter().zip([3600, 60, 1]) {
        match part.parse::<i64>() {
            Ok(v) => seconds += v * scale,
            Err(_) => exact = false,
        }
    }
    Some(ParsedHms { seconds, exact })
}

/// Decimal hours rounded to one decimal place, the unit used by the history
/// listing.
pub fn decimal_hours(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 10.0).round() / 10.0
}
