use chrono::{DateTime, FixedOffset, Local, NaiveDate};

/// Represents an entity responsible for providing the wall-clock time across
/// the application. This can allow it to be used for testing.
///
/// Times carry the local offset so that persisted timestamps keep it and so
/// that daily files roll over at local midnight.
pub trait Clock: Sync + Send {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
