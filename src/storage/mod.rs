//! Storage is organized through [record_store::CsvRecordStore].
//! The basic idea is:
//!  - There is a directory with all the records.
//!  - Each local calendar day gets its own `YYYY-MM-DD.csv` file, appended to
//!    on every start/pause action.
//!  - Only the last line of a file is ever read back; it fully determines the
//!    recovered state.

pub mod entities;
pub mod history;
pub mod record_store;
