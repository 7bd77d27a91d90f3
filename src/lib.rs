//! Personal punch clock served over HTTP. Start and pause a work timer from
//! the browser, with every action appended to a daily CSV file. State is
//! recovered from the last line of today's file on each request, so the
//! service survives restarts without losing the running session.
//!

pub mod cli;
pub mod fs;
pub mod punch;
pub mod server;
pub mod storage;
pub mod utils;
