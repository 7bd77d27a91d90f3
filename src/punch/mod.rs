//! The start/pause state machine. Transitions are pure: they take the
//! current time and return the record to persist, which keeps the machine
//! testable without any file I/O and keeps each request's state explicit
//! instead of hidden in a process-wide singleton.

use chrono::{DateTime, FixedOffset};

use crate::storage::{
    entities::{ActionRecord, PunchAction},
    record_store::Tail,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Idle,
    Running { since: DateTime<FixedOffset> },
}

/// In-memory clock state, reconstructed from the day's tail record on each
/// use. `total_worked` counts closed sessions only; the open session's time
/// is derived on demand and folded in by `pause`.
#[derive(Debug, Clone, PartialEq)]
pub struct PunchClock {
    session: Session,
    total_worked: i64,
}

/// Read-only view served by `/status`. Closed and live seconds are reported
/// separately; the display layer adds them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStatus {
    pub is_running: bool,
    pub total_seconds: i64,
    pub elapsed_seconds: i64,
}

impl PunchClock {
    pub fn fresh() -> Self {
        Self {
            session: Session::Idle,
            total_worked: 0,
        }
    }

    /// Reconstructs the clock from the day's tail. A `start` tail means the
    /// session is still open, with `since` taken from the record's timestamp
    /// so downtime while the process was stopped counts toward the live
    /// session. A `pause` tail, a corrupt tail's defaults, or no tail at all
    /// mean an idle clock at the recorded total.
    pub fn recover(tail: &Tail) -> Self {
        let Some(record) = tail.record() else {
            return Self::fresh();
        };

        let session = match record.action {
            PunchAction::Start => Session::Running {
                since: record.timestamp,
            },
            PunchAction::Pause => Session::Idle,
        };
        Self {
            session,
            total_worked: record.total_worked,
        }
    }

    /// Opens a session and returns the `start` record to persist, carrying
    /// the unchanged total. A no-op returning `None` while already running.
    pub fn start(&mut self, now: DateTime<FixedOffset>) -> Option<ActionRecord> {
        match self.session {
            Session::Running { .. } => None,
            Session::Idle => {
                self.session = Session::Running { since: now };
                Some(ActionRecord {
                    action: PunchAction::Start,
                    total_worked: self.total_worked,
                    timestamp: now,
                })
            }
        }
    }

    /// Closes the open session, folds its duration into the total, and
    /// returns the `pause` record carrying the new total. A no-op returning
    /// `None` while idle.
    pub fn pause(&mut self, now: DateTime<FixedOffset>) -> Option<ActionRecord> {
        match self.session {
            Session::Idle => None,
            Session::Running { since } => {
                self.total_worked += now.signed_duration_since(since).num_seconds();
                self.session = Session::Idle;
                Some(ActionRecord {
                    action: PunchAction::Pause,
                    total_worked: self.total_worked,
                    timestamp: now,
                })
            }
        }
    }

    pub fn status(&self, now: DateTime<FixedOffset>) -> ClockStatus {
        let elapsed_seconds = match self.session {
            Session::Running { since } => now.signed_duration_since(since).num_seconds(),
            Session::Idle => 0,
        };
        ClockStatus {
            is_running: self.is_running(),
            total_seconds: self.total_worked,
            elapsed_seconds,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.session, Session::Running { .. })
    }

    pub fn total_worked(&self) -> i64 {
        self.total_worked
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset};

    use crate::{
        punch::PunchClock,
        storage::{
            entities::{ActionRecord, PunchAction},
            record_store::Tail,
        },
    };

    fn at(timestamp: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(timestamp).unwrap()
    }

    #[test]
    fn test_start_opens_a_session_and_emits_unchanged_total() {
        let mut clock = PunchClock::fresh();
        let record = clock.start(at("2024-01-01T09:00:00Z")).unwrap();

        assert_eq!(record.action, PunchAction::Start);
        assert_eq!(record.total_worked, 0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_start_twice_is_an_idempotent_noop() {
        let mut clock = PunchClock::fresh();
        let started = at("2024-01-01T09:00:00Z");
        clock.start(started).unwrap();

        assert_eq!(clock.start(at("2024-01-01T09:10:00Z")), None);
        // The original start time still drives elapsed time.
        let status = clock.status(at("2024-01-01T09:20:00Z"));
        assert_eq!(status.elapsed_seconds, 20 * 60);
    }

    #[test]
    fn test_pause_folds_elapsed_into_total_and_emits_new_total() {
        let mut clock = PunchClock::fresh();
        clock.start(at("2024-01-01T09:00:00Z")).unwrap();
        let record = clock.pause(at("2024-01-01T09:05:00Z")).unwrap();

        assert_eq!(record.action, PunchAction::Pause);
        assert_eq!(record.total_worked, 300);
        assert!(!clock.is_running());
        assert_eq!(clock.total_worked(), 300);
    }

    #[test]
    fn test_pause_while_idle_is_a_noop() {
        let mut clock = PunchClock::fresh();
        assert_eq!(clock.pause(at("2024-01-01T09:00:00Z")), None);
        assert_eq!(clock.total_worked(), 0);
    }

    #[test]
    fn test_total_accumulates_over_closed_sessions() {
        let mut clock = PunchClock::fresh();
        let t = at("2024-01-01T09:00:00Z");

        clock.start(t).unwrap();
        clock.pause(t + Duration::minutes(30)).unwrap();
        clock.start(t + Duration::hours(1)).unwrap();
        clock.pause(t + Duration::hours(1) + Duration::minutes(45)).unwrap();

        assert_eq!(clock.total_worked(), (30 + 45) * 60);
    }

    #[test]
    fn test_status_reports_closed_and_live_time_separately() {
        let mut clock = PunchClock::fresh();
        let t = at("2024-01-01T09:00:00Z");
        clock.start(t).unwrap();
        clock.pause(t + Duration::minutes(10)).unwrap();
        clock.start(t + Duration::minutes(20)).unwrap();

        let status = clock.status(t + Duration::minutes(25));
        assert!(status.is_running);
        assert_eq!(status.total_seconds, 600);
        assert_eq!(status.elapsed_seconds, 300);
    }

    #[test]
    fn test_recover_from_start_tail_counts_downtime_as_live_session() {
        let tail = Tail::Intact(ActionRecord {
            action: PunchAction::Start,
            total_worked: 5400,
            timestamp: at("2024-01-01T09:00:00Z"),
        });

        let clock = PunchClock::recover(&tail);
        let status = clock.status(at("2024-01-01T09:05:00Z"));

        assert!(status.is_running);
        assert_eq!(status.total_seconds, 5400);
        assert_eq!(status.elapsed_seconds, 300);
    }

    #[test]
    fn test_recover_from_pause_tail_is_idle_at_recorded_total() {
        let tail = Tail::Intact(ActionRecord {
            action: PunchAction::Pause,
            total_worked: 7200,
            timestamp: at("2024-01-01T17:00:00Z"),
        });

        let clock = PunchClock::recover(&tail);
        let status = clock.status(at("2024-01-01T18:00:00Z"));

        assert!(!status.is_running);
        assert_eq!(status.total_seconds, 7200);
        assert_eq!(status.elapsed_seconds, 0);
    }

    #[test]
    fn test_recover_from_no_tail_is_fresh() {
        let clock = PunchClock::recover(&Tail::None);
        assert_eq!(clock, PunchClock::fresh());
    }

    #[test]
    fn test_recover_from_corrupt_tail_uses_partial_defaults() {
        let tail = Tail::Corrupt(ActionRecord {
            action: PunchAction::Pause,
            total_worked: 0,
            timestamp: at("2024-01-01T12:00:00Z"),
        });

        let clock = PunchClock::recover(&tail);
        assert!(!clock.is_running());
        assert_eq!(clock.total_worked(), 0);
    }

    #[test]
    fn test_recover_handles_mixed_timezone_offsets() {
        // A record stamped in one offset recovers correctly against a clock
        // reporting another.
        let tail = Tail::Intact(ActionRecord {
            action: PunchAction::Start,
            total_worked: 0,
            timestamp: at("2024-01-01T09:00:00+02:00"),
        });

        let clock = PunchClock::recover(&tail);
        let status = clock.status(at("2024-01-01T08:00:00+00:00"));
        assert_eq!(status.elapsed_seconds, 3600);
    }
}
