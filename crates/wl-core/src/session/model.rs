//! Session data models

use crate::error::{LedgerError, Result};
use crate::types::{self, DateKey, DATETIME_FORMAT, TIME_FORMAT};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// A single timed work interval with a paid flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// When the session was started
    pub start: Option<NaiveDateTime>,
    /// When the session was stopped
    pub end: Option<NaiveDateTime>,
    /// Whether this session has been paid for
    pub paid: bool,
}

impl Session {
    /// Create a new, unstarted session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a completed session from explicit timestamps.
    ///
    /// `end < start` is accepted here and surfaces as
    /// [`LedgerError::InvalidInterval`] when the duration is read.
    pub fn completed(start: NaiveDateTime, end: NaiveDateTime, paid: bool) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            paid,
        }
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Whether the session is started but not yet stopped
    pub fn is_running(&self) -> bool {
        self.is_started() && !self.is_finished()
    }

    /// Start the session now
    pub fn start(&mut self) {
        self.start_at(types::now());
    }

    /// Start the session at the given time; no-op if already started
    pub fn start_at(&mut self, at: NaiveDateTime) {
        if self.is_started() {
            warn!("Trying to start already started session");
            return;
        }
        self.start = Some(at);
        info!("Session started at {}", at.format(DATETIME_FORMAT));
    }

    /// Stop the session now
    pub fn stop(&mut self) {
        self.stop_at(types::now());
    }

    /// Stop the session at the given time; no-op unless running
    pub fn stop_at(&mut self, at: NaiveDateTime) {
        if !self.is_started() {
            warn!("Trying to stop a session that was never started");
            return;
        }
        if self.is_finished() {
            warn!("Trying to stop already stopped session");
            return;
        }
        self.end = Some(at);
        info!("Session stopped at {}", at.format(DATETIME_FORMAT));
    }

    /// Duration of the session, live if it is still running
    pub fn elapsed(&self) -> Result<Duration> {
        self.elapsed_at(types::now())
    }

    /// Duration of the session, measuring a running session up to `now`
    pub fn elapsed_at(&self, now: NaiveDateTime) -> Result<Duration> {
        let start = self.start.ok_or(LedgerError::NotStarted)?;
        match self.end {
            Some(end) if end < start => Err(LedgerError::InvalidInterval { start, end }),
            Some(end) => Ok(end - start),
            None => Ok(now - start),
        }
    }

    /// Elapsed time in fractional hours
    pub fn hours(&self) -> Result<f64> {
        self.hours_at(types::now())
    }

    pub fn hours_at(&self, now: NaiveDateTime) -> Result<f64> {
        Ok(self.elapsed_at(now)?.num_seconds() as f64 / 3600.0)
    }

    /// Calendar date key derived from the start time
    pub fn date_key(&self) -> Result<DateKey> {
        self.start
            .as_ref()
            .map(DateKey::of)
            .ok_or(LedgerError::NotStarted)
    }

    /// Render as `HH:MM:SS - HH:MM:SS`, flagging a stop on a later day
    pub fn timerange(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let next_day = if end.date() > start.date() {
                    "Next day : "
                } else {
                    ""
                };
                format!(
                    "{} - {}{}",
                    start.format(TIME_FORMAT),
                    next_day,
                    end.format(TIME_FORMAT)
                )
            }
            _ => "Unfinished session".to_string(),
        }
    }

    /// Encode to the persisted record form
    pub fn to_record(&self) -> Result<SessionRecord> {
        let start = self.start.ok_or(LedgerError::NotStarted)?;
        Ok(SessionRecord {
            start_time: types::format_timestamp(&start),
            end_time: self.end.as_ref().map(types::format_timestamp),
            paid: self.paid.to_string(),
        })
    }

    /// Decode from the persisted record form
    pub fn from_record(record: &SessionRecord) -> Result<Self> {
        let start = parse_persisted(&record.start_time, "start_time")?;
        let end = record
            .end_time
            .as_deref()
            .map(|s| parse_persisted(s, "end_time"))
            .transpose()?;
        let paid = match record.paid.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(LedgerError::Format(format!(
                    "paid must be \"true\" or \"false\", got '{}'",
                    other
                )))
            }
        };
        Ok(Self {
            start: Some(start),
            end,
            paid,
        })
    }
}

fn parse_persisted(value: &str, field: &str) -> Result<NaiveDateTime> {
    types::parse_timestamp(value)
        .map_err(|e| LedgerError::Format(format!("invalid {} '{}': {}", field, value, e)))
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start
            .map(|s| types::format_timestamp(&s))
            .unwrap_or_else(|| "Unstarted".to_string());
        let end = self
            .end
            .map(|e| types::format_timestamp(&e))
            .unwrap_or_else(|| "Unfinished".to_string());
        write!(f, "Session(START: {}, END: {})", start, end)
    }
}

/// Persisted form of a session.
///
/// `end_time` must be present in the payload; `null` marks the running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_time: String,
    #[serde(deserialize_with = "Option::deserialize")]
    pub end_time: Option<String>,
    pub paid: String,
}
