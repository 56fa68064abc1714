//! Session manager: lifecycle, grouping, aggregation and payment marking

use super::model::{Session, SessionRecord};
use crate::error::{LedgerError, Result};
use crate::types::{self, DateKey};
use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use tracing::{debug, info, warn};

/// Which dates an aggregate, listing or marking operation covers.
///
/// Built from zero, one or two date arguments. A range excludes both of
/// its endpoint dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Every date
    All,
    /// Exactly one date
    One(DateKey),
    /// Dates strictly between the two keys
    Range(DateKey, DateKey),
}

impl Selector {
    /// Build a selector from command arguments
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let parse = |s: &str| {
            s.parse::<DateKey>().map_err(|_| {
                LedgerError::Validation(format!("'{}' is not a date in DD/MM/YYYY format", s))
            })
        };
        match args {
            [] => Ok(Selector::All),
            [date] => Ok(Selector::One(parse(date)?)),
            [from, to] => Ok(Selector::Range(parse(from)?, parse(to)?)),
            _ => Err(LedgerError::Validation(
                "expected at most two dates".to_string(),
            )),
        }
    }

    /// Check if a date key is covered by this selector
    pub fn matches(&self, key: &DateKey) -> bool {
        match self {
            Selector::All => true,
            Selector::One(date) => key == date,
            Selector::Range(from, to) => key > from && key < to,
        }
    }
}

/// Unpaid hours and the earnings they represent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub hours: f64,
    pub earnings: f64,
}

/// Position of the running session inside the date map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveRef {
    date: DateKey,
    index: usize,
}

/// Owner of every recorded session, grouped by calendar date.
///
/// At most one session is running at a time; it lives in the date map like
/// any other session and is tracked by position.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: BTreeMap<DateKey, Vec<Session>>,
    active: Option<ActiveRef>,
}

impl SessionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session now
    pub fn start_session(&mut self) -> bool {
        self.start_session_at(types::now())
    }

    /// Start a new session at `at`; refused while another one is running
    pub fn start_session_at(&mut self, at: NaiveDateTime) -> bool {
        if self.active.is_some() {
            warn!("One session is currently active");
            return false;
        }

        let mut session = Session::new();
        session.start_at(at);
        let date = DateKey::of(&at);
        let list = self.sessions.entry(date).or_default();
        list.push(session);
        self.active = Some(ActiveRef {
            date,
            index: list.len() - 1,
        });
        true
    }

    /// Stop the running session now
    pub fn stop_session(&mut self) -> bool {
        self.stop_session_at(types::now())
    }

    /// Stop the running session at `at`
    pub fn stop_session_at(&mut self, at: NaiveDateTime) -> bool {
        let Some(active) = self.active.take() else {
            warn!("No session is started");
            return false;
        };
        if let Some(session) = self.get_mut(active) {
            session.stop_at(at);
        }
        true
    }

    /// The running session, if any
    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|a| self.sessions.get(&a.date)?.get(a.index))
    }

    /// Live elapsed time of the running session, `None` if nothing runs
    pub fn current_elapsed(&self) -> Result<Option<Duration>> {
        self.current_elapsed_at(types::now())
    }

    pub fn current_elapsed_at(&self, now: NaiveDateTime) -> Result<Option<Duration>> {
        self.active().map(|s| s.elapsed_at(now)).transpose()
    }

    /// Insert a completed session.
    ///
    /// Rejects missing timestamps, reversed intervals and a second session
    /// with the same start time on the same date.
    pub fn add_session(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        paid: bool,
    ) -> Result<DateKey> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(LedgerError::Validation(
                "Please specify start and end time".to_string(),
            ));
        };
        if end < start {
            return Err(LedgerError::InvalidInterval { start, end });
        }

        let session = Session::completed(start, end, paid);
        let date = session.date_key()?;
        let list = self.sessions.entry(date).or_default();
        if list.iter().any(|s| s.start == session.start) {
            return Err(LedgerError::Validation(
                "Session with same start time already exists".to_string(),
            ));
        }
        list.push(session);
        info!("Session added on {}", date);
        Ok(date)
    }

    /// Remove the sessions at `indices` (as listed) from one date.
    ///
    /// Out-of-range indices are ignored. The running session is never
    /// removed. Returns the removed sessions in their original order.
    pub fn remove_sessions(&mut self, date: &DateKey, indices: &BTreeSet<usize>) -> Vec<Session> {
        let Some(list) = self.sessions.get_mut(date) else {
            debug!("No sessions on {} to remove", date);
            return Vec::new();
        };

        let active_index = self
            .active
            .filter(|a| &a.date == date)
            .map(|a| a.index);

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(list.len());
        let mut new_active = None;
        for (i, session) in std::mem::take(list).into_iter().enumerate() {
            if Some(i) == active_index {
                if indices.contains(&i) {
                    warn!("Refusing to remove the running session");
                }
                new_active = Some(kept.len());
                kept.push(session);
            } else if indices.contains(&i) {
                removed.push(session);
            } else {
                kept.push(session);
            }
        }

        for i in indices.iter().filter(|&&i| i >= kept.len() + removed.len()) {
            debug!("Ignoring out-of-range session index {} on {}", i, date);
        }

        if kept.is_empty() {
            self.sessions.remove(date);
        } else {
            *list = kept;
        }
        if let (Some(active), Some(index)) = (self.active.as_mut(), new_active) {
            active.index = index;
        }

        info!("Removed {} session(s) on {}", removed.len(), date);
        removed
    }

    /// Sum hours and earnings over unpaid sessions covered by `selector`
    pub fn totals(&self, selector: &Selector, hourly_price: f64) -> Result<Totals> {
        self.totals_at(selector, hourly_price, types::now())
    }

    pub fn totals_at(
        &self,
        selector: &Selector,
        hourly_price: f64,
        now: NaiveDateTime,
    ) -> Result<Totals> {
        let mut totals = Totals::default();
        for (_, sessions) in self.select(selector) {
            for session in sessions.iter().filter(|s| !s.paid) {
                let hours = session.hours_at(now)?;
                totals.hours += hours;
                totals.earnings += hours * hourly_price;
            }
        }
        Ok(totals)
    }

    /// Date groups covered by `selector`, in chronological order
    pub fn select<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = (&'a DateKey, &'a [Session])> + 'a {
        self.sessions
            .iter()
            .filter(move |(date, _)| selector.matches(date))
            .map(|(date, list)| (date, list.as_slice()))
    }

    /// Human-readable listing of the sessions covered by `selector`
    pub fn render(&self, selector: &Selector) -> String {
        if let Selector::One(date) = selector {
            if !self.sessions.contains_key(date) {
                return "No sessions are registered at that date".to_string();
            }
        }

        let mut out = String::new();
        for (date, sessions) in self.select(selector) {
            let _ = writeln!(out, "Date: {}", date);
            for session in sessions {
                let _ = writeln!(
                    out,
                    " |---{} , {}",
                    session.timerange(),
                    if session.paid { "Paid" } else { "Unpaid" }
                );
            }
        }
        out
    }

    /// Indexed listing of one date, as used for removal
    pub fn render_indexed(&self, date: &DateKey) -> Option<String> {
        let sessions = self.sessions.get(date)?;
        let mut out = String::new();
        for (i, session) in sessions.iter().enumerate() {
            let _ = writeln!(out, "    {} -> {}", i, session.timerange());
        }
        Some(out)
    }

    /// Set the paid flag on every session covered by `selector`.
    ///
    /// Returns the number of sessions touched, already-matching ones included.
    pub fn set_paid(&mut self, selector: &Selector, paid: bool) -> usize {
        let mut count = 0;
        for (_, sessions) in self
            .sessions
            .iter_mut()
            .filter(|(date, _)| selector.matches(date))
        {
            for session in sessions.iter_mut() {
                session.paid = paid;
                count += 1;
            }
        }
        info!(
            "Marked {} session(s) as {}",
            count,
            if paid { "paid" } else { "unpaid" }
        );
        count
    }

    pub fn mark_paid(&mut self, selector: &Selector) -> usize {
        self.set_paid(selector, true)
    }

    pub fn mark_unpaid(&mut self, selector: &Selector) -> usize {
        self.set_paid(selector, false)
    }

    /// Sessions recorded on one date
    pub fn sessions_on(&self, date: &DateKey) -> Option<&[Session]> {
        self.sessions.get(date).map(Vec::as_slice)
    }

    /// All date groups in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[Session])> {
        self.sessions.iter().map(|(d, l)| (d, l.as_slice()))
    }

    /// Total number of sessions
    pub fn count(&self) -> usize {
        self.sessions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Encode every session, grouped by date
    pub fn to_records(&self) -> Result<BTreeMap<DateKey, Vec<SessionRecord>>> {
        self.sessions
            .iter()
            .map(|(date, list)| -> Result<(DateKey, Vec<SessionRecord>)> {
                let records = list.iter().map(Session::to_record).collect::<Result<_>>()?;
                Ok((*date, records))
            })
            .collect()
    }

    /// Rebuild a manager from persisted records.
    ///
    /// Order within each date is preserved. A record filed under a date other
    /// than its start date, or a second running session, is a format error.
    pub fn from_records(records: BTreeMap<DateKey, Vec<SessionRecord>>) -> Result<Self> {
        let mut manager = Self::new();
        for (date, list) in records {
            if list.is_empty() {
                continue;
            }
            let mut sessions = Vec::with_capacity(list.len());
            for record in &list {
                let session = Session::from_record(record)?;
                if session.date_key()? != date {
                    return Err(LedgerError::Format(format!(
                        "session starting {} filed under {}",
                        record.start_time, date
                    )));
                }
                if session.is_running() {
                    if manager.active.is_some() {
                        return Err(LedgerError::Format(
                            "more than one running session".to_string(),
                        ));
                    }
                    manager.active = Some(ActiveRef {
                        date,
                        index: sessions.len(),
                    });
                }
                sessions.push(session);
            }
            manager.sessions.insert(date, sessions);
        }
        Ok(manager)
    }

    fn get_mut(&mut self, at: ActiveRef) -> Option<&mut Session> {
        self.sessions.get_mut(&at.date)?.get_mut(at.index)
    }
}
