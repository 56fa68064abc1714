//! Ledger controller
//!
//! Owns the open ledger, its store and password, and exposes one handler per
//! command. Handlers are bound to command names in [`LedgerController::ROUTES`].

use chrono::Duration;
use std::collections::BTreeSet;
use tracing::{error, info, warn};

use wl_core::codec::RetryContext;
use wl_core::command::{Command, Dispatcher, RouteTable};
use wl_core::error::{LedgerError, Result};
use wl_core::prompt::Prompter;
use wl_core::session::Selector;
use wl_core::types::{self, DateKey};
use wl_core::Ledger;
use wl_storage::LedgerStore;

/// An open ledger plus everything needed to persist it
pub struct LedgerController {
    ledger: Ledger,
    store: LedgerStore,
    name: String,
    password: String,
    prompter: Box<dyn Prompter>,
    decimals: usize,
}

impl LedgerController {
    /// Command bindings of this handler object
    pub const ROUTES: RouteTable<LedgerController> = &[
        (Command::Save, LedgerController::cmd_save),
        (Command::Load, LedgerController::cmd_load),
        (Command::Start, LedgerController::cmd_start),
        (Command::Stop, LedgerController::cmd_stop),
        (Command::Ttime, LedgerController::cmd_ttime),
        (Command::Calc, LedgerController::cmd_calc),
        (Command::AddSession, LedgerController::cmd_add_session),
        (Command::PrintSessions, LedgerController::cmd_print_sessions),
        (Command::ClearSessions, LedgerController::cmd_clear_sessions),
        (Command::ChangeHourlyPrice, LedgerController::cmd_change_h_price),
        (Command::MarkPaid, LedgerController::cmd_mark_paid),
        (Command::MarkUnpaid, LedgerController::cmd_mark_unpaid),
        (Command::Ims, LedgerController::cmd_ims),
    ];

    pub fn new(
        ledger: Ledger,
        store: LedgerStore,
        name: impl Into<String>,
        password: impl Into<String>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            ledger,
            store,
            name: name.into(),
            password: password.into(),
            prompter,
            decimals: 2,
        }
    }

    /// Set the number of decimals used for printed hours and earnings
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Dispatcher bound to this controller's routes
    pub fn dispatcher() -> Dispatcher<LedgerController> {
        Dispatcher::builder().table(Self::ROUTES).build()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Best-effort final save before the process exits.
    ///
    /// A running session is stopped first. Failures are logged, not retried.
    pub fn shutdown(&mut self) -> bool {
        if self.ledger.sessions.stop_session() {
            self.ledger.mark_dirty();
        }
        if !self.ledger.is_dirty() {
            return true;
        }
        match self.store.save(&self.name, &mut self.ledger, &self.password) {
            Ok(()) => true,
            Err(e) => {
                error!("Final save failed: {}", e);
                false
            }
        }
    }

    fn cmd_save(&mut self, _args: &[&str]) -> Result<String> {
        self.store.save(&self.name, &mut self.ledger, &self.password)?;
        Ok(format!("Ledger '{}' saved", self.name))
    }

    fn cmd_load(&mut self, _args: &[&str]) -> Result<String> {
        if self.ledger.is_dirty() {
            warn!("Discarding unsaved changes of '{}'", self.name);
        }
        let mut retry = RetryContext::password_attempts();
        let (ledger, password) = self.store.load(
            &self.name,
            self.password.clone(),
            &mut retry,
            self.prompter.as_mut(),
        )?;
        self.ledger = ledger;
        self.password = password;
        Ok("Loaded ledger from file".to_string())
    }

    fn cmd_start(&mut self, _args: &[&str]) -> Result<String> {
        if !self.ledger.sessions.start_session() {
            return Ok("One session is currently active".to_string());
        }
        self.ledger.mark_dirty();
        Ok("Session started!".to_string())
    }

    fn cmd_stop(&mut self, _args: &[&str]) -> Result<String> {
        if !self.ledger.sessions.stop_session() {
            return Ok("No session is started".to_string());
        }
        self.ledger.mark_dirty();
        Ok("Session stopped!".to_string())
    }

    fn cmd_ttime(&mut self, _args: &[&str]) -> Result<String> {
        Ok(match self.ledger.sessions.current_elapsed()? {
            Some(elapsed) => format_duration(elapsed),
            None => "No session is running at a time".to_string(),
        })
    }

    fn cmd_calc(&mut self, args: &[&str]) -> Result<String> {
        let selector = Selector::from_args(args)?;
        let totals = self
            .ledger
            .sessions
            .totals(&selector, self.ledger.hourly_price)?;
        Ok(format!(
            "You worked {:.*} hours, and earned {:.*} {}",
            self.decimals, totals.hours, self.decimals, totals.earnings, self.ledger.currency
        ))
    }

    fn cmd_add_session(&mut self, args: &[&str]) -> Result<String> {
        if args.len() > 3 {
            return Err(LedgerError::Validation(
                "usage: add_session <start> <end> <paid>".to_string(),
            ));
        }
        let parse = |s: &&str| {
            types::parse_user_timestamp(s).map_err(|_| {
                LedgerError::Validation(format!(
                    "'{}' is not a time in DD/MM/YYYY-HH:MM:SS format",
                    s
                ))
            })
        };
        let start = args.first().map(parse).transpose()?;
        let end = args.get(1).map(parse).transpose()?;
        let paid = match args.get(2).copied() {
            Some("false") => false,
            Some("true") => true,
            None => {
                return Err(LedgerError::Validation(
                    "usage: add_session <start> <end> <paid>".to_string(),
                ))
            }
            Some(other) => {
                return Err(LedgerError::Validation(format!(
                    "paid must be 'true' or 'false', got '{}'",
                    other
                )))
            }
        };

        self.ledger.sessions.add_session(start, end, paid)?;
        self.ledger.mark_dirty();
        Ok("Session added successfully!".to_string())
    }

    fn cmd_print_sessions(&mut self, args: &[&str]) -> Result<String> {
        let selector = Selector::from_args(args)?;
        let listing = self.ledger.sessions.render(&selector);
        if listing.is_empty() {
            return Ok("No sessions recorded".to_string());
        }
        Ok(listing.trim_end().to_string())
    }

    fn cmd_clear_sessions(&mut self, args: &[&str]) -> Result<String> {
        let [date] = args else {
            return Err(LedgerError::Validation(
                "usage: clear_sessions <DD/MM/YYYY>".to_string(),
            ));
        };
        let date: DateKey = date.parse().map_err(|_| {
            LedgerError::Validation(format!("'{}' is not a date in DD/MM/YYYY format", date))
        })?;
        let Some(listing) = self.ledger.sessions.render_indexed(&date) else {
            return Ok("No sessions are registered at that date".to_string());
        };

        let answer = self.prompter.input(&format!(
            "Here are sessions for this date:\n{}Enter , separated numbers of sessions",
            listing
        ))?;
        let indices = parse_indices(&answer)?;
        let removed = self.ledger.sessions.remove_sessions(&date, &indices);
        if !removed.is_empty() {
            self.ledger.mark_dirty();
        }
        Ok(format!("Removed {} session(s)", removed.len()))
    }

    fn cmd_change_h_price(&mut self, args: &[&str]) -> Result<String> {
        let price = args
            .first()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| {
                LedgerError::Validation("Price must be a number".to_string())
            })?;
        self.ledger.set_hourly_price(price)?;
        info!("Hourly price changed to {}", price);
        Ok(format!(
            "Hourly price changed to {} {}",
            self.ledger.hourly_price, self.ledger.currency
        ))
    }

    fn cmd_mark_paid(&mut self, args: &[&str]) -> Result<String> {
        self.mark(args, true)
    }

    fn cmd_mark_unpaid(&mut self, args: &[&str]) -> Result<String> {
        self.mark(args, false)
    }

    fn mark(&mut self, args: &[&str], paid: bool) -> Result<String> {
        let selector = Selector::from_args(args)?;
        let touched = self.ledger.sessions.set_paid(&selector, paid);
        if touched == 0 {
            if let Selector::One(_) = selector {
                return Ok("No sessions are registered at that date".to_string());
            }
        } else {
            self.ledger.mark_dirty();
        }
        Ok(format!(
            "Sessions marked as {}",
            if paid { "paid" } else { "unpaid" }
        ))
    }

    fn cmd_ims(&mut self, _args: &[&str]) -> Result<String> {
        let lines: Vec<String> = self
            .ledger
            .sessions
            .iter()
            .map(|(date, sessions)| {
                let rendered: Vec<String> = sessions.iter().map(|s| s.to_string()).collect();
                format!("{}===[{}]", date, rendered.join(", "))
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

/// Parse a comma separated list of session indices
fn parse_indices(answer: &str) -> Result<BTreeSet<usize>> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| LedgerError::Validation(format!("'{}' is not a session number", s)))
        })
        .collect()
}

/// Render a duration as `H:MM:SS`
fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
