//! Session management module
//!
//! This module provides the work session model and the manager that owns
//! every recorded session.
//!
//! # Overview
//!
//! A session is one timed work interval:
//! - A start time, set when the session is started
//! - An end time, set when it is stopped
//! - A paid flag
//!
//! The manager groups sessions by calendar date, keeps at most one session
//! running, and computes unpaid hours and earnings over a [`Selector`].
//!
//! # Example
//!
//! ```ignore
//! use wl_core::session::{SessionManager, Selector};
//!
//! let mut manager = SessionManager::new();
//! manager.start_session();
//! // ... later
//! manager.stop_session();
//!
//! let totals = manager.totals(&Selector::All, 25.0)?;
//! println!("{} hours, {} earned", totals.hours, totals.earnings);
//! ```

mod manager;
mod model;

// Re-export public API
pub use manager::{Selector, SessionManager, Totals};
pub use model::{Session, SessionRecord};
