//! wl-core - Core library for workledger
//!
//! This crate provides the core logic of the work hours tracker: the session
//! model and manager, the encrypted ledger codec, and the command dispatcher.

pub mod error;
pub mod types;
pub mod config;
pub mod session;
pub mod ledger;
pub mod codec;
pub mod command;
pub mod prompt;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use types::*;
