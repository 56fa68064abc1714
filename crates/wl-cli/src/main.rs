//! workledger - work hours tracker
//!
//! Start and stop work sessions, mark them paid, compute earnings, and keep
//! everything in a password-encrypted ledger file.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create or open a ledger and enter the command loop
//! workledger open work
//!
//! # List existing ledgers
//! workledger list
//! ```

mod commands;
mod controller;
mod repl;
mod terminal;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
