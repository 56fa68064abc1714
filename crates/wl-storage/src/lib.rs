//! wl-storage - Storage library for workledger
//!
//! This crate provides the file system store for encrypted ledgers.

mod ledger_store;

pub use ledger_store::LedgerStore;
