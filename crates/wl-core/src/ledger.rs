//! Ledger (account) state and its persisted payload

use crate::error::{LedgerError, Result};
use crate::session::{SessionManager, SessionRecord};
use crate::types::{self, DateKey};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a ledger file holds: pricing, currency and all sessions
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Price charged per hour of unpaid work
    pub hourly_price: f64,
    /// Currency label printed next to earnings
    pub currency: String,
    /// When the ledger was last encoded
    pub last_modified: NaiveDateTime,
    /// Recorded sessions
    pub sessions: SessionManager,
    dirty: bool,
}

impl Ledger {
    /// Create a fresh ledger with no sessions
    pub fn new(hourly_price: f64, currency: impl Into<String>) -> Self {
        Self {
            hourly_price,
            currency: currency.into(),
            last_modified: types::now(),
            sessions: SessionManager::new(),
            dirty: true,
        }
    }

    /// Whether there are changes not yet written to disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that in-memory state diverged from the file
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Record that in-memory state matches the file
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Change the hourly price; negative and non-finite prices are rejected
    pub fn set_hourly_price(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(LedgerError::Validation(
                "Price must be a non-negative number".to_string(),
            ));
        }
        self.hourly_price = price;
        self.dirty = true;
        Ok(())
    }

    /// Build the persisted payload, stamping `last_modified` with `at`
    pub fn to_file(&self, at: NaiveDateTime) -> Result<LedgerFile> {
        Ok(LedgerFile {
            last_modified: types::format_timestamp(&at),
            hourly_price: self.hourly_price,
            currency: self.currency.clone(),
            sessions: self.sessions.to_records()?,
        })
    }

    /// Rebuild a ledger from its persisted payload
    pub fn from_file(file: LedgerFile) -> Result<Self> {
        let last_modified = types::parse_timestamp(&file.last_modified).map_err(|e| {
            LedgerError::Format(format!(
                "invalid last_modified '{}': {}",
                file.last_modified, e
            ))
        })?;
        if !file.hourly_price.is_finite() {
            return Err(LedgerError::Format(format!(
                "invalid hourly_price {}",
                file.hourly_price
            )));
        }
        Ok(Self {
            hourly_price: file.hourly_price,
            currency: file.currency,
            last_modified,
            sessions: SessionManager::from_records(file.sessions)?,
            dirty: false,
        })
    }
}

/// Decrypted payload of a ledger file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerFile {
    pub last_modified: String,
    pub hourly_price: f64,
    pub currency: String,
    pub sessions: BTreeMap<DateKey, Vec<SessionRecord>>,
}
