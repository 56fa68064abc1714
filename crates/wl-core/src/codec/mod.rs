//! Ledger persistence codec
//!
//! Turns a [`Ledger`] into an encrypted blob and back:
//!
//! - encode: ledger → JSON payload → sealed envelope
//! - decode: envelope → authenticated plaintext → JSON payload → ledger
//!
//! Decoding never yields partially decrypted data: authentication failures
//! surface as [`LedgerError::Decryption`], malformed payloads as
//! [`LedgerError::Format`].

pub mod envelope;
mod retry;

pub use envelope::derive_key;
pub use retry::{decode_with_retry, RetryContext, MAX_PASSWORD_ATTEMPTS};

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, LedgerFile};
use crate::types;
use chrono::NaiveDateTime;
use tracing::debug;

/// Encode and encrypt a ledger, stamping `last_modified` with the current time
pub fn encode(ledger: &Ledger, password: &str) -> Result<Vec<u8>> {
    encode_at(ledger, password, types::now())
}

/// Encode and encrypt a ledger, stamping `last_modified` with `at`
pub fn encode_at(ledger: &Ledger, password: &str, at: NaiveDateTime) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(&ledger.to_file(at)?)?;
    debug!("Encoded ledger payload ({} bytes)", payload.len());
    envelope::seal(&payload, password)
}

/// Decrypt and decode a ledger
pub fn decode(blob: &[u8], password: &str) -> Result<Ledger> {
    let payload = envelope::open(blob, password)?;
    let file: LedgerFile = serde_json::from_slice(&payload)
        .map_err(|e| LedgerError::Format(format!("malformed ledger payload: {}", e)))?;
    Ledger::from_file(file)
}
