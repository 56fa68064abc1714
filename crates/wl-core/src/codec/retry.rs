//! Password retry policy for decoding

use super::decode;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::prompt::Prompter;
use tracing::warn;

/// Total password attempts allowed when opening a ledger
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// Attempts budget for one load, owned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    max: u32,
    used: u32,
}

impl RetryContext {
    /// Create a budget of `max` attempts
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// The standard budget of [`MAX_PASSWORD_ATTEMPTS`]
    pub fn password_attempts() -> Self {
        Self::new(MAX_PASSWORD_ATTEMPTS)
    }

    /// Attempts made so far
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Attempts left
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    fn record_attempt(&mut self) {
        self.used += 1;
    }
}

impl Default for RetryContext {
    fn default() -> Self {
        Self::password_attempts()
    }
}

/// Decode `blob`, asking for another password after each failed attempt.
///
/// Returns the ledger together with the password that opened it. Once the
/// budget is spent the result is [`LedgerError::PasswordAttemptsExhausted`]
/// and no further decode is attempted. Errors other than
/// [`LedgerError::Decryption`] are returned immediately.
pub fn decode_with_retry(
    blob: &[u8],
    password: String,
    retry: &mut RetryContext,
    prompter: &mut dyn Prompter,
) -> Result<(Ledger, String)> {
    let mut password = password;
    loop {
        retry.record_attempt();
        match decode(blob, &password) {
            Ok(ledger) => return Ok((ledger, password)),
            Err(LedgerError::Decryption) if retry.remaining() > 0 => {
                warn!("Decryption failed, {} attempt(s) left", retry.remaining());
                password = prompter.password(&format!(
                    "Wrong password or corrupted file. Please type password again, you can do it {} more times",
                    retry.remaining()
                ))?;
            }
            Err(LedgerError::Decryption) => {
                return Err(LedgerError::PasswordAttemptsExhausted {
                    attempts: retry.used(),
                })
            }
            Err(e) => return Err(e),
        }
    }
}
