//! Terminal prompts backed by dialoguer

use dialoguer::{Input, Password};

use wl_core::error::{LedgerError, Result};
use wl_core::prompt::Prompter;

/// Asks the user on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    /// Ask for a password for a new ledger, typed twice
    pub fn new_password(&mut self) -> Result<String> {
        Password::new()
            .with_prompt("Choose a password for the new ledger")
            .with_confirmation("Repeat password", "Passwords don't match")
            .interact()
            .map_err(prompt_error)
    }

    /// Ask for the hourly price of a new ledger
    pub fn hourly_price(&mut self, default: Option<f64>) -> Result<f64> {
        let mut input = Input::<f64>::new()
            .with_prompt("Hourly price")
            .validate_with(|price: &f64| {
                if price.is_finite() && *price >= 0.0 {
                    Ok(())
                } else {
                    Err("Price must be a non-negative number")
                }
            });
        if let Some(price) = default {
            input = input.default(price);
        }
        input.interact_text().map_err(prompt_error)
    }

    /// Ask for the currency label of a new ledger
    pub fn currency(&mut self, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt("Currency")
            .default(default.to_string())
            .interact_text()
            .map_err(prompt_error)
    }
}

impl Prompter for TerminalPrompter {
    fn password(&mut self, message: &str) -> Result<String> {
        Password::new()
            .with_prompt(message)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&mut self, message: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }
}

fn prompt_error(err: dialoguer::Error) -> LedgerError {
    let dialoguer::Error::IO(e) = err;
    LedgerError::Io(e).with_context("Prompt failed")
}
