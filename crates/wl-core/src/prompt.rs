//! Seam for interactive input supplied from outside the core

use crate::error::{LedgerError, Result};
use std::collections::VecDeque;

/// Source of answers the user types in response to a question.
///
/// The terminal implementation lives in the binary; the core only asks.
pub trait Prompter {
    /// Ask for a secret; the answer must not be echoed
    fn password(&mut self, message: &str) -> Result<String>;

    /// Ask for a line of plain text
    fn input(&mut self, message: &str) -> Result<String>;
}

/// Prompter that replays canned answers in order.
///
/// Useful for non-interactive runs and tests. Every question asked is
/// recorded; running out of answers is a validation error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Create a prompter answering with `answers`, first to last
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| LedgerError::Validation(format!("no answer scripted for '{}'", message)))
    }
}

impl Prompter for ScriptedPrompter {
    fn password(&mut self, message: &str) -> Result<String> {
        self.next(message)
    }

    fn input(&mut self, message: &str) -> Result<String> {
        self.next(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompter_replays_in_order() {
        let mut prompter = ScriptedPrompter::new(["first", "second"]);
        assert_eq!(prompter.password("pw?").unwrap(), "first");
        assert_eq!(prompter.input("line?").unwrap(), "second");
        assert!(prompter.input("more?").is_err());
        assert_eq!(prompter.asked(), ["pw?", "line?", "more?"]);
        assert_eq!(prompter.remaining(), 0);
    }
}
