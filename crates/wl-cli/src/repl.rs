//! Interactive input loop

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, info};

use crate::controller::LedgerController;
use wl_core::command::Dispatcher;

const PROMPT: &str = "--> ";

/// What the loop does after a line has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Handle one input line.
///
/// Replies and recoverable errors are printed; a fatal error is returned so
/// the process can terminate without saving.
pub fn handle_line(
    dispatcher: &Dispatcher<LedgerController>,
    controller: &mut LedgerController,
    line: &str,
) -> Result<Flow> {
    let trimmed = line.trim();
    if trimmed == "exit" || trimmed == "quit" {
        return Ok(Flow::Exit);
    }

    match dispatcher.dispatch(controller, trimmed) {
        Ok(Some(reply)) if !reply.is_empty() => println!("{}", reply),
        Ok(_) => {}
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => eprintln!("{} {}", "✗".red(), e),
    }
    Ok(Flow::Continue)
}

/// Run the input loop until exit, then perform the final save
pub fn run(mut controller: LedgerController) -> Result<()> {
    let dispatcher = LedgerController::dispatcher();
    let mut rl = DefaultEditor::new()?;

    println!(
        "{}",
        "Type a command, or 'exit' to save and leave.".bright_black()
    );

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                if handle_line(&dispatcher, &mut controller, &line)? == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                info!("Interrupted, shutting down");
                break;
            }
            Err(ReadlineError::Eof) => {
                info!("End of input, shutting down");
                break;
            }
            Err(err) => {
                error!("Input error: {}", err);
                finish(&mut controller);
                return Err(err.into());
            }
        }
    }

    finish(&mut controller);
    Ok(())
}

fn finish(controller: &mut LedgerController) {
    if controller.shutdown() {
        println!("{}", "Bye bye".bright_green());
    } else {
        eprintln!("{} Changes could not be saved", "✗".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wl_core::prompt::ScriptedPrompter;
    use wl_core::{Ledger, LedgerError};
    use wl_storage::LedgerStore;

    fn controller_with(temp: &TempDir, answers: &[&str]) -> LedgerController {
        let store = LedgerStore::new(temp.path(), "wlg").unwrap();
        LedgerController::new(
            Ledger::new(10.0, "EUR"),
            store,
            "work",
            "pw",
            Box::new(ScriptedPrompter::new(answers.iter().copied())),
        )
    }

    fn controller(temp: &TempDir) -> LedgerController {
        controller_with(temp, &[])
    }

    #[test]
    fn test_exit_words() {
        let temp = TempDir::new().unwrap();
        let mut controller = controller(&temp);
        let dispatcher = LedgerController::dispatcher();

        assert_eq!(
            handle_line(&dispatcher, &mut controller, " quit ").unwrap(),
            Flow::Exit
        );
        assert_eq!(
            handle_line(&dispatcher, &mut controller, "exit").unwrap(),
            Flow::Exit
        );
    }

    #[test]
    fn test_recoverable_errors_continue() {
        let temp = TempDir::new().unwrap();
        let mut controller = controller(&temp);
        let dispatcher = LedgerController::dispatcher();

        for line in ["bogus", "clear", "calc not-a-date", "stop", "start"] {
            assert_eq!(
                handle_line(&dispatcher, &mut controller, line).unwrap(),
                Flow::Continue
            );
        }
        assert!(controller.ledger().sessions.active().is_some());
    }

    #[test]
    fn test_corrupted_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut controller = controller_with(&temp, &["again", "and again"]);
        let dispatcher = LedgerController::dispatcher();
        std::fs::write(temp.path().join("work.wlg"), b"short").unwrap();

        let err = handle_line(&dispatcher, &mut controller, "load").unwrap_err();
        let err = err.downcast::<LedgerError>().unwrap();
        assert!(matches!(
            err,
            LedgerError::PasswordAttemptsExhausted { attempts: 3 }
        ));
    }
}
