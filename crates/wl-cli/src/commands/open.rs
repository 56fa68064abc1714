//! Open command
//!
//! Create or load a ledger, then hand it to the command loop.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::controller::LedgerController;
use crate::repl;
use crate::terminal::TerminalPrompter;
use wl_core::codec::RetryContext;
use wl_core::config::Config;
use wl_core::prompt::Prompter;
use wl_core::Ledger;
use wl_storage::LedgerStore;

/// Arguments for the open command
#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Ledger name (file name without extension)
    pub name: String,

    /// Password of an existing ledger; asked for when absent
    #[arg(long, env = "WORKLEDGER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Execute the open command
pub fn execute(args: OpenArgs, config: &Config, store: LedgerStore) -> Result<()> {
    let mut prompter = TerminalPrompter::new();
    let path = store.ledger_path(&args.name)?;

    let (ledger, password) = if store.exists(&args.name) {
        let password = match args.password {
            Some(password) => password,
            None => prompter.password("Password")?,
        };
        let mut retry = RetryContext::password_attempts();
        store
            .load(&args.name, password, &mut retry, &mut prompter)
            .with_context(|| format!("Failed to open {}", path.display()))?
    } else {
        println!(
            "{} Creating new ledger at {}",
            "✓".green(),
            path.display().to_string().dimmed()
        );
        let password = prompter.new_password()?;
        let price = prompter.hourly_price(config.ledger.default_hourly_price)?;
        let currency = prompter.currency(&config.ledger.default_currency)?;
        (Ledger::new(price, currency), password)
    };
    info!("Opened ledger '{}'", args.name);

    let controller = LedgerController::new(
        ledger,
        store,
        args.name,
        password,
        Box::new(prompter),
    )
    .with_decimals(config.display.decimals);

    repl::run(controller)
}
