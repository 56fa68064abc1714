//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod list;
pub mod open;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use wl_core::config::Config;
use wl_storage::LedgerStore;

/// workledger - track work sessions and what they earn
#[derive(Debug, Parser)]
#[command(name = "workledger")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding ledger files (overrides the configuration)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open a ledger, creating it if needed, and enter the command loop
    Open(open::OpenArgs),

    /// List ledgers in the data directory
    List,
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(cli.config.as_deref())?;
    let store = open_store(&config, cli.data_dir)?;

    match cli.command {
        Commands::Open(args) => open::execute(args, &config, store),
        Commands::List => list::execute(&store),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(Config::default()),
        },
    };
    Config::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// `<config_dir>/config.toml` of the platform
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "workledger", "workledger")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn open_store(config: &Config, data_dir: Option<PathBuf>) -> Result<LedgerStore> {
    let mut storage = config.storage.clone();
    if data_dir.is_some() {
        storage.data_dir = data_dir;
    }
    LedgerStore::from_config(&storage).context("Failed to prepare the data directory")
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_text() {
        let cmd = Cli::command();
        assert!(cmd.get_about().is_some());
    }

    #[test]
    fn test_open_args() {
        let cli = Cli::try_parse_from(["workledger", "-vv", "open", "work"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Open(args) => assert_eq!(args.name, "work"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_data_dir_overrides_config() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&Config::default(), Some(temp.path().join("ledgers"))).unwrap();
        assert_eq!(store.data_dir(), temp.path().join("ledgers"));
        assert!(store.data_dir().exists());
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.display.decimals, 2);
    }
}
