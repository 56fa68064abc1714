//! List command

use anyhow::Result;
use colored::Colorize;

use wl_storage::LedgerStore;

/// Execute the list command
pub fn execute(store: &LedgerStore) -> Result<()> {
    let names = store.list()?;
    if names.is_empty() {
        println!(
            "No ledgers in {}",
            store.data_dir().display().to_string().dimmed()
        );
        return Ok(());
    }

    for name in names {
        println!("{}", name);
    }
    Ok(())
}
