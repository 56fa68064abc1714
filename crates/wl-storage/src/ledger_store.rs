//! File system storage for encrypted ledgers

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wl_core::codec::{self, RetryContext};
use wl_core::config::StorageConfig;
use wl_core::error::{LedgerError, Result};
use wl_core::prompt::Prompter;
use wl_core::{types, Ledger};

/// Directory of ledger files, one encrypted file per ledger name
pub struct LedgerStore {
    /// Directory holding ledger files
    data_dir: PathBuf,
    /// Extension appended to ledger names
    extension: String,
}

impl LedgerStore {
    /// Create a store rooted at `data_dir`, creating it if needed
    pub fn new(data_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self> {
        let store = Self {
            data_dir: data_dir.into(),
            extension: extension.into(),
        };
        store.ensure_dirs()?;
        Ok(store)
    }

    /// Create a store from configuration, using the default location when
    /// no directory is configured
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let data_dir = config
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir);
        Self::new(data_dir, config.extension.clone())
    }

    /// Platform data directory, falling back to `~/.workledger`
    pub fn default_data_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "workledger", "workledger")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".workledger")
            })
    }

    fn ensure_dirs(&self) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                LedgerError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create data directory: {}", e),
                ))
            })?;
            debug!("Created data directory: {:?}", self.data_dir);
        }
        Ok(())
    }

    /// Resolve a ledger name to its file path.
    ///
    /// Names must be plain file names: no separators, no leading dot.
    pub fn ledger_path(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "Ledger name cannot be empty".to_string(),
            ));
        }
        if name.starts_with('.') || name.contains(&['/', '\\'][..]) {
            return Err(LedgerError::Validation(format!(
                "Invalid ledger name '{}'",
                name
            )));
        }
        Ok(self.data_dir.join(format!("{}.{}", name, self.extension)))
    }

    fn temp_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.ledger_path(name)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.data_dir.join(format!(".{}.tmp", file_name)))
    }

    /// Check if a ledger file exists
    pub fn exists(&self, name: &str) -> bool {
        self.ledger_path(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Encode the whole ledger and replace its file.
    ///
    /// The ledger's `last_modified` is stamped and its dirty flag cleared
    /// only once the file is in place.
    pub fn save(&self, name: &str, ledger: &mut Ledger, password: &str) -> Result<()> {
        let at = types::now();
        let blob = codec::encode_at(ledger, password, at)?;
        self.atomic_write(name, &blob)?;
        ledger.last_modified = at;
        ledger.mark_saved();
        info!("Saved ledger '{}'", name);
        Ok(())
    }

    /// Read and decode a ledger, prompting again on a wrong password.
    ///
    /// Returns the ledger and the password that opened it.
    pub fn load(
        &self,
        name: &str,
        password: String,
        retry: &mut RetryContext,
        prompter: &mut dyn Prompter,
    ) -> Result<(Ledger, String)> {
        let blob = self.read(name)?;
        let loaded = codec::decode_with_retry(&blob, password, retry, prompter)?;
        info!("Loaded ledger '{}'", name);
        Ok(loaded)
    }

    /// Raw encrypted bytes of a ledger file
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.ledger_path(name)?;
        fs::read(&path).map_err(|e| {
            LedgerError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })
    }

    /// Write a file atomically (write to temp, then rename)
    fn atomic_write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let temp_path = self.temp_path(name)?;
        let final_path = self.ledger_path(name)?;

        let mut file = fs::File::create(&temp_path).map_err(|e| {
            LedgerError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create temp file: {}", e),
            ))
        })?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LedgerError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file: {}", e),
            ))
        })?;

        debug!("Wrote {} bytes to {:?}", bytes.len(), final_path);
        Ok(())
    }

    /// Names of the ledgers in this store
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !path
                .extension()
                .map(|e| e == self.extension.as_str())
                .unwrap_or(false)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Get the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wl_core::prompt::ScriptedPrompter;
    use wl_core::session::Selector;

    fn create_test_store() -> (LedgerStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::new(temp_dir.path().join("ledgers"), "wlg").unwrap();
        (store, temp_dir)
    }

    fn ts(s: &str) -> NaiveDateTime {
        types::parse_timestamp(s).unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new(40.0, "USD");
        ledger
            .sessions
            .add_session(
                Some(ts("10/07/2024 09:00:00")),
                Some(ts("10/07/2024 13:00:00")),
                false,
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_store_creation() {
        let (store, _temp) = create_test_store();
        assert!(store.data_dir().exists());
    }

    #[test]
    fn test_ledger_path() {
        let (store, _temp) = create_test_store();
        let path = store.ledger_path("work").unwrap();
        assert!(path.to_string_lossy().ends_with("work.wlg"));
        assert!(path.starts_with(store.data_dir()));
    }

    #[test]
    fn test_rejects_bad_names() {
        let (store, _temp) = create_test_store();
        for name in ["", "  ", "../escape", "a/b", ".hidden", "a\\b"] {
            assert!(
                matches!(store.ledger_path(name), Err(LedgerError::Validation(_))),
                "accepted {:?}",
                name
            );
        }
    }

    #[test]
    fn test_save_and_load() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        assert!(ledger.is_dirty());

        store.save("work", &mut ledger, "pw").unwrap();
        assert!(!ledger.is_dirty());
        assert!(store.exists("work"));

        let mut retry = RetryContext::password_attempts();
        let mut prompter = ScriptedPrompter::default();
        let (loaded, password) = store
            .load("work", "pw".to_string(), &mut retry, &mut prompter)
            .unwrap();
        assert_eq!(password, "pw");
        assert_eq!(loaded.currency, "USD");
        assert_eq!(
            loaded.sessions.totals(&Selector::All, loaded.hourly_price).unwrap().earnings,
            160.0
        );
        assert_eq!(loaded.last_modified, ledger.last_modified);
    }

    #[test]
    fn test_file_is_encrypted() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        store.save("work", &mut ledger, "pw").unwrap();

        let bytes = fs::read(store.ledger_path("work").unwrap()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("USD"));
        assert!(!text.contains("10/07/2024"));
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        store.save("work", &mut ledger, "pw").unwrap();

        let mut empty = Ledger::new(1.0, "EUR");
        store.save("work", &mut empty, "pw").unwrap();

        let mut retry = RetryContext::password_attempts();
        let (loaded, _) = store
            .load("work", "pw".to_string(), &mut retry, &mut ScriptedPrompter::default())
            .unwrap();
        assert!(loaded.sessions.is_empty());
        assert_eq!(loaded.currency, "EUR");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        store.save("work", &mut ledger, "pw").unwrap();

        assert!(!store.temp_path("work").unwrap().exists());
        assert!(store.ledger_path("work").unwrap().exists());
    }

    #[test]
    fn test_load_retries_then_gives_up() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        store.save("work", &mut ledger, "pw").unwrap();

        let mut retry = RetryContext::password_attempts();
        let mut prompter = ScriptedPrompter::new(["x", "y", "pw"]);
        let result = store.load("work", "w".to_string(), &mut retry, &mut prompter);
        assert!(matches!(
            result,
            Err(LedgerError::PasswordAttemptsExhausted { attempts: 3 })
        ));
        assert_eq!(prompter.remaining(), 1);
    }

    #[test]
    fn test_load_corrupted_file() {
        let (store, _temp) = create_test_store();
        let mut ledger = sample_ledger();
        store.save("work", &mut ledger, "pw").unwrap();

        let path = store.ledger_path("work").unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes[20] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let mut retry = RetryContext::password_attempts();
        let mut prompter = ScriptedPrompter::new(["pw", "pw"]);
        let result = store.load("work", "pw".to_string(), &mut retry, &mut prompter);
        assert!(matches!(
            result,
            Err(LedgerError::PasswordAttemptsExhausted { .. })
        ));
    }

    #[test]
    fn test_load_nonexistent() {
        let (store, _temp) = create_test_store();
        let mut retry = RetryContext::password_attempts();
        let result = store.load(
            "missing",
            "pw".to_string(),
            &mut retry,
            &mut ScriptedPrompter::default(),
        );
        assert!(matches!(result, Err(LedgerError::Io(_))));
        assert_eq!(retry.used(), 0);
    }

    #[test]
    fn test_list_ledgers() {
        let (store, _temp) = create_test_store();
        assert!(store.list().unwrap().is_empty());

        store.save("beta", &mut sample_ledger(), "pw").unwrap();
        store.save("alpha", &mut sample_ledger(), "pw").unwrap();
        fs::write(store.data_dir().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_from_config() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: Some(temp.path().join("custom")),
            extension: "ledger".to_string(),
        };
        let store = LedgerStore::from_config(&config).unwrap();
        assert!(store
            .ledger_path("x")
            .unwrap()
            .to_string_lossy()
            .ends_with("x.ledger"));
        assert!(temp.path().join("custom").exists());
    }
}
