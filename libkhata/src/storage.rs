use crate::{
    account::Account,
    asset::Asset,
    error::{LedgerError, Result},
    journal::JournalEntry,
};

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything needed to rebuild a [`crate::Ledger`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub accounts: Vec<Account>,
    pub journal: Vec<JournalEntry>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Where snapshots live between runs.
pub trait LedgerStorage {
    /// `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<LedgerSnapshot>>;

    fn save(&mut self, snapshot: &LedgerSnapshot) -> Result<()>;
}

/// Keeps the last saved snapshot in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    snapshot: Option<LedgerSnapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Default::default()
    }
}

impl LedgerStorage for MemoryStorage {
    fn load(&self) -> Result<Option<LedgerSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &LedgerSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

/// One pretty-printed JSON document per ledger.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(LedgerError::Storage(format!(
                    "directory `{}' does not exist",
                    parent.display()
                )));
            }
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        // the previous file stays in place until the rename
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            entries = snapshot.journal.len(),
            "ledger saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::journal::{DraftLine, NewEntry};
    use crate::ledger::Ledger;
    use crate::storage::{JsonFileStorage, LedgerStorage, MemoryStorage};
    use chrono::NaiveDate;

    use anyhow::{anyhow, Result};

    fn sample() -> Result<Ledger> {
        let mut ledger = Ledger::with_default_chart();
        ledger.add_journal_entry(NewEntry::new(
            NaiveDate::from_ymd_opt(2024, 4, 1).ok_or(anyhow!("invalid date"))?,
            "Capital",
            vec![
                DraftLine::debit("1100", 250_000f64),
                DraftLine::credit("3000", 250_000f64),
            ],
        ))?;
        Ok(ledger)
    }

    #[test]
    fn test_memory_storage() -> Result<()> {
        let mut storage = MemoryStorage::new();
        assert!(storage.load()?.is_none());

        let ledger = sample()?;
        storage.save(&ledger.snapshot())?;
        let loaded = storage.load()?.ok_or(anyhow!("nothing saved"))?;
        assert_eq!(loaded, ledger.snapshot());
        Ok(())
    }

    #[test]
    fn test_json_file_storage() -> Result<()> {
        let path = std::env::temp_dir().join(format!("khata-{}.json", uuid::Uuid::new_v4()));
        let mut storage = JsonFileStorage::new(&path);
        assert!(storage.load()?.is_none());

        let ledger = sample()?;
        storage.save(&ledger.snapshot())?;
        let restored = Ledger::restore(storage.load()?.ok_or(anyhow!("nothing saved"))?)?;
        assert_eq!(restored.account_balance("1100").debit, 250_000f64);
        assert_eq!(restored.list_journal_entries(), ledger.list_journal_entries());

        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_json_file_storage_missing_directory() {
        let mut storage = JsonFileStorage::new("/nonexistent-khata-dir/books.json");
        assert!(storage.save(&Default::default()).is_err());
    }
}
