use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::RecipientStoreError;

/// On-disk layout: `{"emails": ["a@example.com", ...]}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecipientFile {
    #[serde(default)]
    emails: Vec<String>,
}

/// Alert recipients persisted as a JSON file.
///
/// Read on every delivery, never cached, so edits to the file take effect on
/// the next alert.
#[derive(Debug)]
pub struct RecipientStore {
    path: PathBuf,
    // Serializes read-modify-write cycles from concurrent requests
    write_lock: Mutex<()>,
}

impl RecipientStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty list if the file does not exist yet
    pub fn ensure_exists(&self) -> Result<(), RecipientStoreError> {
        if !self.path.exists() {
            self.save(&[])?;
            info!("Created recipient file {}", self.path.display());
        }
        Ok(())
    }

    /// Current recipients in stored order; a missing file is an empty list
    pub fn load(&self) -> Result<Vec<String>, RecipientStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| {
            RecipientStoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        let file: RecipientFile =
            serde_json::from_str(&contents).map_err(|source| RecipientStoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.emails)
    }

    pub fn save(&self, emails: &[String]) -> Result<(), RecipientStoreError> {
        let file = RecipientFile {
            emails: emails.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| {
            RecipientStoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|source| RecipientStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Add an address (trimmed, lowercased). Empty input and duplicates are
    /// ignored. Returns the resulting list.
    pub fn add(&self, email: &str) -> Result<Vec<String>, RecipientStoreError> {
        let email = normalize_email(email);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut emails = self.load()?;
        if !email.is_empty() && !emails.contains(&email) {
            emails.push(email.clone());
            self.save(&emails)?;
            debug!("Added recipient {}", email);
        }
        Ok(emails)
    }

    /// Remove an address if present. Returns the resulting list.
    pub fn remove(&self, email: &str) -> Result<Vec<String>, RecipientStoreError> {
        let email = normalize_email(email);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut emails = self.load()?;
        if let Some(idx) = emails.iter().position(|e| *e == email) {
            emails.remove(idx);
            self.save(&emails)?;
            debug!("Removed recipient {}", email);
        }
        Ok(emails)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RecipientStore {
        RecipientStore::new(dir.path().join("emails.json"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_exists_writes_empty_list() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_exists().unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json, serde_json::json!({ "emails": [] }));
    }

    #[test]
    fn test_add_normalizes_and_dedups() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("  Ops@Example.com ").unwrap();
        store.add("ops@example.com").unwrap();
        let emails = store.add("").unwrap();

        assert_eq!(emails, vec!["ops@example.com"]);
        assert_eq!(store.load().unwrap(), vec!["ops@example.com"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            store.add(email).unwrap();
        }

        let emails = store.remove("B@example.com").unwrap();
        assert_eq!(emails, vec!["a@example.com", "c@example.com"]);

        let emails = store.remove("missing@example.com").unwrap();
        assert_eq!(emails.len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(RecipientStoreError::Json { .. })));
    }
}
