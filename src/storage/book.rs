use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::PhoneBook;

/// Trait for phone book persistence
pub trait BookStorage: Send + Sync {
    /// Load the phone book from storage
    fn load(&self) -> Result<PhoneBook>;

    /// Save the phone book to storage
    fn save(&self, book: &PhoneBook) -> Result<()>;

    /// Get the storage file path
    fn path(&self) -> &PathBuf;
}

/// Bincode-based implementation of BookStorage
/// Uses atomic write pattern with .tmp file for safety
pub struct BincodeBookStorage {
    path: PathBuf,
}

impl BincodeBookStorage {
    /// Create a new BincodeBookStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        BincodeBookStorage { path }
    }
}

impl BookStorage for BincodeBookStorage {
    fn load(&self) -> Result<PhoneBook> {
        // A missing file is not an error: first run starts empty
        if !self.path.exists() {
            log::info!(
                "Phone book file not found at {:?}, starting with an empty book",
                self.path
            );
            return Ok(PhoneBook::new());
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read phone book from {:?}", self.path))?;

        match bincode::decode_from_slice::<PhoneBook, _>(&bytes, bincode::config::standard()) {
            Ok((mut book, _bytes_read)) => {
                // The ordering rule is not part of the file format
                book.resort();
                log::info!("Loaded {} subscribers from {:?}", book.len(), self.path);
                Ok(book)
            }
            Err(e) => {
                // Corrupted file - move it aside so the next save starts clean
                let backup_path = self.path.with_extension("dat.corrupted");
                log::warn!(
                    "Phone book file corrupted, backing up to {:?}: {}",
                    backup_path,
                    e
                );

                if let Err(backup_err) = fs::rename(&self.path, &backup_path) {
                    log::error!("Failed to backup corrupted file: {}", backup_err);
                }

                bail!("Failed to decode phone book file {:?}: {}", self.path, e)
            }
        }
    }

    fn save(&self, book: &PhoneBook) -> Result<()> {
        let bytes = bincode::encode_to_vec(book, bincode::config::standard())
            .with_context(|| "Failed to serialize phone book")?;

        // Atomic write pattern: write to .tmp, then rename
        let tmp_path = self.path.with_extension("dat.tmp");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&tmp_path, &bytes)
            .with_context(|| format!("Failed to write to temporary file {:?}", tmp_path))?;

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, self.path))?;

        log::debug!("Saved {} subscribers to {:?}", book.len(), self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Export the phone book as a pretty-printed JSON array of
/// `{name, phone}` objects
///
/// One-directional: the export file is never read back.
pub fn export_json(book: &PhoneBook, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(book.subscribers())
        .with_context(|| "Failed to serialize phone book to JSON")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    fs::write(path, json)
        .with_context(|| format!("Failed to write JSON export to {:?}", path))?;

    log::info!("Exported {} subscribers to {:?}", book.len(), path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = BincodeBookStorage::new(dir.path().join("phonebook.dat"));

        let book = storage.load().unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let storage = BincodeBookStorage::new(dir.path().join("phonebook.dat"));

        let mut book = PhoneBook::new();
        book.add("Bob Smith", "555-1111").unwrap();
        book.add("alice Jones", "555-2222").unwrap();

        storage.save(&book).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.subscribers(), book.subscribers());
        // No .tmp leftovers after the atomic rename
        assert!(!dir.path().join("phonebook.dat.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let storage = BincodeBookStorage::new(dir.path().join("nested/data/phonebook.dat"));

        storage.save(&PhoneBook::new()).unwrap();
        assert!(storage.path().exists());
    }

    #[test]
    fn test_load_corrupt_file_errors_and_backs_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");
        fs::write(&path, b"not a phone book").unwrap();

        let storage = BincodeBookStorage::new(path.clone());
        assert!(storage.load().is_err());

        // Original moved aside so a later save starts clean
        assert!(!path.exists());
        assert!(dir.path().join("phonebook.dat.corrupted").exists());
    }

    #[test]
    fn test_export_json_shape() {
        let dir = tempdir().unwrap();
        let export_path = dir.path().join("phonebook_export.json");

        let mut book = PhoneBook::new();
        book.add("Alice", "555-2222").unwrap();

        export_json(&book, &export_path).unwrap();
        let contents = fs::read_to_string(&export_path).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed[0]["name"], "Alice");
        assert_eq!(parsed[0]["phone"], "555-2222");
        // Pretty-printed, one field per line
        assert!(contents.contains("\n"));
    }
}
