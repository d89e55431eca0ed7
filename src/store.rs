use std::path::Path;

use crate::models::{PhoneBook, Subscriber};
use crate::storage::{BookStorage, export_json};

/// Phone book store: the in-memory book plus its backing storage
///
/// Every successful mutation is persisted immediately. Failures never
/// escape: validation problems and I/O errors alike collapse to boolean
/// results, so a front end can stay up no matter what the disk does.
/// A failed save is logged but does not roll back the in-memory change,
/// so memory and disk may diverge until the next successful save.
pub struct SubscriberStore {
    book: PhoneBook,
    storage: Box<dyn BookStorage>,
    load_failed: bool,
}

impl SubscriberStore {
    /// Create an empty store on top of the given storage
    pub fn new(storage: Box<dyn BookStorage>) -> Self {
        SubscriberStore {
            book: PhoneBook::new(),
            storage,
            load_failed: false,
        }
    }

    /// Create a store and populate it from the backing file
    pub fn open(storage: Box<dyn BookStorage>) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Add a subscriber and persist
    ///
    /// Returns false for empty fields or an exact duplicate; the book is
    /// left untouched in that case.
    pub fn add(&mut self, name: &str, phone: &str) -> bool {
        match self.book.add(name, phone) {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                log::warn!("Rejected add: {}", e);
                false
            }
        }
    }

    /// Replace the subscriber at `index` and persist
    ///
    /// Returns false only when `index` is out of bounds.
    pub fn edit(&mut self, index: usize, name: &str, phone: &str) -> bool {
        match self.book.edit(index, name, phone) {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                log::warn!("Rejected edit: {}", e);
                false
            }
        }
    }

    /// Delete the subscriber at `index` and persist
    pub fn delete(&mut self, index: usize) -> bool {
        match self.book.delete(index) {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                log::warn!("Rejected delete: {}", e);
                false
            }
        }
    }

    /// Case-insensitive substring search on name; does not mutate
    pub fn search(&self, query: &str) -> Vec<Subscriber> {
        self.book.search(query)
    }

    /// Empty the book and persist the empty state
    pub fn clear(&mut self) {
        self.book.clear();
        self.persist();
    }

    /// Independent snapshot of the current sorted list
    pub fn get_all(&self) -> Vec<Subscriber> {
        self.book.to_vec()
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.book.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    /// Replace the in-memory book from the backing file
    ///
    /// A missing file yields an empty book. Any read or decode failure is
    /// swallowed: the book resets to empty and the failure is recorded so
    /// `last_load_failed` can report it.
    pub fn load(&mut self) {
        match self.storage.load() {
            Ok(book) => {
                self.book = book;
                self.load_failed = false;
            }
            Err(e) => {
                log::warn!("Failed to load phone book, starting empty: {:#}", e);
                self.book = PhoneBook::new();
                self.load_failed = true;
            }
        }
    }

    /// Write the current book to the backing file
    pub fn save(&self) -> bool {
        match self.storage.save(&self.book) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save phone book: {:#}", e);
                false
            }
        }
    }

    /// Export the book as pretty-printed JSON, export-only
    pub fn export(&self, path: &Path) -> bool {
        match export_json(&self.book, path) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to export phone book: {:#}", e);
                false
            }
        }
    }

    /// Whether the most recent `load` swallowed a failure
    pub fn last_load_failed(&self) -> bool {
        self.load_failed
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    fn persist(&self) {
        // Result intentionally reduced to a log line: mutations report
        // their own success, save() exists for callers that care
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BincodeBookStorage;
    use std::fs;
    use tempfile::tempdir;

    fn store_at(path: std::path::PathBuf) -> SubscriberStore {
        SubscriberStore::open(Box::new(BincodeBookStorage::new(path)))
    }

    #[test]
    fn test_mutations_persist_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");

        let mut store = store_at(path.clone());
        assert!(store.add("Bob Smith", "555-1111"));
        assert!(store.add("alice Jones", "555-2222"));

        // A second store over the same file sees the sorted list
        let other = store_at(path.clone());
        let all = other.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], Subscriber::new("alice Jones", "555-2222"));
        assert_eq!(all[1], Subscriber::new("Bob Smith", "555-1111"));

        assert!(store.delete(0));
        let other = store_at(path);
        assert_eq!(other.get_all(), vec![Subscriber::new("Bob Smith", "555-1111")]);
    }

    #[test]
    fn test_add_failures_do_not_touch_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");

        let mut store = store_at(path.clone());
        assert!(!store.add("", "555-1111"));
        assert!(!store.add("  ", "  "));
        assert!(!path.exists());

        assert!(store.add("Alice", "555-2222"));
        assert!(!store.add("Alice", "555-2222"));
        assert_eq!(store_at(path).len(), 1);
    }

    #[test]
    fn test_edit_out_of_bounds() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path().join("phonebook.dat"));

        assert!(!store.edit(0, "A", "1"));
        store.add("Alice", "555-2222");
        assert!(!store.edit(1, "A", "1"));
        assert!(store.edit(0, "Alice J.", "555-9999"));
        assert_eq!(store.get_all()[0], Subscriber::new("Alice J.", "555-9999"));
    }

    #[test]
    fn test_clear_persists_empty_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");

        let mut store = store_at(path.clone());
        store.add("Alice", "555-2222");
        store.clear();
        assert!(store.is_empty());

        let mut reloaded = store_at(path);
        reloaded.load();
        assert!(reloaded.is_empty());
        assert!(!reloaded.last_load_failed());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_flags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");
        fs::write(&path, b"garbage that is not bincode").unwrap();

        let store = store_at(path);
        assert!(store.is_empty());
        assert!(store.last_load_failed());
    }

    #[test]
    fn test_missing_file_is_not_a_failure() {
        let dir = tempdir().unwrap();
        let store = store_at(dir.path().join("phonebook.dat"));
        assert!(store.is_empty());
        assert!(!store.last_load_failed());
    }

    #[test]
    fn test_explicit_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phonebook.dat");

        let mut store = store_at(path);
        store.add("Bob", "555-1111");
        store.add("alice", "555-2222");
        assert!(store.save());

        let before = store.get_all();
        store.load();
        assert_eq!(store.get_all(), before);
    }

    #[test]
    fn test_export_writes_json() {
        let dir = tempdir().unwrap();
        let export_path = dir.path().join("phonebook_export.json");

        let mut store = store_at(dir.path().join("phonebook.dat"));
        store.add("Alice", "555-2222");
        assert!(store.export(&export_path));

        let contents = fs::read_to_string(export_path).unwrap();
        assert!(contents.contains("\"name\": \"Alice\""));
    }
}
