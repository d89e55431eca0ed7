use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Errors produced by the in-memory phone book
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BookError {
    #[error("Name and phone must be non-empty")]
    EmptyField,

    #[error("An identical subscriber already exists")]
    Duplicate,

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// A single phone book record
///
/// Both fields are trimmed at construction, so equality and ordering
/// never see surrounding whitespace.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode, PartialEq, Eq)]
pub struct Subscriber {
    /// Display name, also the sort key (compared case-insensitively)
    pub name: String,
    /// Phone number, stored verbatim apart from trimming
    pub phone: String,
}

impl Subscriber {
    /// Create a new subscriber, trimming both fields
    pub fn new(name: &str, phone: &str) -> Self {
        Subscriber {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
        }
    }

    /// Lowercased name, used to keep the book sorted
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// In-memory phone book container
///
/// Kept sorted case-insensitively by name after every mutation. Does no
/// I/O itself; persistence is layered on top by the store facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Encode, Decode)]
pub struct PhoneBook {
    /// All subscribers, sorted by `Subscriber::sort_key`
    subscribers: Vec<Subscriber>,
}

impl PhoneBook {
    /// Create an empty phone book
    pub fn new() -> Self {
        PhoneBook {
            subscribers: Vec::new(),
        }
    }

    /// Add a subscriber
    ///
    /// Rejects records where either field trims to empty and exact
    /// duplicates (same trimmed name and phone). Re-sorts on success.
    pub fn add(&mut self, name: &str, phone: &str) -> Result<(), BookError> {
        let subscriber = Subscriber::new(name, phone);
        if subscriber.name.is_empty() || subscriber.phone.is_empty() {
            return Err(BookError::EmptyField);
        }
        if self.subscribers.contains(&subscriber) {
            return Err(BookError::Duplicate);
        }

        self.subscribers.push(subscriber);
        self.sort();
        Ok(())
    }

    /// Replace the subscriber at `index` with a freshly constructed record
    ///
    /// Only bounds are checked: no duplicate or emptiness validation here.
    /// The re-sort may move the record to a different index.
    pub fn edit(&mut self, index: usize, name: &str, phone: &str) -> Result<(), BookError> {
        if index >= self.subscribers.len() {
            return Err(BookError::IndexOutOfBounds {
                index,
                len: self.subscribers.len(),
            });
        }

        self.subscribers[index] = Subscriber::new(name, phone);
        self.sort();
        Ok(())
    }

    /// Remove the subscriber at `index`
    pub fn delete(&mut self, index: usize) -> Result<(), BookError> {
        if index >= self.subscribers.len() {
            return Err(BookError::IndexOutOfBounds {
                index,
                len: self.subscribers.len(),
            });
        }

        self.subscribers.remove(index);
        Ok(())
    }

    /// Case-insensitive substring search on name
    ///
    /// An empty query matches every record. Results keep the current sort
    /// order.
    pub fn search(&self, query: &str) -> Vec<Subscriber> {
        let query = query.to_lowercase();
        self.subscribers
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Remove all subscribers
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Borrow the sorted subscriber list
    pub fn subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }

    /// Independent snapshot of the current list
    pub fn to_vec(&self) -> Vec<Subscriber> {
        self.subscribers.clone()
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if the book is empty
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Re-sort after deserialization, in case the file predates the
    /// current ordering rule
    pub fn resort(&mut self) {
        self.sort();
    }

    fn sort(&mut self) {
        self.subscribers.sort_by_cached_key(|s| s.sort_key());
    }
}
