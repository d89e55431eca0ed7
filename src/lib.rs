//! Dialr - Phone book manager with a sorted, disk-persisted subscriber store
//!
//! This library exports the core modules for testing and potential reuse.

pub mod models;
pub mod storage;
pub mod store;

pub use models::{BookError, PhoneBook, Subscriber};
pub use storage::ensure_directories;
pub use store::SubscriberStore;
