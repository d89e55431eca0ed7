pub mod subscriber;

pub use subscriber::{BookError, PhoneBook, Subscriber};
