//! Key/value storage for disposable read models.

pub mod store;

pub use store::{InMemoryStore, KeyedStore};
