//! Travel Buddy storage crate - session persistence.
//!
//! Provides the [`SessionStore`] trait, a JSON file implementation with
//! atomic whole-file saves, and an in-memory implementation for tests.

pub mod json_store;
pub mod memory;
pub mod store;

pub use json_store::JsonFileStore;
pub use memory::InMemoryStore;
pub use store::{SessionStore, StoreStats};
