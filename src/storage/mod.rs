//! Key-value persistence for browser-style local storage.
//!
//! The bookmark coordinator only ever needs `get` and `set` on a single key,
//! so the [`KeyValueStore`] capability is kept to exactly those two calls.

pub mod backend;
pub mod file;

pub use backend::{KeyValueStore, MemoryStore};
pub use file::FileStore;
