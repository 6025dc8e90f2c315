//! SQLite backend for the Rapport relationship store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each commit is a single SQLite
//! transaction executed on that thread; once dispatched it runs to completion
//! or rolls back even if the awaiting task is dropped.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
