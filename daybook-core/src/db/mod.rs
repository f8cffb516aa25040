//! SQLite persistence
//!
//! [`schema`] owns the table layout and its migrations; [`repo`] holds the
//! [`Database`] handle with owner-scoped CRUD and the
//! [`EntryStore`](crate::store::EntryStore) implementation.

pub mod repo;
pub mod schema;

pub use repo::Database;
