//! SQLite storage backend.
//!
//! Each entity set is a table of `(key, body)` rows where `body` is the JSON
//! document. Filters compile to `json_extract` predicates so SQLite does the
//! filtering. All work runs on the `tokio_rusqlite` connection thread.

mod conversions;
mod error;
mod schema;
mod store;

pub use store::SqliteStore;
