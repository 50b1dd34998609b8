//! Storage backend implementations.
//!
//! This module provides the concrete [`Store`](placekeep_core::storage::Store)
//! backends. The in-memory store is always built; the one the server runs on
//! is selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): process-local tables, lost on restart
//! - `sqlite`: SQLite database file using `rusqlite`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.
//!
//! # Examples
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p placekeep --no-default-features --features sqlite
//! ```

#[cfg(all(feature = "inmemory", feature = "sqlite"))]
compile_error!(
    "Features 'inmemory' and 'sqlite' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'sqlite' feature. \
    Example: cargo build -p placekeep --no-default-features --features sqlite"
);

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
