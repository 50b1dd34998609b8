//! In-memory storage backend.
//!
//! Every entity set is a table of JSON documents kept behind one
//! `Arc<RwLock<_>>`. Data is not persisted and is lost when the last handle
//! to the store is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use placekeep::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::for_model(&model);
//! ```

mod store;

pub use store::InMemoryStore;
