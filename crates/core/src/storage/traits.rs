use async_trait::async_trait;

use crate::entity::Model;
use crate::placeholder::Placeholder;

use super::{Change, FetchRequest, Record, Result};

/// Storage backend shared by every entity context.
///
/// Implementations must apply each `commit` batch atomically: either every
/// change lands or none does.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name, used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Creates storage for every entity set registered in the model.
    async fn migrate(&self, model: &Model) -> Result<()>;

    /// Returns rows of one set, in insertion order, filtered by the store.
    async fn fetch(&self, request: FetchRequest) -> Result<Vec<Record>>;

    /// Applies a batch of changes synchronously. Returns the number of affected rows.
    fn commit(&self, changes: &[Change]) -> Result<usize>;

    /// Applies a batch of changes without blocking the async runtime.
    async fn commit_async(&self, changes: Vec<Change>) -> Result<usize>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Repository for placeholder operations.
#[async_trait]
pub trait PlaceholderRepository: Send + Sync {
    /// Creates a placeholder. Returns whether a row was written.
    async fn create(&self, placeholder: &Placeholder) -> Result<bool>;

    /// Gets every placeholder.
    async fn get_all(&self) -> Result<Vec<Placeholder>>;

    /// Gets a placeholder by its ID.
    async fn get_by_id(&self, id: i32) -> Result<Option<Placeholder>>;

    /// Overwrites an existing placeholder. Returns `false` when no row matched.
    async fn update(&self, placeholder: &Placeholder) -> Result<bool>;

    /// Deletes a placeholder by its ID. Returns `false` when it did not exist.
    async fn delete(&self, id: i32) -> Result<bool>;
}
