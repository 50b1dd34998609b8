//! Unit of work: owns one entity context and the repositories bound to it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use placekeep_core::entity::Entity;
use placekeep_core::storage::{RepositoryError, Result};

use super::context::DataContext;
use super::repository::{GenericRepository, Repository};
use super::transaction;

type RepositoryMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Pre-built repositories that replace the generic one for their entity type.
#[derive(Default)]
pub struct CustomRepositories {
    repositories: RepositoryMap,
}

impl CustomRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `repository` as the override for `T`.
    pub fn with<T: Entity>(mut self, repository: Arc<dyn Repository<T>>) -> Self {
        self.repositories
            .insert(TypeId::of::<T>(), Box::new(repository));
        self
    }

    pub fn get<T: Entity>(&self) -> Option<Arc<dyn Repository<T>>> {
        lookup::<T>(&self.repositories)
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// Owns an entity context, hands out one repository per entity type, and
/// provides the commit point.
///
/// Dropping the unit of work disposes it.
pub struct UnitOfWork {
    context: Option<Arc<DataContext>>,
    repositories: Mutex<RepositoryMap>,
    custom: CustomRepositories,
}

impl UnitOfWork {
    pub fn new(context: DataContext) -> Self {
        Self::with_custom_repositories(context, CustomRepositories::new())
    }

    pub fn with_custom_repositories(context: DataContext, custom: CustomRepositories) -> Self {
        Self {
            context: Some(Arc::new(context)),
            repositories: Mutex::new(HashMap::new()),
            custom,
        }
    }

    /// The bound context, or [`RepositoryError::Disposed`].
    pub fn context(&self) -> Result<&Arc<DataContext>> {
        self.context.as_ref().ok_or(RepositoryError::Disposed)
    }

    pub fn is_disposed(&self) -> bool {
        self.context.is_none()
    }

    /// Shorthand for `get_repository::<T>(false)`.
    pub fn repository<T: Entity>(&self) -> Result<Arc<dyn Repository<T>>> {
        self.get_repository::<T>(false)
    }

    /// Returns the repository for `T`.
    ///
    /// With `prefer_custom`, a registered custom repository wins. Otherwise the
    /// generic repository is created on first request and the same instance is
    /// returned afterwards.
    pub fn get_repository<T: Entity>(&self, prefer_custom: bool) -> Result<Arc<dyn Repository<T>>> {
        let context = self.context()?;

        if prefer_custom {
            if let Some(custom) = self.custom.get::<T>() {
                return Ok(custom);
            }
        }

        let mut repositories = self
            .repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = lookup::<T>(&repositories) {
            return Ok(cached);
        }

        let repository: Arc<dyn Repository<T>> = Arc::new(GenericRepository::<T>::new(context)?);
        repositories.insert(TypeId::of::<T>(), Box::new(Arc::clone(&repository)));
        tracing::trace!(entity_type = T::ENTITY_TYPE, "Created repository");

        Ok(repository)
    }

    /// Commits all pending changes, blocking the current thread.
    pub fn save_changes(&self) -> Result<usize> {
        self.context()?.save_changes()
    }

    /// Commits all pending changes.
    pub async fn save_changes_async(&self) -> Result<usize> {
        self.context()?.save_changes_async().await
    }

    /// Commits `others` in the given order and then this unit of work, as one scope.
    ///
    /// All-or-nothing when every participant uses the same store. Across
    /// different stores a late failure cannot undo earlier commits and is
    /// reported as [`RepositoryError::DistributedCommit`].
    pub async fn save_changes_with(&self, others: &[&UnitOfWork]) -> Result<usize> {
        let local = self.context()?;
        let mut participants = Vec::with_capacity(others.len() + 1);
        for other in others {
            participants.push(Arc::clone(other.context()?));
        }
        participants.push(Arc::clone(local));

        tracing::debug!(participants = participants.len(), "Opening commit scope");
        let affected = transaction::commit_all(&participants).await?;
        tracing::debug!(affected, "Commit scope completed");

        Ok(affected)
    }

    /// Clears the repository cache and releases the context. Idempotent.
    pub fn dispose(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };

        self.repositories
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        if context.has_changes() {
            tracing::warn!("Disposing unit of work with uncommitted changes");
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn lookup<T: Entity>(repositories: &RepositoryMap) -> Option<Arc<dyn Repository<T>>> {
    repositories
        .get(&TypeId::of::<T>())
        .and_then(|entry| entry.downcast_ref::<Arc<dyn Repository<T>>>())
        .cloned()
}
