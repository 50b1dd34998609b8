//! Entity context: one live session over the shared store.
//!
//! A [`DataContext`] tracks the changes staged by repositories and commits
//! them as one batch. It is created per unit of work and is not meant to be
//! shared between concurrent callers.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use placekeep_core::entity::{to_record, Entity, Model};
use placekeep_core::storage::{Change, FetchRequest, Filter, Record, RepositoryError, Result, Store};

/// Per-context tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Deadline applied to every store read. `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
}

/// Creates one [`DataContext`] per unit of work over a shared store.
#[derive(Clone)]
pub struct ContextFactory {
    store: Arc<dyn Store>,
    model: Arc<Model>,
    options: ContextOptions,
}

impl ContextFactory {
    pub fn new(store: Arc<dyn Store>, model: Model, options: ContextOptions) -> Self {
        Self {
            store,
            model: Arc::new(model),
            options,
        }
    }

    pub fn create(&self) -> DataContext {
        DataContext {
            store: Arc::clone(&self.store),
            model: Arc::clone(&self.model),
            options: self.options,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn options(&self) -> ContextOptions {
        self.options
    }
}

/// Typed handle to one registered entity set.
pub struct EntitySet<T> {
    name: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntitySet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntitySet<T> {}

impl<T: Entity> EntitySet<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn insert(&self, entity: &T) -> Result<Change> {
        Ok(Change::insert(self.name, T::ENTITY_TYPE, to_record(entity)?))
    }

    pub fn update(&self, entity: &T) -> Result<Change> {
        Ok(Change::update(self.name, T::ENTITY_TYPE, to_record(entity)?))
    }

    pub fn delete(&self, entity: &T) -> Change {
        Change::delete(self.name, T::ENTITY_TYPE, entity.key())
    }

    pub fn fetch(&self, filter: Option<Filter>) -> FetchRequest {
        FetchRequest::all(self.name).with_filter(filter)
    }
}

/// A live session: store handle, model, and the changes waiting for commit.
pub struct DataContext {
    store: Arc<dyn Store>,
    model: Arc<Model>,
    options: ContextOptions,
    pending: Mutex<Vec<Change>>,
}

impl DataContext {
    /// Returns the typed set for `T`, failing if `T` is not in the model.
    pub fn set<T: Entity>(&self) -> Result<EntitySet<T>> {
        if !self.model.contains(T::SET_NAME) {
            return Err(RepositoryError::UnknownEntitySet(T::SET_NAME.to_string()));
        }
        Ok(EntitySet {
            name: T::SET_NAME,
            _entity: PhantomData,
        })
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn has_changes(&self) -> bool {
        !self.lock_pending().is_empty()
    }

    /// Stages changes for the next commit.
    pub fn stage(&self, changes: impl IntoIterator<Item = Change>) {
        self.lock_pending().extend(changes);
    }

    /// Commits every pending change, blocking the current thread.
    ///
    /// Prefer [`DataContext::save_changes_async`] inside the async runtime.
    pub fn save_changes(&self) -> Result<usize> {
        let changes = self.take_pending();
        if changes.is_empty() {
            return Ok(0);
        }
        match self.store.commit(&changes) {
            Ok(affected) => {
                tracing::debug!(changes = changes.len(), affected, "Committed changes");
                Ok(affected)
            }
            Err(e) => {
                self.restore_pending(changes);
                Err(e)
            }
        }
    }

    /// Commits every pending change.
    pub async fn save_changes_async(&self) -> Result<usize> {
        let changes = self.take_pending();
        if changes.is_empty() {
            return Ok(0);
        }
        let count = changes.len();
        match self.store.commit_async(changes.clone()).await {
            Ok(affected) => {
                tracing::debug!(changes = count, affected, "Committed changes");
                Ok(affected)
            }
            Err(e) => {
                self.restore_pending(changes);
                Err(e)
            }
        }
    }

    /// Reads rows from the store under the configured deadline.
    pub async fn fetch(&self, request: FetchRequest) -> Result<Vec<Record>> {
        self.with_deadline(self.store.fetch(request)).await
    }

    /// Removes and returns the pending changes, oldest first.
    pub(crate) fn take_pending(&self) -> Vec<Change> {
        std::mem::take(&mut *self.lock_pending())
    }

    /// Puts changes back ahead of anything staged since they were taken.
    pub(crate) fn restore_pending(&self, mut changes: Vec<Change>) {
        let mut pending = self.lock_pending();
        changes.append(&mut pending);
        *pending = changes;
    }

    async fn with_deadline<R>(&self, call: impl Future<Output = Result<R>>) -> Result<R> {
        match self.options.command_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RepositoryError::Timeout(limit.as_millis() as u64))?,
            None => call.await,
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<Change>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
