//! Generic CRUD repository over one entity set.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use placekeep_core::entity::Entity;
use placekeep_core::storage::{Change, Filter, RepositoryError, Result};

use super::context::{DataContext, EntitySet};
use super::query::Query;

/// CRUD and ad-hoc query operations for one entity type.
///
/// Every mutating call commits immediately through the shared context and
/// reports whether at least one row was affected.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns every row of the set.
    async fn get_all(&self) -> Result<Vec<T>>;

    /// Returns rows matching `predicate`, filtered by the store.
    async fn find(&self, predicate: Filter) -> Result<Vec<T>>;

    /// Returns the one matching row, or `None`.
    ///
    /// Fails with [`RepositoryError::MultipleMatches`] when several rows match.
    async fn single(&self, filter: Option<Filter>, includes: &[&'static str])
        -> Result<Option<T>>;

    /// Builds a lazy query.
    ///
    /// Filter and includes are only applied when a filter is given; without
    /// one the includes are ignored.
    fn query(&self, filter: Option<Filter>, includes: &[&'static str]) -> Query<T>;

    async fn add(&self, entity: &T) -> Result<bool>;

    async fn add_range(&self, entities: &[T]) -> Result<bool>;

    /// Overwrites the whole stored row with `entity`.
    async fn update(&self, entity: &T) -> Result<bool>;

    async fn remove(&self, entity: &T) -> Result<bool>;

    async fn remove_range(&self, entities: &[T]) -> Result<bool>;
}

/// Default [`Repository`] bound to a context it does not own.
pub struct GenericRepository<T: Entity> {
    context: Weak<DataContext>,
    set: EntitySet<T>,
}

impl<T: Entity> GenericRepository<T> {
    pub fn new(context: &Arc<DataContext>) -> Result<Self> {
        Ok(Self {
            set: context.set::<T>()?,
            context: Arc::downgrade(context),
        })
    }

    /// Unfiltered query over the whole set.
    pub fn base_query(&self) -> Query<T> {
        Query::new(Weak::clone(&self.context), self.set)
    }

    fn context(&self) -> Result<Arc<DataContext>> {
        self.context.upgrade().ok_or(RepositoryError::Disposed)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<bool> {
        let context = self.context()?;
        context.stage(changes);
        Ok(context.save_changes_async().await? > 0)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for GenericRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        self.base_query().to_list().await
    }

    async fn find(&self, predicate: Filter) -> Result<Vec<T>> {
        self.base_query().filter(predicate).to_list().await
    }

    async fn single(
        &self,
        filter: Option<Filter>,
        includes: &[&'static str],
    ) -> Result<Option<T>> {
        self.query(filter, includes).single().await
    }

    fn query(&self, filter: Option<Filter>, includes: &[&'static str]) -> Query<T> {
        let query = self.base_query();
        match filter {
            Some(filter) => includes
                .iter()
                .fold(query.filter(filter), |query, relation| query.include(*relation)),
            None => query,
        }
    }

    async fn add(&self, entity: &T) -> Result<bool> {
        self.commit(vec![self.set.insert(entity)?]).await
    }

    async fn add_range(&self, entities: &[T]) -> Result<bool> {
        let changes = entities
            .iter()
            .map(|entity| self.set.insert(entity))
            .collect::<Result<Vec<_>>>()?;
        self.commit(changes).await
    }

    async fn update(&self, entity: &T) -> Result<bool> {
        self.commit(vec![self.set.update(entity)?]).await
    }

    async fn remove(&self, entity: &T) -> Result<bool> {
        self.commit(vec![self.set.delete(entity)]).await
    }

    async fn remove_range(&self, entities: &[T]) -> Result<bool> {
        let changes = entities.iter().map(|entity| self.set.delete(entity)).collect();
        self.commit(changes).await
    }
}
