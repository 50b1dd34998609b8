//! Lazy, composable queries over one entity set.

use std::sync::{Arc, Weak};

use placekeep_core::entity::{from_record, Entity};
use placekeep_core::storage::{Filter, Record, RepositoryError, Result};

use super::context::{DataContext, EntitySet};

/// A query that has not run yet.
///
/// Nothing touches the store until one of the executors (`to_list`, `first`,
/// `single`, `count`) is awaited.
pub struct Query<T: Entity> {
    context: Weak<DataContext>,
    set: EntitySet<T>,
    filter: Option<Filter>,
    includes: Vec<&'static str>,
}

impl<T: Entity> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            context: Weak::clone(&self.context),
            set: self.set,
            filter: self.filter.clone(),
            includes: self.includes.clone(),
        }
    }
}

impl<T: Entity> Query<T> {
    pub(crate) fn new(context: Weak<DataContext>, set: EntitySet<T>) -> Self {
        Self {
            context,
            set,
            filter: None,
            includes: Vec::new(),
        }
    }

    /// Narrows the query; successive filters are combined with AND.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Eagerly loads a relation declared by [`Entity::relations`].
    pub fn include(mut self, relation: &'static str) -> Self {
        if !self.includes.contains(&relation) {
            self.includes.push(relation);
        }
        self
    }

    pub fn filter_expr(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn includes(&self) -> &[&'static str] {
        &self.includes
    }

    pub async fn to_list(&self) -> Result<Vec<T>> {
        self.execute(None).await
    }

    pub async fn first(&self) -> Result<Option<T>> {
        Ok(self.execute(Some(1)).await?.into_iter().next())
    }

    /// Returns the only matching row, `None` if nothing matches, and
    /// [`RepositoryError::MultipleMatches`] if more than one row does.
    pub async fn single(&self) -> Result<Option<T>> {
        let mut rows = self.execute(Some(2)).await?;
        if rows.len() > 1 {
            return Err(RepositoryError::MultipleMatches {
                entity_type: T::ENTITY_TYPE,
            });
        }
        Ok(rows.pop())
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.fetch(None).await?.len())
    }

    async fn execute(&self, limit: Option<usize>) -> Result<Vec<T>> {
        for relation in &self.includes {
            if !T::relations().contains(relation) {
                return Err(RepositoryError::UnknownRelation {
                    entity_type: T::ENTITY_TYPE,
                    relation: relation.to_string(),
                });
            }
        }

        self.fetch(limit)
            .await?
            .into_iter()
            .map(|record| from_record(self.strip_excluded(record)))
            .collect()
    }

    async fn fetch(&self, limit: Option<usize>) -> Result<Vec<Record>> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        let context = self.context()?;
        let mut request = self.set.fetch(self.filter.clone());
        request.limit = limit;

        tracing::trace!(set = self.set.name(), ?limit, "Executing query");
        context.fetch(request).await
    }

    /// Drops relations that were not requested so they load as defaults.
    fn strip_excluded(&self, mut record: Record) -> Record {
        if let Some(fields) = record.body.as_object_mut() {
            for relation in T::relations() {
                if !self.includes.contains(relation) {
                    fields.remove(*relation);
                }
            }
        }
        record
    }

    fn context(&self) -> Result<Arc<DataContext>> {
        self.context.upgrade().ok_or(RepositoryError::Disposed)
    }
}
