//! Placeholder operations on top of the unit of work.

use std::sync::Arc;

use async_trait::async_trait;

use placekeep_core::placeholder::Placeholder;
use placekeep_core::storage::{Filter, PlaceholderRepository, Result};

use super::repository::Repository;
use super::unit_of_work::UnitOfWork;

/// [`PlaceholderRepository`] backed by the unit of work's repository for
/// [`Placeholder`], preferring a registered custom repository.
pub struct GenericPlaceholderRepository {
    repository: Arc<dyn Repository<Placeholder>>,
}

impl GenericPlaceholderRepository {
    pub fn new(unit_of_work: &UnitOfWork) -> Result<Self> {
        Ok(Self {
            repository: unit_of_work.get_repository::<Placeholder>(true)?,
        })
    }
}

#[async_trait]
impl PlaceholderRepository for GenericPlaceholderRepository {
    async fn create(&self, placeholder: &Placeholder) -> Result<bool> {
        self.repository.add(placeholder).await
    }

    async fn get_all(&self) -> Result<Vec<Placeholder>> {
        self.repository.get_all().await
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Placeholder>> {
        self.repository.single(Some(Filter::eq("id", id)), &[]).await
    }

    async fn update(&self, placeholder: &Placeholder) -> Result<bool> {
        self.repository.update(placeholder).await
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        match self.get_by_id(id).await? {
            Some(existing) => self.repository.remove(&existing).await,
            None => Ok(false),
        }
    }
}
