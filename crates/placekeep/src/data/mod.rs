//! Data access layer: entity contexts, generic repositories and the unit of work.
//!
//! A [`UnitOfWork`] owns one [`DataContext`] and hands out repositories bound
//! to it. Repositories hold only a weak reference to the context, so they stop
//! working once the unit of work is disposed.

mod context;
mod placeholders;
mod query;
mod repository;
mod transaction;
mod unit_of_work;

pub use context::{ContextFactory, ContextOptions, DataContext, EntitySet};
pub use placeholders::GenericPlaceholderRepository;
pub use query::Query;
pub use repository::{GenericRepository, Repository};
pub use unit_of_work::{CustomRepositories, UnitOfWork};

/// Builds the model of every entity set the service stores.
pub fn service_model() -> placekeep_core::storage::Result<placekeep_core::entity::Model> {
    placekeep_core::entity::Model::builder()
        .entity::<placekeep_core::placeholder::Placeholder>()
        .build()
}
