//! Application state shared by all request handlers.
//!
//! Holds the context factory over the selected storage backend. Each request
//! gets its own [`UnitOfWork`] built from it.

use std::sync::Arc;
use std::time::Duration;

use placekeep::data::{service_model, ContextFactory, ContextOptions, UnitOfWork};
use placekeep_core::entity::Model;
use placekeep_core::storage::{RepositoryError, Store};

use crate::config::Config;

/// Shared application state.
///
/// Cheap to clone: the store and model sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    contexts: ContextFactory,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        model: Model,
        options: ContextOptions,
        request_timeout: Duration,
    ) -> Self {
        Self {
            contexts: ContextFactory::new(store, model, options),
            request_timeout,
        }
    }

    /// Opens the configured backend and creates the tables of every entity set.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = service_model()?;
        let store = open_store(config).await?;
        store.migrate(&model).await?;

        tracing::info!(backend = store.backend_name(), "Storage ready");

        let options = ContextOptions {
            command_timeout: config.command_timeout(),
        };
        Ok(Self::new(store, model, options, config.request_timeout()))
    }

    /// A fresh unit of work over its own entity context.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.contexts.create())
    }

    pub fn backend_name(&self) -> &'static str {
        self.contexts.store().backend_name()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Checks that the store answers, under the storage call deadline.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        let ping = self.contexts.store().ping();
        match self.contexts.options().command_timeout {
            Some(limit) => tokio::time::timeout(limit, ping)
                .await
                .map_err(|_| RepositoryError::Timeout(limit.as_millis() as u64))?,
            None => ping.await,
        }
    }

    /// State over an in-memory store with the service model.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        use placekeep::storage::inmemory::InMemoryStore;

        let model = service_model().unwrap();
        let store = InMemoryStore::for_model(&model);
        Self::new(
            Arc::new(store),
            model,
            ContextOptions::default(),
            Duration::from_secs(10),
        )
    }
}

#[cfg(feature = "inmemory")]
async fn open_store(_config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    use placekeep::storage::inmemory::InMemoryStore;

    Ok(Arc::new(InMemoryStore::new()))
}

#[cfg(feature = "sqlite")]
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    use placekeep::storage::sqlite::SqliteStore;

    tracing::info!(path = %config.sqlite_path, "Opening SQLite database");
    let store = SqliteStore::open(&config.sqlite_path, config.command_timeout()).await?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use placekeep_core::placeholder::Placeholder;

    #[tokio::test]
    async fn test_units_of_work_share_the_store() {
        let state = AppState::in_memory();
        let writer = state.unit_of_work();
        writer
            .repository::<Placeholder>()
            .unwrap()
            .add(&Placeholder::new(1, "shared"))
            .await
            .unwrap();

        let reader = state.unit_of_work();
        let all = reader.repository::<Placeholder>().unwrap().get_all().await.unwrap();

        assert_eq!(all, vec![Placeholder::new(1, "shared")]);
    }

    #[tokio::test]
    async fn test_from_config_migrates_selected_backend() {
        let config = Config {
            sqlite_path: ":memory:".to_string(),
            command_timeout_ms: 1_000,
            request_timeout_secs: 3,
        };

        let state = AppState::from_config(&config).await.unwrap();

        assert!(state.ping().await.is_ok());
        assert_eq!(state.request_timeout(), Duration::from_secs(3));
        let uow = state.unit_of_work();
        let all = uow.repository::<Placeholder>().unwrap().get_all().await.unwrap();
        assert!(all.is_empty());
    }
}
