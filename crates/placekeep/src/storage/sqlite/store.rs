//! SQLite store implementation.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tokio_rusqlite::Connection;

use placekeep_core::entity::Model;
use placekeep_core::storage::{
    Change, ChangeKind, FetchRequest, Record, RepositoryError, Result, Store,
};

use super::conversions::{filter_to_sql, row_to_record};
use super::error::{map_rusqlite_error_with_id, map_tokio_rusqlite_error};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based store.
///
/// One `tokio_rusqlite` connection; every statement runs on its background
/// thread. Each commit runs in one transaction.
pub struct SqliteStore {
    conn: Connection,
    sets: RwLock<HashSet<&'static str>>,
}

impl SqliteStore {
    /// Opens (or creates) a file-based database.
    ///
    /// `busy_timeout` bounds how long a write waits for a lock held by another
    /// connection.
    pub async fn open(path: &str, busy_timeout: Option<Duration>) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        Self::from_connection(conn, busy_timeout).await
    }

    /// Opens an in-memory database. Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        Self::from_connection(conn, None).await
    }

    async fn from_connection(conn: Connection, busy_timeout: Option<Duration>) -> Result<Self> {
        if let Some(timeout) = busy_timeout {
            conn.call(move |conn| conn.busy_timeout(timeout).map_err(wrap_err))
                .await
                .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        }
        Ok(Self {
            conn,
            sets: RwLock::new(HashSet::new()),
        })
    }

    /// Applies `changes` in one transaction on the connection thread.
    async fn apply(&self, changes: Vec<Change>) -> Result<usize> {
        self.conn
            .call(move |conn| Ok(apply_changes(conn, &changes)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "commit"))?
    }

    fn ensure_sets<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<()> {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        match names.find(|name| !sets.contains(*name)) {
            Some(unknown) => Err(RepositoryError::UnknownEntitySet(unknown.to_string())),
            None => Ok(()),
        }
    }
}

fn apply_changes(conn: &mut rusqlite::Connection, changes: &[Change]) -> Result<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let mut affected = 0;

    for change in changes {
        let on_error = |e: rusqlite::Error| {
            map_rusqlite_error_with_id(&e, change.entity_type, &change.key)
        };
        let rows = match change.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let body = change.body.as_ref().ok_or_else(|| {
                    RepositoryError::InvalidData(format!(
                        "{} {} has no document to write",
                        change.entity_type, change.key
                    ))
                })?;
                let sql = if change.kind == ChangeKind::Insert {
                    schema::insert(change.set)
                } else {
                    schema::update(change.set)
                };
                tx.execute(&sql, (&change.key, body.to_string()))
                    .map_err(on_error)?
            }
            ChangeKind::Delete => tx
                .execute(&schema::delete(change.set), [&change.key])
                .map_err(on_error)?,
        };
        affected += rows;
    }

    tx.commit()
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    Ok(affected)
}

#[async_trait]
impl Store for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn migrate(&self, model: &Model) -> Result<()> {
        let names: Vec<&'static str> = model.sets().map(|config| config.set_name).collect();
        let statements: Vec<String> = names.iter().map(|name| schema::create_table(name)).collect();

        self.conn
            .call(move |conn| {
                for statement in &statements {
                    conn.execute_batch(statement).map_err(wrap_err)?;
                }
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "schema"))?;

        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(names.iter().copied());
        tracing::debug!(sets = ?names, "Migrated SQLite schema");
        Ok(())
    }

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<Record>> {
        self.ensure_sets(std::iter::once(request.set))?;

        let mut params = Vec::new();
        let predicate = match &request.filter {
            Some(filter) => {
                filter.validate()?;
                Some(filter_to_sql(filter, &mut params))
            }
            None => None,
        };
        if let Some(limit) = request.limit {
            params.push(rusqlite::types::Value::Integer(
                i64::try_from(limit).unwrap_or(i64::MAX),
            ));
        }
        let sql = schema::select(request.set, predicate.as_deref(), request.limit.is_some());
        let set = request.set;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), row_to_record)
                    .map_err(wrap_err)?;
                let records = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(wrap_err)?;
                Ok(records)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, set))
    }

    /// Blocks the calling thread until the connection thread has committed.
    fn commit(&self, changes: &[Change]) -> Result<usize> {
        self.ensure_sets(changes.iter().map(|change| change.set))?;
        futures::executor::block_on(self.apply(changes.to_vec()))
    }

    async fn commit_async(&self, changes: Vec<Change>) -> Result<usize> {
        self.ensure_sets(changes.iter().map(|change| change.set))?;
        self.apply(changes).await
    }

    async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.query_row(schema::PING, [], |row| row.get::<_, i64>(0))
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placekeep_core::placeholder::Placeholder;
    use placekeep_core::storage::Filter;
    use serde_json::json;

    async fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let model = Model::builder().entity::<Placeholder>().build().unwrap();
        store.migrate(&model).await.unwrap();
        store
    }

    fn insert(body: serde_json::Value) -> Change {
        let key = body["id"].to_string();
        Change::insert("placeholders", "Placeholder", Record::new(key, body))
    }

    fn keys(rows: &[Record]) -> Vec<&str> {
        rows.iter().map(|r| r.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_commit_and_fetch_in_insertion_order() {
        let store = store().await;
        let affected = store
            .commit_async(vec![
                insert(json!({ "id": 2, "name": "b" })),
                insert(json!({ "id": 1, "name": "a" })),
            ])
            .await
            .unwrap();

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();

        assert_eq!(affected, 2);
        assert_eq!(keys(&rows), vec!["2", "1"]);
        assert_eq!(rows[1].body, json!({ "id": 1, "name": "a" }));
    }

    #[tokio::test]
    async fn test_filter_runs_in_sql() {
        let store = store().await;
        store
            .commit_async(vec![
                insert(json!({ "id": 1, "name": "alpha", "description": null })),
                insert(json!({ "id": 2, "name": "beta", "description": "x" })),
                insert(json!({ "id": 3, "name": "alpha" })),
            ])
            .await
            .unwrap();

        let by_name = FetchRequest::all("placeholders")
            .with_filter(Some(Filter::eq("name", "alpha").and(Filter::gt("id", 1))));
        let nulls =
            FetchRequest::all("placeholders").with_filter(Some(Filter::is_null("description")));
        let not_null = FetchRequest::all("placeholders")
            .with_filter(Some(Filter::is_null("description").negate()));
        let limited = FetchRequest::all("placeholders").with_limit(2);

        assert_eq!(keys(&store.fetch(by_name).await.unwrap()), vec!["3"]);
        assert_eq!(keys(&store.fetch(nulls).await.unwrap()), vec!["1", "3"]);
        assert_eq!(keys(&store.fetch(not_null).await.unwrap()), vec!["2"]);
        assert_eq!(keys(&store.fetch(limited).await.unwrap()), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_type_mismatch_never_matches() {
        let store = store().await;
        store
            .commit_async(vec![insert(json!({ "id": 1, "name": "5" }))])
            .await
            .unwrap();

        let numeric = FetchRequest::all("placeholders").with_filter(Some(Filter::lt("name", 10)));
        let negated = FetchRequest::all("placeholders")
            .with_filter(Some(Filter::lt("name", 10).negate()));

        assert!(store.fetch(numeric).await.unwrap().is_empty());
        assert_eq!(store.fetch(negated).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_rolls_back_batch() {
        let store = store().await;
        store
            .commit_async(vec![insert(json!({ "id": 1 }))])
            .await
            .unwrap();

        let result = store.commit(&[
            insert(json!({ "id": 2 })),
            insert(json!({ "id": 1, "name": "again" })),
        ]);

        assert_eq!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Placeholder",
                id: "1".to_string()
            })
        );
        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(keys(&rows), vec!["1"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_count_rows() {
        let store = store().await;
        store
            .commit_async(vec![insert(json!({ "id": 1, "name": "a" }))])
            .await
            .unwrap();

        let affected = store
            .commit_async(vec![
                Change::update(
                    "placeholders",
                    "Placeholder",
                    Record::new("1", json!({ "id": 1, "name": "b" })),
                ),
                Change::update(
                    "placeholders",
                    "Placeholder",
                    Record::new("9", json!({ "id": 9 })),
                ),
                Change::delete("placeholders", "Placeholder", "8"),
            ])
            .await
            .unwrap();

        assert_eq!(affected, 1);
        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(rows[0].body["name"], "b");
    }

    #[tokio::test]
    async fn test_unmigrated_set_is_rejected() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let result = store.fetch(FetchRequest::all("placeholders")).await;

        assert_eq!(
            result,
            Err(RepositoryError::UnknownEntitySet("placeholders".to_string()))
        );
    }

    #[tokio::test]
    async fn test_ping() {
        let store = store().await;
        assert!(store.ping().await.is_ok());
        assert_eq!(store.backend_name(), "sqlite");
    }
}
