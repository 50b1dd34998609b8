//! In-memory store implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use placekeep_core::entity::Model;
use placekeep_core::storage::{
    Change, ChangeKind, FetchRequest, Record, RepositoryError, Result, Store,
};

/// Rows of one entity set, kept in insertion order.
#[derive(Debug, Default)]
struct Table {
    next_seq: u64,
    rows: BTreeMap<u64, Record>,
    index: HashMap<String, u64>,
}

/// Reverses one applied change.
#[derive(Debug)]
enum Undo {
    Insert { key: String, seq: u64 },
    Update { seq: u64, body: serde_json::Value },
    Delete { key: String, seq: u64, record: Record },
}

impl Table {
    fn apply(&mut self, change: &Change) -> Result<(usize, Option<Undo>)> {
        match change.kind {
            ChangeKind::Insert => {
                if self.index.contains_key(&change.key) {
                    return Err(RepositoryError::AlreadyExists {
                        entity_type: change.entity_type,
                        id: change.key.clone(),
                    });
                }
                let body = body_of(change)?;
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(change.key.clone(), seq);
                self.rows.insert(seq, Record::new(change.key.clone(), body));
                let undo = Undo::Insert {
                    key: change.key.clone(),
                    seq,
                };
                Ok((1, Some(undo)))
            }
            ChangeKind::Update => {
                let Some(&seq) = self.index.get(&change.key) else {
                    return Ok((0, None));
                };
                let Some(row) = self.rows.get_mut(&seq) else {
                    return Ok((0, None));
                };
                let previous = std::mem::replace(&mut row.body, body_of(change)?);
                Ok((
                    1,
                    Some(Undo::Update {
                        seq,
                        body: previous,
                    }),
                ))
            }
            ChangeKind::Delete => match self.index.remove(&change.key) {
                Some(seq) => match self.rows.remove(&seq) {
                    Some(record) => Ok((
                        1,
                        Some(Undo::Delete {
                            key: change.key.clone(),
                            seq,
                            record,
                        }),
                    )),
                    None => Ok((0, None)),
                },
                None => Ok((0, None)),
            },
        }
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Insert { key, seq } => {
                self.index.remove(&key);
                self.rows.remove(&seq);
            }
            Undo::Update { seq, body } => {
                if let Some(row) = self.rows.get_mut(&seq) {
                    row.body = body;
                }
            }
            Undo::Delete { key, seq, record } => {
                self.index.insert(key, seq);
                self.rows.insert(seq, record);
            }
        }
    }
}

fn body_of(change: &Change) -> Result<serde_json::Value> {
    change.body.clone().ok_or_else(|| {
        RepositoryError::InvalidData(format!(
            "{} {} has no document to write",
            change.entity_type, change.key
        ))
    })
}

type Tables = HashMap<&'static str, Table>;

/// In-memory storage backend.
///
/// Uses a `HashMap` of tables wrapped in `Arc<RwLock<_>>`. Clones share the
/// same data. Commits are applied in place; if a change fails, the changes
/// already applied in that batch are reverted before the lock is released.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store with no entity sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with an empty table for every set in `model`.
    pub fn for_model(model: &Model) -> Self {
        let store = Self::new();
        store.create_tables(model);
        store
    }

    fn create_tables(&self, model: &Model) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        for config in model.sets() {
            tables.entry(config.set_name).or_default();
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "inmemory"
    }

    async fn migrate(&self, model: &Model) -> Result<()> {
        self.create_tables(model);
        Ok(())
    }

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<Record>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get(request.set)
            .ok_or_else(|| RepositoryError::UnknownEntitySet(request.set.to_string()))?;

        let matching = table
            .rows
            .values()
            .filter(|record| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(&record.body))
            })
            .take(request.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(matching)
    }

    fn commit(&self, changes: &[Change]) -> Result<usize> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut applied: Vec<(&'static str, Undo)> = Vec::new();
        let mut affected = 0;

        for change in changes {
            let outcome = match tables.get_mut(change.set) {
                Some(table) => table.apply(change),
                None => Err(RepositoryError::UnknownEntitySet(change.set.to_string())),
            };
            match outcome {
                Ok((rows, undo)) => {
                    affected += rows;
                    applied.extend(undo.map(|undo| (change.set, undo)));
                }
                Err(e) => {
                    for (set, undo) in applied.into_iter().rev() {
                        if let Some(table) = tables.get_mut(set) {
                            table.revert(undo);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(affected)
    }

    async fn commit_async(&self, changes: Vec<Change>) -> Result<usize> {
        self.commit(&changes)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placekeep_core::placeholder::Placeholder;
    use placekeep_core::storage::Filter;
    use serde_json::json;

    fn store() -> InMemoryStore {
        let model = Model::builder().entity::<Placeholder>().build().unwrap();
        InMemoryStore::for_model(&model)
    }

    fn insert(id: i32, name: &str) -> Change {
        Change::insert(
            "placeholders",
            "Placeholder",
            Record::new(id.to_string(), json!({ "id": id, "name": name })),
        )
    }

    #[tokio::test]
    async fn test_insert_and_fetch_in_insertion_order() {
        let store = store();
        let affected = store
            .commit(&[insert(3, "c"), insert(1, "a"), insert(2, "b")])
            .unwrap();
        assert_eq!(affected, 3);

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_fetch_applies_filter_and_limit() {
        let store = store();
        store
            .commit(&[insert(1, "a"), insert(2, "b"), insert(3, "b")])
            .unwrap();

        let request = FetchRequest::all("placeholders")
            .with_filter(Some(Filter::eq("name", "b")))
            .with_limit(1);
        let rows = store.fetch(request).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "2");
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_store_untouched() {
        let store = store();
        store.commit(&[insert(1, "a")]).unwrap();

        let result = store.commit(&[insert(2, "b"), insert(1, "again")]);

        assert_eq!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Placeholder",
                id: "1".to_string()
            })
        );
        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_reverts_updates_and_deletes() {
        let store = store();
        store.commit(&[insert(1, "a"), insert(2, "b")]).unwrap();

        let result = store.commit(&[
            Change::update(
                "placeholders",
                "Placeholder",
                Record::new("1", json!({ "id": 1, "name": "changed" })),
            ),
            Change::delete("placeholders", "Placeholder", "2"),
            insert(3, "c"),
            insert(1, "duplicate"),
        ]);

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(rows[0].body["name"], "a");
        assert_eq!(rows[1].body["name"], "b");
    }

    #[tokio::test]
    async fn test_many_single_row_commits() {
        let store = store();
        for id in 0..1_000 {
            assert_eq!(store.commit(&[insert(id, "row")]).unwrap(), 1);
        }

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(rows.len(), 1_000);
        assert_eq!(rows[999].key, "999");
    }

    #[tokio::test]
    async fn test_update_keeps_position_and_missing_rows_count_zero() {
        let store = store();
        store.commit(&[insert(1, "a"), insert(2, "b")]).unwrap();

        let update = Change::update(
            "placeholders",
            "Placeholder",
            Record::new("1", json!({ "id": 1, "name": "z" })),
        );
        let missing = Change::update(
            "placeholders",
            "Placeholder",
            Record::new("9", json!({ "id": 9 })),
        );
        assert_eq!(store.commit(&[update, missing]).unwrap(), 1);

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(rows[0].body["name"], "z");
        assert_eq!(rows[1].key, "2");
    }

    #[tokio::test]
    async fn test_delete_counts_only_existing_rows() {
        let store = store();
        store.commit(&[insert(1, "a")]).unwrap();

        let affected = store
            .commit_async(vec![
                Change::delete("placeholders", "Placeholder", "1"),
                Change::delete("placeholders", "Placeholder", "1"),
            ])
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_reinserted_key_moves_to_end() {
        let store = store();
        store.commit(&[insert(1, "a"), insert(2, "b")]).unwrap();
        store
            .commit(&[Change::delete("placeholders", "Placeholder", "1"), insert(1, "a")])
            .unwrap();

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_unknown_set_is_rejected() {
        let store = InMemoryStore::new();

        let fetched = store.fetch(FetchRequest::all("placeholders")).await;
        let committed = store.commit(&[insert(1, "a")]);

        assert!(matches!(fetched, Err(RepositoryError::UnknownEntitySet(_))));
        assert!(matches!(committed, Err(RepositoryError::UnknownEntitySet(_))));
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = store();
        store.commit(&[insert(1, "a")]).unwrap();
        let model = Model::builder().entity::<Placeholder>().build().unwrap();

        store.migrate(&model).await.unwrap();

        let rows = store.fetch(FetchRequest::all("placeholders")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store.ping().await.is_ok());
        assert_eq!(store.backend_name(), "inmemory");
    }
}
