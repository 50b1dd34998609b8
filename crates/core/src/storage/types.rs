use serde_json::Value;

use super::Filter;

/// A stored row: the entity key plus its serialized document.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub body: Value,
}

impl Record {
    pub fn new(key: impl Into<String>, body: Value) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }
}

/// What a staged change does to its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    /// Full-row overwrite of an existing row.
    Update,
    Delete,
}

/// A mutation staged on an entity context, waiting for commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub set: &'static str,
    pub entity_type: &'static str,
    pub key: String,
    /// Document to write; `None` for deletes.
    pub body: Option<Value>,
}

impl Change {
    pub fn insert(set: &'static str, entity_type: &'static str, record: Record) -> Self {
        Self {
            kind: ChangeKind::Insert,
            set,
            entity_type,
            key: record.key,
            body: Some(record.body),
        }
    }

    pub fn update(set: &'static str, entity_type: &'static str, record: Record) -> Self {
        Self {
            kind: ChangeKind::Update,
            set,
            entity_type,
            key: record.key,
            body: Some(record.body),
        }
    }

    pub fn delete(set: &'static str, entity_type: &'static str, key: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            set,
            entity_type,
            key: key.into(),
            body: None,
        }
    }
}

/// A read against one entity set.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub set: &'static str,
    pub filter: Option<Filter>,
    /// Maximum number of rows to return, in insertion order.
    pub limit: Option<usize>,
}

impl FetchRequest {
    pub fn all(set: &'static str) -> Self {
        Self {
            set,
            filter: None,
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
