//! SQL statements for the document tables.
//!
//! Table names are spliced into the statement text. Callers only pass set
//! names taken from a built `Model`, which are checked to be plain identifiers.

pub const PING: &str = "SELECT 1";

pub fn create_table(set: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {set} (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL
)"
    )
}

/// Rows in insertion order, optionally filtered and limited.
///
/// With `limited`, the last positional parameter is the row limit.
pub fn select(set: &str, predicate: Option<&str>, limited: bool) -> String {
    let mut sql = format!("SELECT key, body FROM {set}");
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    sql.push_str(" ORDER BY rowid");
    if limited {
        sql.push_str(" LIMIT ?");
    }
    sql
}

pub fn insert(set: &str) -> String {
    format!("INSERT INTO {set} (key, body) VALUES (?1, ?2)")
}

pub fn update(set: &str) -> String {
    format!("UPDATE {set} SET body = ?2 WHERE key = ?1")
}

pub fn delete(set: &str) -> String {
    format!("DELETE FROM {set} WHERE key = ?1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_without_predicate() {
        assert_eq!(
            select("placeholders", None, false),
            "SELECT key, body FROM placeholders ORDER BY rowid"
        );
    }

    #[test]
    fn test_select_with_predicate_and_limit() {
        assert_eq!(
            select("orders", Some("(x = ?)"), true),
            "SELECT key, body FROM orders WHERE (x = ?) ORDER BY rowid LIMIT ?"
        );
    }
}
