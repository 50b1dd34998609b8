//! SQLite conversion functions.
//!
//! Pure functions: filters to SQL predicates, literals to SQL values, rows to
//! records. Testable without database access.

use rusqlite::types::{Type, Value};
use rusqlite::Row;

use placekeep_core::storage::{FieldValue, Filter, Record};

/// Compiles a validated filter to a predicate over the `body` column.
///
/// Literals are appended to `params` in the order their `?` placeholders
/// appear. Each comparison first checks the JSON type of the field so that a
/// missing field, a `null` or a value of another type never matches.
pub fn filter_to_sql(filter: &Filter, params: &mut Vec<Value>) -> String {
    match filter {
        Filter::Compare { field, op, value } => {
            let guard = match value {
                FieldValue::Text(_) => "= 'text'",
                _ => "IN ('integer', 'real', 'true', 'false')",
            };
            params.push(to_sql_value(value));
            format!(
                "(json_type(body, '$.{field}') {guard} AND json_extract(body, '$.{field}') {} ?)",
                op.as_sql()
            )
        }
        Filter::IsNull(field) => {
            format!("(COALESCE(json_type(body, '$.{field}'), 'null') = 'null')")
        }
        Filter::And(left, right) => {
            let left = filter_to_sql(left, params);
            let right = filter_to_sql(right, params);
            format!("({left} AND {right})")
        }
        Filter::Or(left, right) => {
            let left = filter_to_sql(left, params);
            let right = filter_to_sql(right, params);
            format!("({left} OR {right})")
        }
        Filter::Not(inner) => format!("(NOT COALESCE({}, 0))", filter_to_sql(inner, params)),
    }
}

/// Converts a filter literal to the value bound for its placeholder.
pub fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Integer(i) => Value::Integer(*i),
        FieldValue::Real(r) => Value::Real(*r),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
    }
}

/// Convert a SQLite row to a Record.
///
/// Expected columns: key, body
pub fn row_to_record(row: &Row) -> rusqlite::Result<Record> {
    let key: String = row.get(0)?;
    let body: String = row.get(1)?;

    let body = serde_json::from_str(&body)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(Record::new(key, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_binds_literal() {
        let mut params = Vec::new();
        let sql = filter_to_sql(&Filter::eq("name", "Ada"), &mut params);

        assert_eq!(
            sql,
            "(json_type(body, '$.name') = 'text' AND json_extract(body, '$.name') = ?)"
        );
        assert_eq!(params, vec![Value::Text("Ada".to_string())]);
    }

    #[test]
    fn test_params_follow_placeholder_order() {
        let mut params = Vec::new();
        let filter = Filter::gt("id", 1).and(Filter::lt("id", 5).or(Filter::eq("active", true)));

        let sql = filter_to_sql(&filter, &mut params);

        assert_eq!(sql.matches('?').count(), 3);
        assert_eq!(
            params,
            vec![Value::Integer(1), Value::Integer(5), Value::Integer(1)]
        );
    }

    #[test]
    fn test_not_and_is_null() {
        let mut params = Vec::new();
        let sql = filter_to_sql(&Filter::is_null("description").negate(), &mut params);

        assert_eq!(
            sql,
            "(NOT COALESCE((COALESCE(json_type(body, '$.description'), 'null') = 'null'), 0))"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value(&FieldValue::Real(1.5)), Value::Real(1.5));
        assert_eq!(to_sql_value(&FieldValue::Bool(false)), Value::Integer(0));
    }
}
