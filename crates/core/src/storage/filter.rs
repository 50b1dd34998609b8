//! Filter expressions evaluated by the storage backend.
//!
//! A [`Filter`] is plain data: backends either evaluate it in place
//! ([`Filter::matches`]) or compile it to their own query language, so rows are
//! never materialized before filtering.
//!
//! Semantics shared by every backend:
//! - a comparison against a missing or `null` field is false
//! - a comparison between different value types is false
//! - numbers compare numerically, with booleans counting as 1 and 0
//! - text compares lexicographically

use std::cmp::Ordering;

use serde_json::Value;

use super::{RepositoryError, Result};

/// A literal value a field can be compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Comparison operator for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
        }
    }
}

/// A predicate over the top-level fields of a stored entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        field: String,
        op: Comparison,
        value: FieldValue,
    },
    IsNull(String),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    fn compare(field: impl Into<String>, op: Comparison, value: impl Into<FieldValue>) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Ge, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Checks that every referenced field name is a plain identifier.
    ///
    /// Backends splice field names into query text, so this must pass before
    /// a filter reaches them.
    pub fn validate(&self) -> Result<()> {
        match self {
            Filter::Compare { field, .. } | Filter::IsNull(field) => validate_field_name(field),
            Filter::And(left, right) | Filter::Or(left, right) => {
                left.validate()?;
                right.validate()
            }
            Filter::Not(inner) => inner.validate(),
        }
    }

    /// Evaluates the filter against a JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::Compare { field, op, value } => document
                .get(field)
                .and_then(|actual| compare_value(actual, value))
                .is_some_and(|ordering| op.accepts(ordering)),
            Filter::IsNull(field) => document.get(field).is_none_or(Value::is_null),
            Filter::And(left, right) => left.matches(document) && right.matches(document),
            Filter::Or(left, right) => left.matches(document) || right.matches(document),
            Filter::Not(inner) => !inner.matches(document),
        }
    }
}

/// Returns `Ok` when `name` looks like `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_field_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidFilter(format!(
            "field name {name:?} is not a plain identifier"
        )))
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn compare_value(actual: &Value, expected: &FieldValue) -> Option<Ordering> {
    match expected {
        FieldValue::Text(text) => actual.as_str().map(|s| s.cmp(text.as_str())),
        FieldValue::Integer(i) => match actual.as_i64() {
            Some(n) => Some(n.cmp(i)),
            None => numeric(actual)?.partial_cmp(&(*i as f64)),
        },
        FieldValue::Real(r) => numeric(actual)?.partial_cmp(r),
        FieldValue::Bool(b) => numeric(actual)?.partial_cmp(&if *b { 1.0 } else { 0.0 }),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "id": 7,
            "name": "Gamma",
            "score": 2.5,
            "active": true,
            "description": null
        })
    }

    #[test]
    fn test_eq_matches_integer_field() {
        assert!(Filter::eq("id", 7).matches(&doc()));
        assert!(!Filter::eq("id", 8).matches(&doc()));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let doc = json!({ "id": 9_007_199_254_740_993_i64 });

        assert!(Filter::eq("id", 9_007_199_254_740_993_i64).matches(&doc));
        assert!(!Filter::eq("id", 9_007_199_254_740_992_i64).matches(&doc));
        assert!(Filter::gt("id", 9_007_199_254_740_992_i64).matches(&doc));
    }

    #[test]
    fn test_text_comparisons_are_lexicographic() {
        assert!(Filter::eq("name", "Gamma").matches(&doc()));
        assert!(Filter::gt("name", "Alpha").matches(&doc()));
        assert!(Filter::lt("name", "Zeta").matches(&doc()));
    }

    #[test]
    fn test_real_and_integer_compare_numerically() {
        assert!(Filter::gt("score", 2).matches(&doc()));
        assert!(Filter::le("score", 2.5).matches(&doc()));
        assert!(Filter::ge("id", 7.0).matches(&doc()));
    }

    #[test]
    fn test_bool_compares_as_one_or_zero() {
        assert!(Filter::eq("active", true).matches(&doc()));
        assert!(Filter::eq("active", 1).matches(&doc()));
        assert!(!Filter::eq("active", false).matches(&doc()));
    }

    #[test]
    fn test_missing_and_null_fields_never_compare() {
        assert!(!Filter::eq("missing", 1).matches(&doc()));
        assert!(!Filter::ne("missing", 1).matches(&doc()));
        assert!(!Filter::eq("description", "x").matches(&doc()));
        assert!(!Filter::ne("description", "x").matches(&doc()));
    }

    #[test]
    fn test_type_mismatch_never_compares() {
        assert!(!Filter::eq("name", 7).matches(&doc()));
        assert!(!Filter::ne("id", "7").matches(&doc()));
    }

    #[test]
    fn test_negated_unknown_comparison_is_true() {
        assert!(Filter::eq("missing", 1).negate().matches(&doc()));
    }

    #[test]
    fn test_is_null_matches_missing_and_null() {
        assert!(Filter::is_null("description").matches(&doc()));
        assert!(Filter::is_null("missing").matches(&doc()));
        assert!(!Filter::is_null("name").matches(&doc()));
    }

    #[test]
    fn test_boolean_composition() {
        let filter = Filter::eq("id", 7).and(Filter::eq("name", "Gamma"));
        assert!(filter.matches(&doc()));

        let filter = Filter::eq("id", 1).or(Filter::eq("name", "Gamma"));
        assert!(filter.matches(&doc()));

        let filter = Filter::eq("id", 1).and(Filter::eq("name", "Gamma"));
        assert!(!filter.matches(&doc()));
    }

    #[test]
    fn test_validate_accepts_identifiers() {
        let filter = Filter::eq("id", 1).and(Filter::is_null("_private_2").negate());
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_injection_attempts() {
        for field in ["", "1abc", "name')--", "a.b", "na me"] {
            let result = Filter::eq(field, 1).validate();
            assert!(
                matches!(result, Err(RepositoryError::InvalidFilter(_))),
                "{field:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_checks_nested_fields() {
        let filter = Filter::eq("id", 1).or(Filter::eq("bad field", 2));
        assert!(filter.validate().is_err());
    }
}
