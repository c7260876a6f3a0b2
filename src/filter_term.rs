//! Filter-term shorthand.
//!
//! A term is a shell-quoted line `<filter_type> <field> <arg>...`:
//!
//! | Term | Clause |
//! |------|--------|
//! | `query message "disk full"` | `{"query_string": {"fields": ["message"], "query": "disk full"}}` |
//! | `term levelname ERROR` | `{"term": {"levelname": "ERROR"}}` |
//! | `terms levelname ERROR WARNING` | `{"terms": {"levelname": ["ERROR", "WARNING"]}}` |
//!
//! Terms are not validated against the backend's query language; any
//! `<filter_type>` other than `query` is passed through as the clause name.

use serde_json::{json, Map, Value};

use crate::error::GridError;
use crate::query::QuerySpec;

pub fn parse_filter_term(text: &str) -> Result<Value, GridError> {
    let parts = shell_words::split(text)
        .map_err(|e| GridError::malformed(format!("invalid filter term '{}': {}", text, e)))?;
    if parts.len() < 3 {
        return Err(GridError::malformed(format!(
            "filter term needs '<type> <field> <value>...', got '{}'",
            text
        )));
    }
    let (filter_type, field, args) = (&parts[0], &parts[1], &parts[2..]);

    let clause = if filter_type == "query" {
        json!({"query_string": {"fields": [field], "query": args[0]}})
    } else if args.len() > 1 {
        json!({ filter_type.as_str(): { field.as_str(): args } })
    } else {
        json!({ filter_type.as_str(): { field.as_str(): args[0] } })
    };
    Ok(clause)
}

/// Combine terms into `{"query": {"bool": {"filter": [...]}}}`.
///
/// Blank terms are skipped; an empty list yields `match_all`.
pub fn query_from_terms<S: AsRef<str>>(terms: &[S]) -> Result<QuerySpec, GridError> {
    let mut clauses = Vec::with_capacity(terms.len());
    for term in terms {
        let term: &str = term.as_ref();
        if term.trim().is_empty() {
            continue;
        }
        clauses.push(parse_filter_term(term)?);
    }

    let query = if clauses.is_empty() {
        json!({"match_all": {}})
    } else {
        json!({"bool": {"filter": clauses}})
    };
    let mut body = Map::new();
    body.insert("query".to_string(), query);
    Ok(QuerySpec::from_payload(body))
}
