//! One query response, viewed as a table.
//!
//! The column set is inferred from the documents themselves: it is the
//! sorted union of the `_source` keys of every hit, recomputed on every
//! construction. A document that lacks a column simply has no value there.
//!
//! A [`ResultSet`] is immutable once built, so it can be shared between
//! views behind an `Arc` without further synchronisation.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::GridError;

/// One hit's source record.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    documents: Vec<Document>,
    fields: Vec<String>,
    total: u64,
}

impl ResultSet {
    /// Build a result set from documents already extracted from a response.
    pub fn new(documents: Vec<Document>, total: u64) -> Self {
        let fields = collect_fields(&documents);
        Self {
            documents,
            fields,
            total,
        }
    }

    /// Parse a raw `_search` response body.
    ///
    /// Expected shape: `{"hits": {"total": N, "hits": [{"_source": {...}}, ...]}}`.
    /// `total` may also be the `{"value": N, ...}` object newer backends send.
    /// Missing or mis-shaped parts degrade to an empty result (or an empty
    /// document for a hit without an object `_source`). An empty body is an
    /// empty result.
    ///
    /// # Errors
    ///
    /// [`GridError::BackendError`] when the bytes are not JSON at all.
    pub fn from_bytes(body: &[u8]) -> Result<Self, GridError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let json: Value = serde_json::from_slice(body).map_err(|e| GridError::BackendError {
            status: None,
            message: format!("unparsable response body: {}", e),
        })?;
        Ok(Self::from_response(&json))
    }

    /// Extract documents and total from an already-parsed response.
    pub fn from_response(json: &Value) -> Self {
        let hits = json.get("hits");
        let total = hits.and_then(|h| h.get("total")).map_or(0, parse_total);
        let documents: Vec<Document> = hits
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|hit| {
                        hit.get("_source")
                            .and_then(Value::as_object)
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self::new(documents, total)
    }

    pub fn row_count(&self) -> usize {
        self.documents.len()
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Sorted union of field names across all documents.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Column index of `field`, if any document carries it.
    pub fn column_of(&self, field: &str) -> Option<usize> {
        self.fields
            .binary_search_by(|f| f.as_str().cmp(field))
            .ok()
    }

    /// Match count reported by the backend; may exceed [`row_count`](Self::row_count).
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, row: usize) -> Option<&Document> {
        self.documents.get(row)
    }

    /// Raw value of `fields[column]` in `documents[row]`.
    ///
    /// `None` when the row or column is out of range or the document lacks
    /// the field.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        let field = self.fields.get(column)?;
        self.documents.get(row)?.get(field)
    }

    /// Grid summary of a cell: the first line of a string value.
    ///
    /// Non-string values have no summary; they are only shown by
    /// [`row_detail_text`](Self::row_detail_text).
    pub fn display_cell(&self, row: usize, column: usize) -> Option<&str> {
        match self.cell(row, column)? {
            Value::String(s) => Some(first_line(s)),
            _ => None,
        }
    }

    /// Pretty-printed source record with keys sorted at every level.
    pub fn row_detail_text(&self, row: usize) -> Option<String> {
        let doc = self.documents.get(row)?;
        let canonical = canonicalize(&Value::Object(doc.clone()));
        serde_json::to_string_pretty(&canonical).ok()
    }
}

fn collect_fields(documents: &[Document]) -> Vec<String> {
    let set: BTreeSet<&String> = documents.iter().flat_map(|d| d.keys()).collect();
    set.into_iter().cloned().collect()
}

fn parse_total(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::Object(o) => o.get("value").and_then(Value::as_u64).unwrap_or(0),
        _ => 0,
    }
}

fn first_line(s: &str) -> &str {
    s.split('\n').next().unwrap_or(s).trim_end_matches('\r')
}

/// Rebuild objects so key order does not depend on how the map was built.
fn canonicalize(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(sources: Vec<Value>, total: Value) -> Vec<u8> {
        let hits: Vec<Value> = sources.into_iter().map(|s| json!({"_source": s})).collect();
        serde_json::to_vec(&json!({"hits": {"total": total, "hits": hits}})).unwrap()
    }

    #[test]
    fn test_fields_are_sorted_union() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"a": 1}), json!({"b": 2})],
            json!(2),
        ))
        .unwrap();
        assert_eq!(rs.fields(), &["a".to_string(), "b".to_string()]);
        assert_eq!(rs.cell(0, 1), None);
        assert_eq!(rs.cell(1, 1), Some(&json!(2)));
    }

    #[test]
    fn test_fields_union_heterogeneous() {
        let docs = vec![
            json!({"zeta": 1, "alpha": "x"}),
            json!({"mid": true}),
            json!({}),
            json!({"alpha": "y", "beta": null}),
        ];
        let rs = ResultSet::from_bytes(&response(docs.clone(), json!(4))).unwrap();
        let mut expected: Vec<String> = docs
            .iter()
            .flat_map(|d| d.as_object().unwrap().keys().cloned())
            .collect();
        expected.sort();
        expected.dedup();
        assert_eq!(rs.fields(), expected.as_slice());

        for row in 0..rs.row_count() {
            for col in 0..rs.column_count() {
                let field = &rs.fields()[col];
                let has = docs[row].as_object().unwrap().contains_key(field);
                assert_eq!(rs.cell(row, col).is_some(), has, "row {} col {}", row, col);
            }
        }
    }

    #[test]
    fn test_out_of_range_cell_is_absent() {
        let rs = ResultSet::from_bytes(&response(vec![json!({"a": 1})], json!(1))).unwrap();
        assert_eq!(rs.cell(5, 0), None);
        assert_eq!(rs.cell(0, 5), None);
        assert_eq!(rs.row_detail_text(9), None);
    }

    #[test]
    fn test_multiline_string_summarised_to_first_line() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"message": "line1\nline2"})],
            json!(1),
        ))
        .unwrap();
        assert_eq!(rs.display_cell(0, 0), Some("line1"));
        let detail = rs.row_detail_text(0).unwrap();
        assert!(detail.contains("line1\\nline2"));
    }

    #[test]
    fn test_non_string_values_have_no_summary() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"n": 3, "obj": {"k": "v"}, "s": "text"})],
            json!(1),
        ))
        .unwrap();
        assert_eq!(rs.display_cell(0, 0), None);
        assert_eq!(rs.display_cell(0, 1), None);
        assert_eq!(rs.display_cell(0, 2), Some("text"));
        assert!(rs.row_detail_text(0).unwrap().contains("\"k\": \"v\""));
    }

    #[test]
    fn test_detail_text_is_sorted_and_stable() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"b": 1, "a": {"y": 2, "x": 1}})],
            json!(1),
        ))
        .unwrap();
        let first = rs.row_detail_text(0).unwrap();
        let second = rs.row_detail_text(0).unwrap();
        assert_eq!(first, second);
        let a = first.find("\"a\"").unwrap();
        let b = first.find("\"b\"").unwrap();
        let x = first.find("\"x\"").unwrap();
        let y = first.find("\"y\"").unwrap();
        assert!(a < b);
        assert!(x < y);
    }

    #[test]
    fn test_total_accepts_object_form() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"a": 1})],
            json!({"value": 1234, "relation": "eq"}),
        ))
        .unwrap();
        assert_eq!(rs.total(), 1234);
        assert_eq!(rs.row_count(), 1);
    }

    #[test]
    fn test_malformed_shape_degrades_to_empty() {
        for body in [
            json!({}),
            json!({"hits": "nope"}),
            json!({"hits": {"hits": 3}}),
            json!([1, 2, 3]),
        ] {
            let rs = ResultSet::from_bytes(&serde_json::to_vec(&body).unwrap()).unwrap();
            assert_eq!(rs.row_count(), 0);
            assert_eq!(rs.column_count(), 0);
            assert_eq!(rs.total(), 0);
        }
    }

    #[test]
    fn test_hit_without_source_is_empty_row() {
        let body = json!({"hits": {"total": 2, "hits": [{"_id": "1"}, {"_source": {"a": "x"}}]}});
        let rs = ResultSet::from_bytes(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs.fields(), &["a".to_string()]);
        assert_eq!(rs.cell(0, 0), None);
    }

    #[test]
    fn test_empty_body_is_empty_result() {
        let rs = ResultSet::from_bytes(b"").unwrap();
        assert_eq!(rs, ResultSet::default());
    }

    #[test]
    fn test_unparsable_body_is_backend_error() {
        let err = ResultSet::from_bytes(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BackendError);
    }

    #[test]
    fn test_column_of() {
        let rs = ResultSet::from_bytes(&response(
            vec![json!({"asctime": "t", "message": "m", "levelname": "INFO"})],
            json!(1),
        ))
        .unwrap();
        assert_eq!(rs.column_of("levelname"), Some(1));
        assert_eq!(rs.column_of("missing"), None);
        assert_eq!(rs.field(2), Some("message"));
    }
}
