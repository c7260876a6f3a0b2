//! Query construction.
//!
//! A [`QuerySpec`] is the raw filter body the caller typed plus the three
//! keys the grid manages itself: `sort`, `size` and `from`. On
//! [`serialize`](QuerySpec::serialize) the builder's values are merged on top
//! of the caller's body; every other top-level key is passed through as-is.
//!
//! ```rust
//! use flubber::query::{QuerySpec, SortDirection};
//!
//! let spec = QuerySpec::parse(r#"{"query": {"match_all": {}}}  # everything"#)
//!     .unwrap()
//!     .with_sort("asctime", SortDirection::Descending);
//! let body = spec.serialize();
//! assert_eq!(body["sort"]["asctime"], "desc");
//! assert_eq!(body["size"], 100);
//! ```

use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::GridError;

/// Page size used when the query body does not carry `size`.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Wire representation understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!(
                "unknown sort direction '{}'. Use asc or desc.",
                other
            )),
        }
    }
}

/// Single-column sort override held by a [`QuerySpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Builder for one outstanding query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    filter: Map<String, Value>,
    sort: Option<SortKey>,
    page_size: u64,
    offset: u64,
}

impl QuerySpec {
    /// Build a spec from an already-parsed query body.
    ///
    /// Integer `size` / `from` keys in the body seed the page size and
    /// offset; anything else the body carries is kept verbatim.
    pub fn from_payload(filter: Map<String, Value>) -> Self {
        let page_size = filter
            .get("size")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = filter.get("from").and_then(Value::as_u64).unwrap_or(0);
        Self {
            filter,
            sort: None,
            page_size,
            offset,
        }
    }

    /// Parse human-edited query text.
    ///
    /// Everything from the first `#` to the end of each line is dropped
    /// before the text is parsed as JSON. The result must be a JSON object.
    ///
    /// # Errors
    ///
    /// [`GridError::MalformedQuery`] with the 1-based line and column of the
    /// failure in `raw`.
    pub fn parse(raw: &str) -> Result<Self, GridError> {
        let stripped = strip_comments(raw);
        let value: Value = serde_json::from_str(&stripped).map_err(|e| {
            GridError::MalformedQuery {
                line: e.line(),
                column: e.column(),
                message: error_message(&e),
            }
        })?;
        match value {
            Value::Object(map) => Ok(Self::from_payload(map)),
            other => Err(GridError::malformed(format!(
                "query must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Replace any previous sort with a sort on `field`.
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn clear_sort(mut self) -> Self {
        self.sort = None;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn filter_payload(&self) -> &Map<String, Value> {
        &self.filter
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Produce the request body.
    ///
    /// `size` and `from` always come from the builder. `sort` comes from the
    /// builder when an override is set, otherwise the body's own `sort` is
    /// kept, falling back to `{}`.
    pub fn serialize(&self) -> Value {
        let mut body = self.filter.clone();
        let sort = match &self.sort {
            Some(key) => {
                let mut m = Map::new();
                m.insert(key.field.clone(), Value::from(key.direction.as_str()));
                Value::Object(m)
            }
            None => body
                .remove("sort")
                .unwrap_or_else(|| Value::Object(Map::new())),
        };
        body.insert("sort".to_string(), sort);
        body.insert("size".to_string(), Value::from(self.page_size));
        body.insert("from".to_string(), Value::from(self.offset));
        Value::Object(body)
    }
}

/// Drop `#` comments line by line. Line count and the position of every
/// retained character are unchanged.
pub fn strip_comments(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.split_once('#').map_or(line, |(code, _)| code))
        .collect::<Vec<_>>()
        .join("\n")
}

/// serde_json appends " at line L column C"; the position is reported separately.
fn error_message(e: &serde_json::Error) -> String {
    let full = e.to_string();
    let suffix = format!(" at line {} column {}", e.line(), e.column());
    full.strip_suffix(&suffix).unwrap_or(&full).to_string()
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_strips_trailing_comment() {
        let spec = QuerySpec::parse(r#"{"query": {"match_all": {}}}  # comment"#).unwrap();
        assert_eq!(
            Value::Object(spec.filter_payload().clone()),
            json!({"query": {"match_all": {}}})
        );
    }

    #[test]
    fn test_parse_strips_comment_lines() {
        let raw = "# all errors from today\n{\n  \"query\": {\"term\": {\"levelname\": \"ERROR\"}} # level\n}\n";
        let spec = QuerySpec::parse(raw).unwrap();
        assert_eq!(
            spec.filter_payload()["query"],
            json!({"term": {"levelname": "ERROR"}})
        );
    }

    #[test]
    fn test_parse_error_position_counts_comment_lines() {
        let raw = "# header comment\n{\n  \"query\": ,\n}";
        match QuerySpec::parse(raw) {
            Err(GridError::MalformedQuery { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, 12);
            }
            other => panic!("expected MalformedQuery, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = QuerySpec::parse("[1, 2]").unwrap_err();
        assert!(matches!(err, GridError::MalformedQuery { .. }));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_parse_rejects_empty_text() {
        assert!(QuerySpec::parse("  # nothing here\n").is_err());
    }

    #[test]
    fn test_defaults_merged_when_absent() {
        let body = QuerySpec::parse("{}").unwrap().serialize();
        assert_eq!(body, json!({"sort": {}, "size": 100, "from": 0}));
    }

    #[test]
    fn test_payload_size_and_from_seed_builder() {
        let spec = QuerySpec::parse(r#"{"size": 25, "from": 50}"#).unwrap();
        assert_eq!(spec.page_size(), 25);
        assert_eq!(spec.offset(), 50);
    }

    #[test]
    fn test_builder_wins_over_payload_keys() {
        let spec = QuerySpec::parse(r#"{"size": 5, "from": 10, "sort": {"a": "asc"}}"#)
            .unwrap()
            .with_page_size(20)
            .with_offset(40)
            .with_sort("b", SortDirection::Descending);
        let body = spec.serialize();
        assert_eq!(body["size"], 20);
        assert_eq!(body["from"], 40);
        assert_eq!(body["sort"], json!({"b": "desc"}));
    }

    #[test]
    fn test_payload_sort_kept_without_override() {
        let body = QuerySpec::parse(r#"{"sort": [{"asctime": "desc"}]}"#)
            .unwrap()
            .serialize();
        assert_eq!(body["sort"], json!([{"asctime": "desc"}]));
    }

    #[test]
    fn test_with_sort_overwrites_previous_sort() {
        let spec = QuerySpec::parse(r#"{"query": {"match_all": {}}}"#)
            .unwrap()
            .with_sort("a", SortDirection::Ascending)
            .with_sort("b", SortDirection::Descending);
        let body = spec.serialize();
        assert_eq!(body["sort"], json!({"b": "desc"}));
        // idempotent
        assert_eq!(spec.serialize(), body);
    }

    #[test]
    fn test_unrecognised_keys_survive_serialization() {
        let raw = r#"{"query": {"match_all": {}}, "_source": ["message"], "track_total_hits": true}"#;
        let body = QuerySpec::parse(raw)
            .unwrap()
            .with_sort("message", SortDirection::Ascending)
            .serialize();
        assert_eq!(body["_source"], json!(["message"]));
        assert_eq!(body["track_total_hits"], json!(true));
        assert_eq!(body["query"], json!({"match_all": {}}));
    }

    #[test]
    fn test_clear_sort() {
        let spec = QuerySpec::parse("{}")
            .unwrap()
            .with_sort("a", SortDirection::Ascending)
            .clear_sort();
        assert!(spec.sort().is_none());
        assert_eq!(spec.serialize()["sort"], json!({}));
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Descending));
        assert_eq!(
            "ascending".parse::<SortDirection>(),
            Ok(SortDirection::Ascending)
        );
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_strip_comments_preserves_line_count() {
        let raw = "a # x\nb\n# c\n";
        assert_eq!(strip_comments(raw), "a \nb\n\n");
    }
}
