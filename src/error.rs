//! Error taxonomy for the result grid.
//!
//! Every failure that can reach a view is one of three kinds:
//!
//! | Kind | Cause | Network state touched? |
//! |------|-------|------------------------|
//! | [`ErrorKind::MalformedQuery`] | query text did not parse to a JSON object | no |
//! | [`ErrorKind::TransportFailure`] | backend could not be reached (DNS, connect, timeout) | yes |
//! | [`ErrorKind::BackendError`] | backend answered with a failure status or unparsable body | yes |
//!
//! Responses belonging to a superseded request are dropped inside
//! [`ResultGridModel`](crate::model::ResultGridModel) and never surface here.

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error kind carried by
/// [`GridEvent::QueryError`](crate::model::GridEvent::QueryError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedQuery,
    TransportFailure,
    BackendError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MalformedQuery => "malformed_query",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::BackendError => "backend_error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Query text could not be parsed. `line` and `column` are 1-based
    /// positions in the text as the caller supplied it (comments included).
    #[error("malformed query at line {line}, column {column}: {message}")]
    MalformedQuery {
        line: usize,
        column: usize,
        message: String,
    },

    /// No response was received from the backend.
    #[error("could not reach backend: {0}")]
    TransportFailure(String),

    /// The backend was reached but rejected or failed the query.
    #[error("backend error: {message}")]
    BackendError {
        status: Option<u16>,
        message: String,
    },
}

impl GridError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::MalformedQuery { .. } => ErrorKind::MalformedQuery,
            GridError::TransportFailure(_) => ErrorKind::TransportFailure,
            GridError::BackendError { .. } => ErrorKind::BackendError,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        GridError::MalformedQuery {
            line: 1,
            column: 1,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            GridError::malformed("x").kind(),
            ErrorKind::MalformedQuery
        );
        assert_eq!(
            GridError::TransportFailure("refused".into()).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            GridError::BackendError {
                status: Some(400),
                message: "bad".into()
            }
            .kind(),
            ErrorKind::BackendError
        );
    }

    #[test]
    fn test_display_includes_position() {
        let err = GridError::MalformedQuery {
            line: 3,
            column: 7,
            message: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed query at line 3, column 7: expected value"
        );
    }

    #[test]
    fn test_kind_display_is_snake_case() {
        assert_eq!(ErrorKind::TransportFailure.to_string(), "transport_failure");
    }
}
