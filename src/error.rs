//! Session error types

use thiserror::Error;

use crate::client::QueryKind;

/// Boxed error coming out of a column-store driver
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// Error reported by the column-store client
    #[error("Session store error: {0}")]
    Client(#[from] ClientError),

    /// Error during serialization/deserialization of a session payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session not found (reported by `touch`)
    #[error("Session {0} not found")]
    NotFound(String),

    /// Invalid store configuration
    #[error("Invalid store configuration: {0}")]
    Config(String),

    /// The store does not implement an optional operation
    #[error("{0} not supported by this store")]
    Unsupported(&'static str),
}

/// Errors raised by a [`CqlClient`](crate::client::CqlClient) implementation
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not connect to the cluster
    #[error("connection failed: {0}")]
    Connection(#[source] BoxError),

    /// A statement was rejected or failed in flight
    #[error("{kind} query failed: {source}")]
    Query {
        kind: QueryKind,
        #[source]
        source: BoxError,
    },

    /// The statement succeeded but returned a shape the store cannot use
    #[error("unexpected output for {kind} query")]
    UnexpectedOutput { kind: QueryKind },
}

impl ClientError {
    /// Wrap a driver error raised while executing a query of the given kind
    pub fn query<E>(kind: QueryKind, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ClientError::Query {
            kind,
            source: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::query(QueryKind::Select, "timed out");
        assert_eq!(err.to_string(), "select query failed: timed out");

        let err: SessionError = err.into();
        assert!(matches!(err, SessionError::Client(ClientError::Query { .. })));
        assert_eq!(
            err.to_string(),
            "Session store error: select query failed: timed out"
        );
    }

    #[test]
    fn test_serde_error_is_distinct() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SessionError = parse.into();
        assert!(matches!(err, SessionError::Serialization(_)));
    }
}
