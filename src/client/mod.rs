//! Column-store client capability
//!
//! The store never talks to a driver directly. Every operation is expressed as
//! one [`Query`] handed to a [`CqlClient`], which executes it and reports a
//! [`QueryOutput`]. Connection pooling, retries, consistency and statement
//! preparation are the client's business.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::ClientError;

mod memory;

pub use memory::MemoryClient;

#[cfg(feature = "scylla-client")]
mod scylla_client;

#[cfg(feature = "scylla-client")]
pub use scylla_client::ScyllaClient;

/// The statements issued by the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Upsert,
    Delete,
    DeleteExpired,
    Scan,
    Count,
    Truncate,
    CreateTable,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Select => "select",
            QueryKind::Upsert => "upsert",
            QueryKind::Delete => "delete",
            QueryKind::DeleteExpired => "delete expired",
            QueryKind::Scan => "scan",
            QueryKind::Count => "count",
            QueryKind::Truncate => "truncate",
            QueryKind::CreateTable => "create table",
        };
        f.write_str(name)
    }
}

/// A parameterized statement against the (namespace-qualified) session table
#[derive(Debug, Clone, PartialEq)]
pub enum Query<'a> {
    /// Point lookup of one session
    Select { table: &'a str, sid: &'a str },
    /// Insert-or-overwrite of one session row
    Upsert {
        table: &'a str,
        sid: &'a str,
        session: &'a str,
        expires: DateTime<Utc>,
    },
    /// Delete one session row
    Delete { table: &'a str, sid: &'a str },
    /// Delete one session row only if it still carries the expiry that was read
    DeleteExpired {
        table: &'a str,
        sid: &'a str,
        expires: DateTime<Utc>,
    },
    /// Full table scan
    Scan { table: &'a str },
    /// Row count
    Count { table: &'a str },
    /// Remove every row
    Truncate { table: &'a str },
    /// Create the session table if it is missing
    CreateTable { table: &'a str },
}

impl Query<'_> {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Select { .. } => QueryKind::Select,
            Query::Upsert { .. } => QueryKind::Upsert,
            Query::Delete { .. } => QueryKind::Delete,
            Query::DeleteExpired { .. } => QueryKind::DeleteExpired,
            Query::Scan { .. } => QueryKind::Scan,
            Query::Count { .. } => QueryKind::Count,
            Query::Truncate { .. } => QueryKind::Truncate,
            Query::CreateTable { .. } => QueryKind::CreateTable,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Query::Select { table, .. }
            | Query::Upsert { table, .. }
            | Query::Delete { table, .. }
            | Query::DeleteExpired { table, .. }
            | Query::Scan { table }
            | Query::Count { table }
            | Query::Truncate { table }
            | Query::CreateTable { table } => *table,
        }
    }

    /// CQL text with `?` bind markers
    pub fn cql(&self) -> String {
        match self {
            Query::Select { table, .. } => {
                format!("SELECT session, expires FROM {table} WHERE sid = ?;")
            }
            Query::Upsert { table, .. } => {
                format!("INSERT INTO {table} (sid, session, expires) VALUES (?, ?, ?);")
            }
            Query::Delete { table, .. } => format!("DELETE FROM {table} WHERE sid = ?;"),
            Query::DeleteExpired { table, .. } => {
                format!("DELETE FROM {table} WHERE sid = ? IF expires = ?;")
            }
            Query::Scan { table } => {
                format!("SELECT sid, session, expires FROM {table} ALLOW FILTERING;")
            }
            Query::Count { table } => format!("SELECT count(*) FROM {table};"),
            Query::Truncate { table } => format!("TRUNCATE {table};"),
            Query::CreateTable { table } => format!(
                "CREATE TABLE IF NOT EXISTS {table} (sid text PRIMARY KEY, session text, expires timestamp);"
            ),
        }
    }
}

/// One row of the session table
///
/// Columns are optional because a wide-column store happily returns rows with
/// cells missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRow {
    pub sid: Option<String>,
    pub session: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl SessionRow {
    /// Whether the row's expiry has elapsed at `now`. Rows without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires, Some(expires) if expires <= now)
    }
}

/// What a query produced
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<SessionRow>),
    Count(i64),
    Applied,
    /// Outcome of a conditional statement
    Conditional(bool),
}

impl QueryOutput {
    pub fn into_rows(self, kind: QueryKind) -> Result<Vec<SessionRow>, ClientError> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            _ => Err(ClientError::UnexpectedOutput { kind }),
        }
    }

    pub fn into_applied(self, kind: QueryKind) -> Result<bool, ClientError> {
        match self {
            QueryOutput::Conditional(applied) => Ok(applied),
            _ => Err(ClientError::UnexpectedOutput { kind }),
        }
    }

    pub fn into_count(self, kind: QueryKind) -> Result<i64, ClientError> {
        match self {
            QueryOutput::Count(n) => Ok(n),
            _ => Err(ClientError::UnexpectedOutput { kind }),
        }
    }
}

/// Parameterized-query execution against a Cassandra-compatible store
#[async_trait]
pub trait CqlClient: Send + Sync + 'static {
    /// Execute one statement and return its output
    ///
    /// Select and scan produce [`QueryOutput::Rows`], count produces
    /// [`QueryOutput::Count`], conditional deletes produce
    /// [`QueryOutput::Conditional`], everything else [`QueryOutput::Applied`].
    async fn execute(&self, query: &Query<'_>) -> Result<QueryOutput, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cql_rendering() {
        let table = "tests.sessions";
        assert_eq!(
            Query::Select { table, sid: "a" }.cql(),
            "SELECT session, expires FROM tests.sessions WHERE sid = ?;"
        );
        assert_eq!(
            Query::Upsert {
                table,
                sid: "a",
                session: "{}",
                expires: Utc::now(),
            }
            .cql(),
            "INSERT INTO tests.sessions (sid, session, expires) VALUES (?, ?, ?);"
        );
        assert_eq!(
            Query::Delete { table, sid: "a" }.cql(),
            "DELETE FROM tests.sessions WHERE sid = ?;"
        );
        assert_eq!(
            Query::DeleteExpired {
                table,
                sid: "a",
                expires: Utc::now(),
            }
            .cql(),
            "DELETE FROM tests.sessions WHERE sid = ? IF expires = ?;"
        );
        assert_eq!(
            Query::Scan { table }.cql(),
            "SELECT sid, session, expires FROM tests.sessions ALLOW FILTERING;"
        );
        assert_eq!(Query::Count { table }.cql(), "SELECT count(*) FROM tests.sessions;");
        assert_eq!(Query::Truncate { table }.cql(), "TRUNCATE tests.sessions;");
        assert!(Query::CreateTable { table }
            .cql()
            .starts_with("CREATE TABLE IF NOT EXISTS tests.sessions"));
    }

    #[test]
    fn test_sid_is_never_inlined() {
        let cql = Query::Select {
            table: "sessions",
            sid: "x'; DROP TABLE sessions; --",
        }
        .cql();
        assert!(!cql.contains("DROP"));
    }

    #[test]
    fn test_row_expiry() {
        let now = Utc::now();
        let mut row = SessionRow::default();
        assert!(!row.is_expired(now));

        row.expires = Some(now);
        assert!(row.is_expired(now));

        row.expires = Some(now + chrono::TimeDelta::seconds(1));
        assert!(!row.is_expired(now));
    }

    #[test]
    fn test_unexpected_output() {
        let err = QueryOutput::Applied.into_rows(QueryKind::Scan).unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedOutput {
                kind: QueryKind::Scan
            }
        ));
        assert_eq!(QueryOutput::Count(3).into_count(QueryKind::Count).unwrap(), 3);
        assert!(!QueryOutput::Conditional(false)
            .into_applied(QueryKind::DeleteExpired)
            .unwrap());
        assert!(QueryOutput::Applied
            .into_applied(QueryKind::DeleteExpired)
            .is_err());
    }
}
