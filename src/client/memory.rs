//! In-memory column-store client
//!
//! This is primarily for development and testing.
//! It behaves like a single-node wide-column store: tables are keyed by their
//! qualified name, rows by sid, and nothing expires on its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{CqlClient, Query, QueryKind, QueryOutput, SessionRow};
use crate::error::ClientError;

#[derive(Clone)]
struct StoredRow {
    session: Option<String>,
    expires: Option<DateTime<Utc>>,
}

type Table = HashMap<String, StoredRow>;

/// In-memory [`CqlClient`]
///
/// Clones share the same tables, so a test can hand one clone to the store
/// and keep another to inspect what was written.
#[derive(Clone, Default)]
pub struct MemoryClient {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    failing: Arc<RwLock<HashSet<QueryKind>>>,
}

impl MemoryClient {
    /// Create a new, empty client
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent query of `kind` fail
    pub fn fail(&self, kind: QueryKind) {
        self.failing.write().insert(kind);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        self.failing.write().clear();
    }

    /// Write a row verbatim, bypassing serialization
    pub fn insert_raw(
        &self,
        table: &str,
        sid: &str,
        session: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) {
        self.tables.write().entry(table.to_string()).or_default().insert(
            sid.to_string(),
            StoredRow {
                session: session.map(str::to_string),
                expires,
            },
        );
    }

    /// Check whether a row physically exists
    pub fn contains(&self, table: &str, sid: &str) -> bool {
        self.tables
            .read()
            .get(table)
            .is_some_and(|rows| rows.contains_key(sid))
    }

    /// Stored expiry of a row
    pub fn expires(&self, table: &str, sid: &str) -> Option<DateTime<Utc>> {
        self.tables
            .read()
            .get(table)
            .and_then(|rows| rows.get(sid))
            .and_then(|row| row.expires)
    }

    /// Raw payload of a row
    pub fn payload(&self, table: &str, sid: &str) -> Option<String> {
        self.tables
            .read()
            .get(table)
            .and_then(|rows| rows.get(sid))
            .and_then(|row| row.session.clone())
    }

    /// Number of rows physically present in a table
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CqlClient for MemoryClient {
    async fn execute(&self, query: &Query<'_>) -> Result<QueryOutput, ClientError> {
        let kind = query.kind();
        if self.failing.read().contains(&kind) {
            return Err(ClientError::query(kind, "injected failure"));
        }

        let output = match *query {
            Query::Select { table, sid } => {
                let tables = self.tables.read();
                let rows = tables
                    .get(table)
                    .and_then(|rows| rows.get(sid))
                    .map(|row| SessionRow {
                        sid: Some(sid.to_string()),
                        session: row.session.clone(),
                        expires: row.expires,
                    })
                    .into_iter()
                    .collect();
                QueryOutput::Rows(rows)
            }
            Query::Upsert {
                table,
                sid,
                session,
                expires,
            } => {
                self.insert_raw(table, sid, Some(session), Some(expires));
                QueryOutput::Applied
            }
            Query::Delete { table, sid } => {
                if let Some(rows) = self.tables.write().get_mut(table) {
                    rows.remove(sid);
                }
                QueryOutput::Applied
            }
            Query::DeleteExpired {
                table,
                sid,
                expires,
            } => {
                let mut tables = self.tables.write();
                let matching = tables.get_mut(table).filter(|rows| {
                    rows.get(sid)
                        .is_some_and(|row| row.expires == Some(expires))
                });
                QueryOutput::Conditional(matching.is_some_and(|rows| rows.remove(sid).is_some()))
            }
            Query::Scan { table } => {
                let tables = self.tables.read();
                let rows = tables
                    .get(table)
                    .map(|rows| {
                        rows.iter()
                            .map(|(sid, row)| SessionRow {
                                sid: Some(sid.clone()),
                                session: row.session.clone(),
                                expires: row.expires,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                QueryOutput::Rows(rows)
            }
            Query::Count { table } => QueryOutput::Count(self.row_count(table) as i64),
            Query::Truncate { table } => {
                if let Some(rows) = self.tables.write().get_mut(table) {
                    rows.clear();
                }
                QueryOutput::Applied
            }
            Query::CreateTable { table } => {
                self.tables.write().entry(table.to_string()).or_default();
                QueryOutput::Applied
            }
        };

        Ok(output)
    }
}
