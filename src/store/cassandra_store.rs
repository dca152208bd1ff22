//! Cassandra session store compatible with express-session
//!
//! This store keeps one row per session:
//! - Key: `sid` (text primary key)
//! - Value: JSON serialized session data in `session`
//! - Expiry: absolute `expires` timestamp derived from `cookie.maxAge`
//!
//! Expiry is enforced on read. A row whose `expires` has passed is reported as
//! absent and deleted in the background; no native `USING TTL` is written.
//! Those deletes are conditional on the expiry that was read, so a session
//! rewritten in the meantime is never removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::SessionStore;
use crate::client::{CqlClient, Query, QueryKind, QueryOutput, SessionRow};
use crate::config::StoreConfig;
use crate::error::{ClientError, SessionError};
use crate::session::SessionData;

#[cfg(feature = "scylla-client")]
use crate::client::ScyllaClient;

/// What a stored row means at read time
enum Stored {
    Live(SessionData),
    Expired(DateTime<Utc>),
    Empty,
}

fn decode(row: &SessionRow, now: DateTime<Utc>) -> Result<Stored, SessionError> {
    if let Some(expires) = row.expires.filter(|_| row.is_expired(now)) {
        return Ok(Stored::Expired(expires));
    }
    match &row.session {
        Some(json) => Ok(Stored::Live(serde_json::from_str(json)?)),
        None => Ok(Stored::Empty),
    }
}

/// Cassandra session store compatible with express-session
///
/// Cloning is cheap: clones share the client and the table name.
///
/// # Example
///
/// ```rust,ignore
/// use cassandra_session_store::{CassandraStore, ClientOptions, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_client_options(ClientOptions::default().with_keyspace("tests"));
/// let store = CassandraStore::connect(&config).await?;
/// ```
#[derive(Clone)]
pub struct CassandraStore {
    client: Arc<dyn CqlClient>,
    table: Arc<str>,
    default_retention: Duration,
}

impl CassandraStore {
    /// Create a store on top of a caller-supplied client
    ///
    /// The client is used as-is: the caller stays responsible for connecting
    /// and shutting it down.
    pub fn new(client: Arc<dyn CqlClient>, config: &StoreConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let table = config.qualified_table()?;
        debug!(table = %table, "Cassandra session store initialized");

        Ok(Self {
            client,
            table: table.into(),
            default_retention: config.default_retention(),
        })
    }

    /// Create a store with its own client, connected from `config.client_options`
    ///
    /// Fails if the cluster cannot be reached.
    #[cfg(feature = "scylla-client")]
    pub async fn connect(config: &StoreConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let client = ScyllaClient::connect(&config.client_options)
            .await
            .inspect_err(|e| warn!(error = %e, "Cassandra database not available"))?;
        Self::new(Arc::new(client), config)
    }

    /// The namespace-qualified table this store reads and writes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the session table if it doesn't exist yet
    pub async fn ensure_table(&self) -> Result<(), SessionError> {
        self.run(&Query::CreateTable { table: &self.table }).await?;
        info!(table = %self.table, "Session table ready");
        Ok(())
    }

    /// Delete every session whose expiry has passed
    ///
    /// Returns the number of sessions removed. A session rewritten after the
    /// scan is left alone and not counted.
    pub async fn prune_expired(&self) -> Result<usize, SessionError> {
        let rows = self.scan().await?;
        let now = Utc::now();

        let mut removed = 0;
        for row in rows.iter().filter(|row| row.is_expired(now)) {
            let (Some(sid), Some(expires)) = (row.sid.as_deref(), row.expires) else {
                continue;
            };
            if self.delete_expired(sid, expires).await? {
                removed += 1;
            }
        }

        info!(table = %self.table, removed, "Expired sessions pruned");
        Ok(removed)
    }

    async fn run(&self, query: &Query<'_>) -> Result<QueryOutput, SessionError> {
        debug!(query = %query.cql(), "Executing query");
        self.client.execute(query).await.map_err(|e| {
            debug!(kind = %query.kind(), table = query.table(), error = %e, "Query failed");
            SessionError::from(e)
        })
    }

    async fn scan(&self) -> Result<Vec<SessionRow>, SessionError> {
        let rows = self
            .run(&Query::Scan { table: &self.table })
            .await?
            .into_rows(QueryKind::Scan)?;
        debug!(table = %self.table, rows = rows.len(), "Sessions fetched");
        Ok(rows)
    }

    /// Delete a session only if its stored expiry is still `expires`
    async fn delete_expired(
        &self,
        sid: &str,
        expires: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        let applied = self
            .run(&Query::DeleteExpired {
                table: &self.table,
                sid,
                expires,
            })
            .await?
            .into_applied(QueryKind::DeleteExpired)?;
        Ok(applied)
    }

    /// Delete an expired session without waiting for the outcome
    fn reclaim(&self, sid: &str, expires: DateTime<Utc>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(sid, "No runtime, expired session left for later reclamation");
            return;
        };

        let store = self.clone();
        let sid = sid.to_string();
        handle.spawn(async move {
            match store.delete_expired(&sid, expires).await {
                Ok(true) => debug!(sid = %sid, "Expired session deleted"),
                Ok(false) => debug!(sid = %sid, "Expired session kept, rewritten since read"),
                Err(e) => warn!(sid = %sid, error = %e, "Error deleting expired session"),
            }
        });
    }
}

#[async_trait]
impl SessionStore for CassandraStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let rows = self
            .run(&Query::Select {
                table: &self.table,
                sid,
            })
            .await?
            .into_rows(QueryKind::Select)?;

        let Some(row) = rows.into_iter().next() else {
            debug!(sid, "Session not found");
            return Ok(None);
        };

        match decode(&row, Utc::now()) {
            Ok(Stored::Live(session)) => {
                debug!(sid, "Session fetched");
                Ok(Some(session))
            }
            Ok(Stored::Expired(expires)) => {
                debug!(sid, %expires, "Session expired");
                self.reclaim(sid, expires);
                Ok(None)
            }
            Ok(Stored::Empty) => Ok(None),
            Err(e) => {
                warn!(sid, error = %e, "Session cannot be parsed");
                Err(e)
            }
        }
    }

    async fn set(&self, sid: &str, session: &SessionData) -> Result<(), SessionError> {
        let payload = serde_json::to_string(session)?;
        let expires = session.cookie.expires_at(Utc::now(), self.default_retention);
        let retention_secs = session.cookie.retention_secs(self.default_retention);

        self.run(&Query::Upsert {
            table: &self.table,
            sid,
            session: &payload,
            expires,
        })
        .await?;

        debug!(sid, %expires, retention_secs, "Session saved");
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.run(&Query::Delete {
            table: &self.table,
            sid,
        })
        .await?;

        debug!(sid, "Session deleted");
        Ok(())
    }

    async fn touch(&self, sid: &str, session: &SessionData) -> Result<(), SessionError> {
        let Some(mut current) = self.get(sid).await? else {
            debug!(sid, "Session cannot be touched, not found");
            return Err(SessionError::NotFound(sid.to_string()));
        };

        // Only the cookie moves; everything else stays as stored.
        current.cookie = session.cookie.clone();
        self.set(sid, &current).await
    }

    async fn all(&self) -> Result<Vec<SessionData>, SessionError> {
        let rows = self.scan().await?;
        let now = Utc::now();

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let stored = decode(row, now).inspect_err(|e| {
                warn!(sid = ?row.sid, error = %e, "Session cannot be parsed, aborting scan");
            })?;

            match stored {
                Stored::Live(session) => sessions.push(session),
                Stored::Expired(expires) => {
                    if let Some(sid) = &row.sid {
                        self.reclaim(sid, expires);
                    }
                }
                Stored::Empty => {}
            }
        }

        Ok(sessions)
    }

    async fn length(&self) -> Result<usize, SessionError> {
        let count = self
            .run(&Query::Count { table: &self.table })
            .await?
            .into_count(QueryKind::Count)?;

        let length = usize::try_from(count).map_err(|_| ClientError::UnexpectedOutput {
            kind: QueryKind::Count,
        })?;
        debug!(table = %self.table, length, "Sessions counted");
        Ok(length)
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.run(&Query::Truncate { table: &self.table }).await?;
        info!(table = %self.table, "All sessions deleted");
        Ok(())
    }
}
