//! Cassandra/ScyllaDB client backed by the `scylla` driver
//!
//! Every statement goes through a [`CachingSession`], so each distinct CQL
//! text is prepared once and reused. Scans are paged; DDL and `TRUNCATE` are
//! sent unprepared.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use scylla::client::caching_session::CachingSession;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::unprepared::Statement;
use scylla::value::{CqlTimestamp, CqlValue, Row};
use tracing::info;

use super::{CqlClient, Query, QueryKind, QueryOutput, SessionRow};
use crate::config::ClientOptions;
use crate::error::{BoxError, ClientError};

type SelectRow = (Option<String>, Option<CqlTimestamp>);
type ScanRow = (String, Option<String>, Option<CqlTimestamp>);

/// [`CqlClient`] over a live Cassandra or ScyllaDB cluster
///
/// # Example
///
/// ```rust,ignore
/// use cassandra_session_store::{ClientOptions, ScyllaClient};
///
/// let options = ClientOptions::default().with_keyspace("tests");
/// let client = ScyllaClient::connect(&options).await?;
/// ```
pub struct ScyllaClient {
    session: CachingSession,
    page_size: i32,
}

impl ScyllaClient {
    /// Connect to the cluster described by `options`
    pub async fn connect(options: &ClientOptions) -> Result<Self, ClientError> {
        let mut builder = SessionBuilder::new()
            .known_nodes(&options.contact_points)
            .connection_timeout(options.connect_timeout());

        if let Some(keyspace) = &options.keyspace {
            builder = builder.use_keyspace(keyspace, false);
        }
        if let (Some(username), Some(password)) = (&options.username, &options.password) {
            builder = builder.user(username, password);
        }

        let session = builder
            .build()
            .await
            .map_err(|e| ClientError::Connection(Box::new(e)))?;

        info!(
            contact_points = ?options.contact_points,
            keyspace = ?options.keyspace,
            "Cassandra session store client connected"
        );

        Ok(Self::from_session(session, options))
    }

    /// Wrap an already connected driver session
    pub fn from_session(session: Session, options: &ClientOptions) -> Self {
        Self {
            session: CachingSession::from(session, options.statement_cache_size),
            page_size: options.page_size,
        }
    }
}

fn timestamp(ts: CqlTimestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts.0)
}

#[async_trait]
impl CqlClient for ScyllaClient {
    async fn execute(&self, query: &Query<'_>) -> Result<QueryOutput, ClientError> {
        let kind = query.kind();
        let cql = query.cql();
        let failed = |e: BoxError| ClientError::query(kind, e);

        match *query {
            Query::Select { sid, .. } => {
                let result = self
                    .session
                    .execute_unpaged(cql, (sid,))
                    .await
                    .map_err(|e| failed(e.into()))?;
                let rows = result.into_rows_result().map_err(|e| failed(e.into()))?;
                let row = rows
                    .maybe_first_row::<SelectRow>()
                    .map_err(|e| failed(e.into()))?;

                Ok(QueryOutput::Rows(
                    row.into_iter()
                        .map(|(session, expires)| SessionRow {
                            sid: Some(sid.to_string()),
                            session,
                            expires: expires.and_then(timestamp),
                        })
                        .collect(),
                ))
            }
            Query::Upsert {
                sid,
                session,
                expires,
                ..
            } => {
                let expires = CqlTimestamp(expires.timestamp_millis());
                self.session
                    .execute_unpaged(cql, (sid, session, expires))
                    .await
                    .map_err(|e| failed(e.into()))?;
                Ok(QueryOutput::Applied)
            }
            Query::Delete { sid, .. } => {
                self.session
                    .execute_unpaged(cql, (sid,))
                    .await
                    .map_err(|e| failed(e.into()))?;
                Ok(QueryOutput::Applied)
            }
            Query::DeleteExpired { sid, expires, .. } => {
                let expires = CqlTimestamp(expires.timestamp_millis());
                let result = self
                    .session
                    .execute_unpaged(cql, (sid, expires))
                    .await
                    .map_err(|e| failed(e.into()))?;

                // Lightweight transactions answer with an `[applied]` column first
                let row = result
                    .into_rows_result()
                    .map_err(|e| failed(e.into()))?
                    .maybe_first_row::<Row>()
                    .map_err(|e| failed(e.into()))?;
                let applied = matches!(
                    row.as_ref().and_then(|row| row.columns.first()),
                    Some(Some(CqlValue::Boolean(true)))
                );
                Ok(QueryOutput::Conditional(applied))
            }
            Query::Scan { .. } => {
                let mut statement = Statement::new(cql);
                statement.set_page_size(self.page_size);

                let rows: Vec<ScanRow> = self
                    .session
                    .execute_iter(statement, ())
                    .await
                    .map_err(|e| failed(e.into()))?
                    .rows_stream::<ScanRow>()
                    .map_err(|e| failed(e.into()))?
                    .try_collect()
                    .await
                    .map_err(|e| failed(e.into()))?;

                Ok(QueryOutput::Rows(
                    rows.into_iter()
                        .map(|(sid, session, expires)| SessionRow {
                            sid: Some(sid),
                            session,
                            expires: expires.and_then(timestamp),
                        })
                        .collect(),
                ))
            }
            Query::Count { .. } => {
                let result = self
                    .session
                    .execute_unpaged(cql, ())
                    .await
                    .map_err(|e| failed(e.into()))?;
                let (count,) = result
                    .into_rows_result()
                    .map_err(|e| failed(e.into()))?
                    .single_row::<(i64,)>()
                    .map_err(|e| failed(e.into()))?;
                Ok(QueryOutput::Count(count))
            }
            Query::Truncate { .. } | Query::CreateTable { .. } => {
                self.session
                    .get_session()
                    .query_unpaged(cql, ())
                    .await
                    .map_err(|e| failed(e.into()))?;
                Ok(QueryOutput::Applied)
            }
        }
    }
}
