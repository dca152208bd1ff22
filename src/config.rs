//! Store configuration

use serde::Deserialize;
use std::time::Duration;

use crate::error::SessionError;

/// Connection settings used when the store builds its own client
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Contact points, `host` or `host:port` (default: `["127.0.0.1:9042"]`)
    pub contact_points: Vec<String>,

    /// Keyspace the client session uses (default: None)
    pub keyspace: Option<String>,

    /// Plain-text authentication username
    pub username: Option<String>,

    /// Plain-text authentication password
    pub password: Option<String>,

    /// Connection timeout in milliseconds (default: 5000)
    pub connect_timeout_ms: u64,

    /// Rows fetched per page during a full scan (default: 5000)
    pub page_size: i32,

    /// Number of prepared statements kept by the driver (default: 16)
    pub statement_cache_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            contact_points: vec!["127.0.0.1:9042".to_string()],
            keyspace: None,
            username: None,
            password: None,
            connect_timeout_ms: 5000,
            page_size: 5000,
            statement_cache_size: 16,
        }
    }
}

impl ClientOptions {
    /// Set the contact points
    pub fn with_contact_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contact_points = points.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Set the keyspace
    pub fn with_keyspace<S: Into<String>>(mut self, keyspace: S) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set plain-text credentials
    pub fn with_credentials<U: Into<String>, P: Into<String>>(
        mut self,
        username: U,
        password: P,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the scan page size
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Get the connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Configuration for the Cassandra session store
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Session table name (default: "sessions")
    pub table: String,

    /// Keyspace qualifying the table.
    /// When None, the client options' keyspace is used, if any.
    pub keyspace: Option<String>,

    /// Retention in seconds for sessions without a usable `cookie.maxAge` (default: 600)
    pub default_retention_secs: u64,

    /// Options for the client built by `CassandraStore::connect`.
    /// Ignored when a client is supplied.
    pub client_options: ClientOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "sessions".to_string(),
            keyspace: None,
            default_retention_secs: 600,
            client_options: ClientOptions::default(),
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given table
    pub fn new<S: Into<String>>(table: S) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Set the table name (default: "sessions")
    pub fn with_table<S: Into<String>>(mut self, table: S) -> Self {
        self.table = table.into();
        self
    }

    /// Set the keyspace qualifying the table
    pub fn with_keyspace<S: Into<String>>(mut self, keyspace: S) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set the default retention window
    pub fn with_default_retention(mut self, retention: Duration) -> Self {
        self.default_retention_secs = retention.as_secs();
        self
    }

    /// Set the client options
    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Get the default retention as Duration
    pub fn default_retention(&self) -> Duration {
        Duration::from_secs(self.default_retention_secs)
    }

    /// Validate names and compute the namespace-qualified table, `keyspace.table`
    pub fn qualified_table(&self) -> Result<String, SessionError> {
        check_identifier("table", &self.table)?;

        let keyspace = self
            .keyspace
            .as_deref()
            .or(self.client_options.keyspace.as_deref());

        match keyspace {
            Some(keyspace) => {
                check_identifier("keyspace", keyspace)?;
                Ok(format!("{}.{}", keyspace, self.table))
            }
            None => Ok(self.table.clone()),
        }
    }

    /// Check every setting before first use
    pub fn validate(&self) -> Result<(), SessionError> {
        self.qualified_table()?;
        if self.default_retention_secs == 0 {
            return Err(SessionError::Config(
                "default retention must be at least one second".to_string(),
            ));
        }
        if self.client_options.page_size <= 0 {
            return Err(SessionError::Config(format!(
                "page size must be positive, got {}",
                self.client_options.page_size
            )));
        }
        Ok(())
    }
}

// Table and keyspace names are interpolated into CQL, so only plain identifiers pass.
fn check_identifier(what: &str, name: &str) -> Result<(), SessionError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SessionError::Config(format!("invalid {} name {:?}", what, name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.table, "sessions");
        assert_eq!(config.default_retention(), Duration::from_secs(600));
        assert_eq!(config.qualified_table().unwrap(), "sessions");
        assert_eq!(config.client_options.contact_points, vec!["127.0.0.1:9042"]);
        assert_eq!(config.client_options.connect_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_qualified_table() {
        let config = StoreConfig::new("web_sessions").with_keyspace("app");
        assert_eq!(config.qualified_table().unwrap(), "app.web_sessions");

        // falls back to the client's keyspace
        let config = StoreConfig::default()
            .with_client_options(ClientOptions::default().with_keyspace("tests"));
        assert_eq!(config.qualified_table().unwrap(), "tests.sessions");

        // explicit keyspace wins
        let config = StoreConfig::default()
            .with_keyspace("app")
            .with_client_options(ClientOptions::default().with_keyspace("tests"));
        assert_eq!(config.qualified_table().unwrap(), "app.sessions");
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        for table in ["", "sessions; DROP TABLE x", "a.b", "tab le"] {
            let err = StoreConfig::new(table).qualified_table().unwrap_err();
            assert!(matches!(err, SessionError::Config(_)), "{table:?}");
        }

        let err = StoreConfig::default()
            .with_keyspace("ks-1")
            .qualified_table()
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_validate() {
        let config = StoreConfig::default().with_default_retention(Duration::from_millis(10));
        assert!(config.validate().is_err());

        let config = StoreConfig::default()
            .with_client_options(ClientOptions::default().with_page_size(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StoreConfig = serde_json::from_str(
            r#"{
                "table": "web_sessions",
                "client_options": {
                    "contact_points": ["10.0.0.1", "10.0.0.2:9142"],
                    "keyspace": "app"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.qualified_table().unwrap(), "app.web_sessions");
        assert_eq!(config.default_retention_secs, 600);
        assert_eq!(config.client_options.contact_points.len(), 2);
        assert_eq!(config.client_options.page_size, 5000);
    }
}
