//! Session data structure compatible with express-session

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Cookie data structure compatible with express-session
///
/// Only `maxAge` is interpreted by the store. Every attribute, `maxAge`
/// included, is carried verbatim (`path`, `httpOnly`, `secure`, `expires`,
/// `originalMaxAge`, ...) so that a stored session reads back exactly as it
/// was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookie {
    /// Cookie attributes as written by the session framework
    pub attributes: Map<String, Value>,
}

impl SessionCookie {
    /// Create a new session cookie with the given max age in milliseconds
    pub fn new(max_age_ms: i64) -> Self {
        Self::default().with_max_age(max_age_ms)
    }

    /// Max age in milliseconds, if the cookie carries a numeric one
    pub fn max_age(&self) -> Option<i64> {
        let value = self.attributes.get("maxAge")?;
        value.as_i64().or_else(|| value.as_f64().map(|ms| ms as i64))
    }

    /// Replace the max age, in milliseconds
    pub fn set_max_age(&mut self, max_age_ms: i64) {
        self.attributes
            .insert("maxAge".to_string(), Value::from(max_age_ms));
    }

    /// Builder form of [`set_max_age`](Self::set_max_age)
    pub fn with_max_age(mut self, max_age_ms: i64) -> Self {
        self.set_max_age(max_age_ms);
        self
    }

    /// Set a cookie attribute such as `path` or `httpOnly`
    pub fn with_attribute<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.attributes.insert(key.to_string(), v);
        }
        self
    }

    /// How long the session should be retained in the store.
    ///
    /// A missing, zero or negative `maxAge` falls back to `default`.
    pub fn retention(&self, default: Duration) -> Duration {
        match self.max_age() {
            Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
            _ => default,
        }
    }

    /// Whole seconds of the retention window, `floor(maxAge / 1000)`
    pub fn retention_secs(&self, default: Duration) -> u64 {
        self.retention(default).as_secs()
    }

    /// Absolute expiry of a session written at `now`
    pub fn expires_at(&self, now: DateTime<Utc>, default: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(self.retention(default))
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Session data structure compatible with express-session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Cookie information
    pub cookie: SessionCookie,

    /// Additional session data (flattened at same level as cookie)
    #[serde(flatten)]
    pub data: HashMap<String, Value>,
}

impl SessionData {
    /// Create a new session data with the given max age in milliseconds
    pub fn new(max_age_ms: i64) -> Self {
        Self {
            cookie: SessionCookie::new(max_age_ms),
            data: HashMap::new(),
        }
    }

    /// Get a value from session data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), v);
        }
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Check if session data is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
