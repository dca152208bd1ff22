//! # cassandra-session-store
//!
//! Express-session compatible session store backed by Cassandra or ScyllaDB.
//!
//! Sessions are stored as JSON in the same shape express-session produces,
//! one row per session id, so Rust and Node.js applications can share a
//! session table.
//!
//! ## Features
//!
//! - **Express-session compatible payloads**: `cookie` plus arbitrary fields, round-tripped verbatim
//! - **Explicit expiry**: an `expires` timestamp derived from `cookie.maxAge`, enforced on read
//! - **Pluggable clients**: the `scylla` driver, an in-memory client, or your own [`CqlClient`]
//! - **Full store contract**: get, set, destroy, touch, all, length and clear
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cassandra_session_store::{
//!     CassandraStore, ClientOptions, SessionData, SessionStore, StoreConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::default()
//!         .with_client_options(ClientOptions::default().with_keyspace("tests"));
//!     let store = CassandraStore::connect(&config).await?;
//!     store.ensure_table().await?;
//!
//!     let mut session = SessionData::new(600_000);
//!     session.set("user", "alice");
//!     store.set("sid-1", &session).await?;
//!
//!     let loaded = store.get("sid-1").await?;
//!     assert_eq!(loaded, Some(session));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use client::{CqlClient, MemoryClient, Query, QueryKind, QueryOutput, SessionRow};
pub use config::{ClientOptions, StoreConfig};
pub use error::{ClientError, SessionError};
pub use session::{SessionCookie, SessionData};
pub use store::{CassandraStore, SessionStore};

#[cfg(feature = "scylla-client")]
pub use client::ScyllaClient;
