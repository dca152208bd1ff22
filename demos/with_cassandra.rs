//! Cassandra session store example compatible with express-session
//!
//! This example walks through the whole store contract against a live
//! Cassandra or ScyllaDB node. Sessions written here use the same JSON shape as
//! express-session, so a Node.js application reading the same table sees them.
//!
//! Environment:
//! - `CASSANDRA_NODES`: comma separated contact points (default: 127.0.0.1:9042)
//! - `CASSANDRA_KEYSPACE`: keyspace holding the table (default: tests)

use cassandra_session_store::{
    CassandraStore, ClientOptions, SessionData, SessionError, SessionStore, StoreConfig,
};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    // Set up logging
    tracing_subscriber::fmt::init();

    let nodes = std::env::var("CASSANDRA_NODES").unwrap_or_else(|_| "127.0.0.1:9042".to_string());
    let keyspace = std::env::var("CASSANDRA_KEYSPACE").unwrap_or_else(|_| "tests".to_string());

    println!("Connecting to Cassandra at {}", nodes);

    let options = ClientOptions::default()
        .with_contact_points(nodes.split(','))
        .with_keyspace(&keyspace);
    let config = StoreConfig::default().with_client_options(options);

    let store = CassandraStore::connect(&config).await?;
    store.ensure_table().await?;
    println!("Using table {}", store.table());

    // Same shape express-session writes
    let sid = Uuid::new_v4().to_string();
    let session: SessionData = serde_json::from_value(json!({
        "cookie": {
            "path": "/",
            "httpOnly": true,
            "secure": true,
            "maxAge": 600000
        },
        "name": "sid"
    }))?;

    store.set(&sid, &session).await?;
    println!("set     {} -> {}", sid, serde_json::to_string(&session)?);

    let loaded = store.get(&sid).await?;
    println!("get     {} -> {:?}", sid, loaded);

    println!("length  {}", store.length().await?);
    println!("all     {} session(s)", store.all().await?.len());

    let mut refreshed = session.clone();
    refreshed.cookie.set_max_age(1_200_000);
    store.touch(&sid, &refreshed).await?;
    println!("touch   {} (maxAge now 1200000)", sid);

    // A session that is gone almost immediately
    let short = Uuid::new_v4().to_string();
    store.set(&short, &SessionData::new(1)).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("get     {} -> {:?} (expired)", short, store.get(&short).await?);

    store.destroy(&sid).await?;
    println!("destroy {}", sid);

    let pruned = store.prune_expired().await?;
    println!("pruned  {} expired session(s)", pruned);
    println!("length  {}", store.length().await?);

    Ok(())
}
