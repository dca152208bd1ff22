//! Session store implementations

mod cassandra_store;
mod traits;

pub use cassandra_store::CassandraStore;
pub use traits::SessionStore;
