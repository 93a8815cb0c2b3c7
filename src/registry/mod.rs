//! Schema registry: hashing, persistence, and synchronization.
//!
//! A registry entry is the durable record of one data source's schema,
//! keyed by the digest of its connection URL. Synchronization extracts
//! the live schema, compares its structural fingerprint against the
//! previous snapshot to detect drift, merges human-authored table
//! descriptions forward, and persists the result.

pub mod hash;
pub mod store;
pub mod sync;

pub use hash::{hash_connection_url, hash_schema_structure};
pub use store::{
    MemoryRegistryStore, PostgrestRegistryStore, RegistryStore, StoreError, StoreResult,
};
pub use sync::{RegistryError, SchemaRegistrySynchronizer, SyncOutcome};
