//! Persistence collaborator for registry snapshots.
//!
//! The synchronizer only sees the [`RegistryStore`] trait. The PostgREST
//! implementation maps entries onto the `schema_registry` table; the
//! in-memory implementation backs tests and offline use.
//!
//! "The registry relation does not exist" is a distinct error from "no
//! row for this key": the former means the host environment has not
//! provisioned the registry's storage and triggers the synchronizer's
//! no-persist degraded path, while the latter is an ordinary first sync.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::SourceCredentials;
use crate::model::{RegisteredTable, SchemaRegistryEntry};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing relation has not been provisioned.
    #[error("registry storage is not provisioned: {0}")]
    RelationMissing(String),

    /// Network-level failure talking to the store.
    #[error("registry request failed: {0}")]
    Transport(String),

    /// The store answered with something unusable.
    #[error("unexpected registry response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Whether this error means the registry storage itself is missing.
    pub fn is_relation_missing(&self) -> bool {
        matches!(self, Self::RelationMissing(_))
    }
}

/// Storage interface for registry snapshots, keyed by `db_url_hash`.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load the entry for a key. `Ok(None)` means no row exists yet.
    async fn load(&self, db_url_hash: &str) -> StoreResult<Option<SchemaRegistryEntry>>;

    /// Insert or update an entry (last writer wins).
    async fn save(&self, entry: &SchemaRegistryEntry) -> StoreResult<()>;
}

/// Row shape of the `schema_registry` table.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryRow {
    db_url_hash: String,
    tables_data: Vec<RegisteredTable>,
    schema_hash: String,
    last_synced_at: String,
}

impl From<&SchemaRegistryEntry> for RegistryRow {
    fn from(entry: &SchemaRegistryEntry) -> Self {
        Self {
            db_url_hash: entry.db_url_hash.clone(),
            tables_data: entry.tables.clone(),
            schema_hash: entry.schema_hash.clone(),
            last_synced_at: entry.last_synced_at.clone(),
        }
    }
}

impl From<RegistryRow> for SchemaRegistryEntry {
    fn from(row: RegistryRow) -> Self {
        Self {
            db_url_hash: row.db_url_hash,
            tables: row.tables_data,
            schema_hash: row.schema_hash,
            last_synced_at: row.last_synced_at,
        }
    }
}

/// PostgREST error body (`{"code": "42P01", "message": "..."}`).
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Postgres "undefined table" SQLSTATE, surfaced by PostgREST when the
/// registry relation has not been created.
const UNDEFINED_TABLE: &str = "42P01";

/// Registry store backed by a PostgREST endpoint.
pub struct PostgrestRegistryStore {
    rest_base: String,
    anon_key: String,
    table: String,
    client: reqwest::Client,
}

impl PostgrestRegistryStore {
    /// Store rows in the default `schema_registry` table.
    pub fn new(creds: &SourceCredentials) -> Self {
        Self::with_table(creds, "schema_registry")
    }

    /// Store rows in a custom table.
    pub fn with_table(creds: &SourceCredentials, table: impl Into<String>) -> Self {
        Self {
            rest_base: creds.rest_base(),
            anon_key: creds.anon_key.clone(),
            table: table.into(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_base, self.table)
    }

    /// Map a non-success response to the right error variant.
    async fn classify_error(&self, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<PostgrestError>(&body) {
            if err.code == UNDEFINED_TABLE {
                return StoreError::RelationMissing(err.message);
            }
            if !err.message.is_empty() {
                return StoreError::Transport(format!("{}: {}", status, err.message));
            }
        }
        StoreError::Transport(format!("{}: {}", status, body))
    }
}

#[async_trait]
impl RegistryStore for PostgrestRegistryStore {
    async fn load(&self, db_url_hash: &str) -> StoreResult<Option<SchemaRegistryEntry>> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("db_url_hash", format!("eq.{}", db_url_hash)), ("select", "*".to_string())])
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.classify_error(response).await);
        }

        let rows: Vec<RegistryRow> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(rows.into_iter().next().map(SchemaRegistryEntry::from))
    }

    async fn save(&self, entry: &SchemaRegistryEntry) -> StoreResult<()> {
        let row = RegistryRow::from(entry);

        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.classify_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl<T: RegistryStore + ?Sized> RegistryStore for std::sync::Arc<T> {
    async fn load(&self, db_url_hash: &str) -> StoreResult<Option<SchemaRegistryEntry>> {
        (**self).load(db_url_hash).await
    }

    async fn save(&self, entry: &SchemaRegistryEntry) -> StoreResult<()> {
        (**self).save(entry).await
    }
}

/// In-memory registry store for tests and offline runs.
#[derive(Default)]
pub struct MemoryRegistryStore {
    rows: RwLock<HashMap<String, SchemaRegistryEntry>>,
    relation_missing: bool,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose relation was never provisioned: every call fails
    /// with [`StoreError::RelationMissing`].
    pub fn with_relation_missing() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            relation_missing: true,
        }
    }

    /// Seed an entry directly, bypassing `save`.
    pub async fn insert(&self, entry: SchemaRegistryEntry) {
        self.rows
            .write()
            .await
            .insert(entry.db_url_hash.clone(), entry);
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    async fn load(&self, db_url_hash: &str) -> StoreResult<Option<SchemaRegistryEntry>> {
        if self.relation_missing {
            return Err(StoreError::RelationMissing(
                "relation \"schema_registry\" does not exist".to_string(),
            ));
        }
        Ok(self.rows.read().await.get(db_url_hash).cloned())
    }

    async fn save(&self, entry: &SchemaRegistryEntry) -> StoreResult<()> {
        if self.relation_missing {
            return Err(StoreError::RelationMissing(
                "relation \"schema_registry\" does not exist".to_string(),
            ));
        }
        self.rows
            .write()
            .await
            .insert(entry.db_url_hash.clone(), entry.clone());
        Ok(())
    }
}
