//! Schema registry synchronization.
//!
//! `sync()` is a background/automatic path and maximizes availability:
//! every infrastructure failure degrades to the best data available and
//! is logged, never surfaced. `update_table_description()` is an explicit
//! user edit and maximizes correctness: it fails loudly rather than
//! silently applying a no-op.

use chrono::Utc;
use tracing::{info, warn};

use super::hash::{hash_connection_url, hash_schema_structure};
use super::store::{RegistryStore, StoreError};
use crate::ai::DescriptionGenerator;
use crate::config::SourceCredentials;
use crate::extract::{ReferenceCatalog, SchemaExtractor};
use crate::model::{RegisteredTable, SchemaRegistryEntry};

/// Result of one synchronization pass.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The merged entry (persisted when possible, always returned).
    pub entry: SchemaRegistryEntry,
    /// Whether the structural hash changed since the previous snapshot.
    /// Purely informational; reacting to drift is the caller's concern.
    pub drift_detected: bool,
}

/// Errors from explicit registry edits.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no registry entry for key {0}")]
    EntryNotFound(String),

    #[error("table not found in registry entry: {0}")]
    TableNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates extraction, hashing, merge, and persistence for one
/// registry entry at a time. Holds no mutable state of its own; a race
/// between two concurrent syncs for the same key is tolerated (last
/// writer wins).
pub struct SchemaRegistrySynchronizer {
    store: Box<dyn RegistryStore>,
    extractor: SchemaExtractor,
    describer: Box<dyn DescriptionGenerator>,
    catalog: ReferenceCatalog,
}

impl SchemaRegistrySynchronizer {
    pub fn new(
        store: Box<dyn RegistryStore>,
        extractor: SchemaExtractor,
        describer: Box<dyn DescriptionGenerator>,
        catalog: ReferenceCatalog,
    ) -> Self {
        Self {
            store,
            extractor,
            describer,
            catalog,
        }
    }

    /// Synchronize the registry entry for a source.
    ///
    /// Infallible by design: outages yield stale or transient data with
    /// `drift_detected = false`, never an error.
    pub async fn sync(&self, creds: &SourceCredentials) -> SyncOutcome {
        let db_url_hash = hash_connection_url(&creds.url);

        let previous = match self.store.load(&db_url_hash).await {
            Ok(previous) => previous,
            Err(e) if e.is_relation_missing() => {
                // The host environment never provisioned registry
                // storage. Serve the live schema transiently and skip
                // every persistence step.
                warn!(%e, "registry storage unavailable; running non-persistent sync");
                let tables = self.extractor.extract_schema(creds).await;
                return SyncOutcome {
                    entry: SchemaRegistryEntry {
                        db_url_hash,
                        tables,
                        schema_hash: String::new(),
                        last_synced_at: String::new(),
                    },
                    drift_detected: false,
                };
            }
            Err(e) => {
                warn!(%e, "failed to read previous registry entry; treating as first sync");
                None
            }
        };

        let mut tables = self.extractor.extract_schema(creds).await;
        if tables.is_empty() {
            // Transient source outage. Never overwrite a known-good
            // snapshot with an empty one.
            warn!("extraction yielded zero tables; keeping previous snapshot");
            let entry = previous.unwrap_or_else(|| SchemaRegistryEntry::empty(&db_url_hash));
            return SyncOutcome {
                entry,
                drift_detected: false,
            };
        }

        let current_hash = hash_schema_structure(&tables);

        let drift_detected = match &previous {
            Some(prev) => {
                let drift = prev.schema_hash != current_hash;
                self.merge_previous_descriptions(&mut tables, prev);
                drift
            }
            None => {
                self.describe_first_sync(&mut tables).await;
                false
            }
        };

        let entry = SchemaRegistryEntry {
            db_url_hash,
            tables,
            schema_hash: current_hash,
            last_synced_at: Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.store.save(&entry).await {
            warn!(%e, "failed to persist registry entry; returning in-memory result");
        }

        info!(
            tables = entry.tables.len(),
            drift = drift_detected,
            "registry sync complete"
        );
        SyncOutcome {
            entry,
            drift_detected,
        }
    }

    /// Backfill missing table descriptions from the previous snapshot,
    /// by exact table name.
    ///
    /// Column-level descriptions and semantic types are deliberately NOT
    /// merged: columns are re-described on every sync. Whether that is
    /// intended or an oversight is an open product question; the behavior
    /// is preserved as-is.
    fn merge_previous_descriptions(
        &self,
        tables: &mut [RegisteredTable],
        previous: &SchemaRegistryEntry,
    ) {
        for table in tables.iter_mut() {
            if table.description.is_none() {
                if let Some(prev_table) = previous.table(&table.name) {
                    table.description = prev_table.description.clone();
                }
            }
        }
    }

    /// First-ever sync: seed descriptions from the reference catalog,
    /// then batch-ask the AI collaborator for whatever is still blank.
    async fn describe_first_sync(&self, tables: &mut [RegisteredTable]) {
        for table in tables.iter_mut() {
            if table.description.is_none() {
                table.description = self
                    .catalog
                    .description_for(&table.name)
                    .map(|d| d.to_string());
            }
        }

        let undescribed: Vec<String> = tables
            .iter()
            .filter(|t| t.description.is_none())
            .map(|t| t.name.clone())
            .collect();
        if undescribed.is_empty() {
            return;
        }

        match self
            .describer
            .generate_table_descriptions(&undescribed)
            .await
        {
            Ok(answers) => {
                for table in tables.iter_mut() {
                    if table.description.is_none() {
                        if let Some(desc) = answers.get(&table.name) {
                            table.description = Some(desc.clone());
                        }
                    }
                }
            }
            Err(e) => {
                // Descriptions are a nicety; an unreachable generator
                // must not fail the sync.
                warn!(%e, "AI description generation failed; leaving tables undescribed");
            }
        }
    }

    /// Replace one table's description and persist immediately.
    ///
    /// This is a direct user edit, so unlike `sync()` every failure is
    /// surfaced.
    pub async fn update_table_description(
        &self,
        db_url_hash: &str,
        table_name: &str,
        new_description: &str,
    ) -> Result<SchemaRegistryEntry, RegistryError> {
        let mut entry = self
            .store
            .load(db_url_hash)
            .await?
            .ok_or_else(|| RegistryError::EntryNotFound(db_url_hash.to_string()))?;

        let table = entry
            .tables
            .iter_mut()
            .find(|t| t.name == table_name)
            .ok_or_else(|| RegistryError::TableNotFound(table_name.to_string()))?;
        table.description = Some(new_description.to_string());

        entry.last_synced_at = Utc::now().to_rfc3339();
        self.store.save(&entry).await?;
        Ok(entry)
    }
}
