//! Reference catalog and the fallback extraction tier.
//!
//! When neither the RPC tier nor REST introspection yields usable data,
//! extraction falls back to a fixed reference catalog for a known demo
//! dataset. The catalog is a versioned JSON resource embedded at compile
//! time and injectable at construction, so alternate catalogs can be
//! substituted in tests or other deployments without touching the
//! extraction logic.
//!
//! The synchronizer also consults the catalog on a first-ever sync to
//! seed table descriptions before asking the AI collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ExtractionTier, TierOutcome};
use crate::config::SourceCredentials;
use crate::inference::infer_semantic_type;
use crate::model::{ForeignKeyRef, RegisteredColumn, RegisteredTable};

/// The built-in catalog document.
const BUILTIN_CATALOG: &str = include_str!("reference_catalog.json");

/// A curated reference schema for a known demo dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceCatalog {
    /// Catalog document version.
    pub version: u32,
    /// Dataset identifier (e.g. `retail_demo`).
    pub dataset: String,
    pub tables: Vec<CatalogTable>,
}

/// One table entry in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<CatalogForeignKey>,
    /// Descriptions for a curated subset of columns.
    #[serde(default)]
    pub column_descriptions: BTreeMap<String, String>,
}

/// A foreign-key declaration in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

impl ReferenceCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_CATALOG)
            .unwrap_or_else(|e| panic!("embedded reference catalog is invalid: {}", e))
    }

    /// Parse a catalog from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Case-insensitive table lookup.
    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Curated description for a table, matched case-insensitively.
    pub fn description_for(&self, table_name: &str) -> Option<&str> {
        self.table(table_name).map(|t| t.description.as_str())
    }

    /// Synthesize full registry tables from the catalog entries.
    ///
    /// Column order per table: primary keys (`integer`, primary), then
    /// foreign keys (`integer`, carrying the reference), then any
    /// remaining described-but-unreferenced columns (`text`).
    pub fn synthesize_tables(&self) -> Vec<RegisteredTable> {
        self.tables
            .iter()
            .map(|entry| {
                let mut columns = Vec::new();

                for pk in &entry.primary_keys {
                    columns.push(RegisteredColumn {
                        name: pk.clone(),
                        data_type: "integer".to_string(),
                        is_primary: true,
                        description: entry.column_descriptions.get(pk).cloned(),
                        semantic_type: Some(infer_semantic_type(pk)),
                        foreign_key: None,
                    });
                }

                for fk in &entry.foreign_keys {
                    if columns.iter().any(|c| c.name == fk.column) {
                        continue;
                    }
                    columns.push(RegisteredColumn {
                        name: fk.column.clone(),
                        data_type: "integer".to_string(),
                        is_primary: false,
                        description: entry.column_descriptions.get(&fk.column).cloned(),
                        semantic_type: Some(infer_semantic_type(&fk.column)),
                        foreign_key: Some(ForeignKeyRef {
                            table: fk.references_table.clone(),
                            column: fk.references_column.clone(),
                        }),
                    });
                }

                for (name, description) in &entry.column_descriptions {
                    if columns.iter().any(|c| &c.name == name) {
                        continue;
                    }
                    columns.push(RegisteredColumn {
                        name: name.clone(),
                        data_type: "text".to_string(),
                        is_primary: false,
                        description: Some(description.clone()),
                        semantic_type: Some(infer_semantic_type(name)),
                        foreign_key: None,
                    });
                }

                RegisteredTable {
                    name: entry.name.clone(),
                    description: Some(entry.description.clone()),
                    columns,
                }
            })
            .collect()
    }
}

/// The never-fails fallback tier backed by a [`ReferenceCatalog`].
pub struct CatalogTier {
    catalog: ReferenceCatalog,
}

impl CatalogTier {
    pub fn new(catalog: ReferenceCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ExtractionTier for CatalogTier {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn run(&self, _creds: &SourceCredentials) -> TierOutcome {
        TierOutcome::Success(self.catalog.synthesize_tables())
    }
}
