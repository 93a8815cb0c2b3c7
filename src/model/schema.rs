use serde::{Deserialize, Serialize};

/// Semantic category of a column, derived from its name or reported by the
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Primary/foreign key style columns (`id`, `customer_id`, `uuid`).
    Identifier,
    /// Dates and timestamps (`created_at`, `order_date`).
    Date,
    /// Quantitative columns suitable for aggregation (`amount`, `revenue`).
    Measure,
    /// Flags (`is_active`, `has_discount`).
    Boolean,
    /// Free-form text (`description`, `notes`).
    Text,
    /// Categorical or otherwise unclassified columns.
    Dimension,
}

/// A foreign-key reference to a column in another table.
///
/// The target table is not guaranteed to exist in the same registry
/// snapshot; a dangling reference is tolerated at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Target table name, without schema qualifier or quoting.
    pub table: String,
    /// Target column name.
    pub column: String,
}

/// A column as recorded in a registry snapshot.
///
/// Field names follow the persisted `tables_data` wire shape (camelCase,
/// with the scalar type under `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredColumn {
    pub name: String,
    /// Source-reported scalar type name (e.g. `integer`, `text`, `timestamp`).
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<SemanticType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl RegisteredColumn {
    /// Create a column with just a name and type; everything else unset.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary: false,
            description: None,
            semantic_type: None,
            foreign_key: None,
        }
    }
}

/// A table as recorded in a registry snapshot. Column order is preserved
/// from extraction; column names are unique within the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<RegisteredColumn>,
}

impl RegisteredTable {
    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&RegisteredColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Qualified `table.column` names for every column, in column order.
    pub fn qualified_field_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", self.name, c.name))
            .collect()
    }
}

/// A persisted registry snapshot for one data source.
///
/// Keyed by `db_url_hash`, the digest of the normalized connection URL.
/// Created on the first successful sync and updated (never deleted) by
/// subsequent syncs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistryEntry {
    pub db_url_hash: String,
    pub tables: Vec<RegisteredTable>,
    /// Structural fingerprint of `tables` at the last sync; empty when the
    /// entry is transient (registry storage unavailable).
    pub schema_hash: String,
    /// RFC 3339 timestamp of the last sync; empty when transient.
    pub last_synced_at: String,
}

impl SchemaRegistryEntry {
    /// An empty entry for a source that has never synced successfully.
    pub fn empty(db_url_hash: impl Into<String>) -> Self {
        Self {
            db_url_hash: db_url_hash.into(),
            tables: Vec::new(),
            schema_hash: String::new(),
            last_synced_at: String::new(),
        }
    }

    /// Look up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&RegisteredTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}
