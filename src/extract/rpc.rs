//! RPC extraction tier.
//!
//! Calls a predefined remote procedure (`get_schema_metadata`) on the
//! source, which returns fully-shaped table metadata in one round trip.
//! This is the richest tier: it carries descriptions, semantic types, and
//! resolved foreign keys straight from the source. It is also the least
//! likely to exist, so every error falls through to the next tier.

use async_trait::async_trait;
use serde::Deserialize;

use super::{normalize_fk_table, ExtractionTier, TierOutcome};
use crate::config::SourceCredentials;
use crate::model::{ForeignKeyRef, RegisteredColumn, RegisteredTable, SemanticType};

/// Procedure name invoked on the source.
const PROCEDURE: &str = "get_schema_metadata";

/// Row shape returned by the procedure.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcTableRow {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<RpcColumnRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcColumnRow {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub semantic_type: Option<SemanticType>,
    #[serde(default)]
    pub foreign_key: Option<RpcForeignKey>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcForeignKey {
    pub table: String,
    pub column: String,
}

/// Map procedure rows onto registry tables, normalizing FK references.
pub fn map_rpc_tables(rows: Vec<serde_json::Value>) -> Result<Vec<RegisteredTable>, String> {
    let rows: Vec<RpcTableRow> = rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("malformed {} row: {}", PROCEDURE, e))?;

    Ok(rows
        .into_iter()
        .map(|row| RegisteredTable {
            name: row.name,
            description: row.description.filter(|d| !d.trim().is_empty()),
            columns: row
                .columns
                .into_iter()
                .map(|col| RegisteredColumn {
                    name: col.name,
                    data_type: col.data_type.unwrap_or_else(|| "text".to_string()),
                    is_primary: col.is_primary,
                    description: col.description.filter(|d| !d.trim().is_empty()),
                    semantic_type: col.semantic_type,
                    foreign_key: col.foreign_key.map(|fk| ForeignKeyRef {
                        table: normalize_fk_table(&fk.table),
                        column: fk.column,
                    }),
                })
                .collect(),
        })
        .collect())
}

/// The RPC tier.
pub struct RpcTier {
    client: reqwest::Client,
}

impl RpcTier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RpcTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionTier for RpcTier {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn run(&self, creds: &SourceCredentials) -> TierOutcome {
        let url = format!("{}/rpc/{}", creds.rest_base(), PROCEDURE);

        let response = match self
            .client
            .post(&url)
            .header("apikey", &creds.anon_key)
            .header("Authorization", format!("Bearer {}", creds.anon_key))
            .json(&serde_json::json!({}))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return TierOutcome::Failed(format!("rpc transport error: {}", e)),
        };

        if !response.status().is_success() {
            return TierOutcome::Failed(format!(
                "rpc call returned status {}",
                response.status()
            ));
        }

        let rows: Vec<serde_json::Value> = match response.json().await {
            Ok(rows) => rows,
            Err(e) => return TierOutcome::Failed(format!("rpc response was not JSON: {}", e)),
        };

        match map_rpc_tables(rows) {
            Ok(tables) if tables.is_empty() => TierOutcome::Empty,
            Ok(tables) => TierOutcome::Success(tables),
            Err(reason) => TierOutcome::Failed(reason),
        }
    }
}
