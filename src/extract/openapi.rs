//! OpenAPI introspection tier.
//!
//! PostgREST publishes an OpenAPI-style document at the REST root whose
//! `definitions` map describes every exposed table. Primary and foreign
//! keys are not first-class there; PostgREST embeds them as tags inside
//! the column description text (`<pk/>`, `<fk table='T' column='C'/>`),
//! so this tier parses those back out and falls back to naming
//! conventions for primary keys.

use async_trait::async_trait;
use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionTier, TierOutcome};
use crate::config::SourceCredentials;
use crate::inference::infer_semantic_type;
use crate::model::{ForeignKeyRef, RegisteredColumn, RegisteredTable};

/// Foreign-key tag embedded in PostgREST column descriptions. Accepts
/// single or double quotes and optional whitespace before `/>`.
static FK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<fk table=['"]([^'"]+)['"] column=['"]([^'"]+)['"]\s*/>"#).unwrap()
});

/// Parse a PostgREST OpenAPI document into registry tables.
///
/// Pure function over the fetched JSON body so the parsing rules are
/// testable without a live endpoint. Definitions whose name starts with
/// `_` are internal and skipped.
pub fn parse_openapi_document(doc: &serde_json::Value) -> Vec<RegisteredTable> {
    let definitions = match doc.get("definitions").and_then(|d| d.as_object()) {
        Some(defs) => defs,
        None => return Vec::new(),
    };

    let mut tables = Vec::new();

    for (table_name, definition) in definitions {
        if table_name.starts_with('_') {
            continue;
        }

        let properties = definition
            .get("properties")
            .and_then(|p| p.as_object())
            .cloned()
            .unwrap_or_default();

        let mut columns = Vec::new();
        for (col_name, col_def) in &properties {
            let description = col_def
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("");

            let is_primary =
                description.contains("<pk/>") || is_conventional_primary_key(table_name, col_name);

            let foreign_key = FK_TAG.captures(description).map(|caps| ForeignKeyRef {
                table: caps[1].to_string(),
                column: caps[2].to_string(),
            });

            let data_type = col_def
                .get("format")
                .and_then(|f| f.as_str())
                .or_else(|| col_def.get("type").and_then(|t| t.as_str()))
                .unwrap_or("text")
                .to_string();

            columns.push(RegisteredColumn {
                name: col_name.clone(),
                data_type,
                is_primary,
                description: strip_tag_markup(description),
                semantic_type: Some(infer_semantic_type(col_name)),
                foreign_key,
            });
        }

        let table_description = definition
            .get("description")
            .and_then(|d| d.as_str())
            .and_then(strip_tag_markup);

        tables.push(RegisteredTable {
            name: table_name.clone(),
            description: table_description,
            columns,
        });
    }

    tables
}

/// Primary-key inference from naming conventions: `id`, `{table}_id`,
/// or — for pluralized table names — `{singular}_id`.
fn is_conventional_primary_key(table_name: &str, col_name: &str) -> bool {
    if col_name == "id" {
        return true;
    }
    if col_name == format!("{}_id", table_name) {
        return true;
    }
    let singular = table_name.to_singular();
    singular != table_name && col_name == format!("{}_id", singular)
}

/// Keep only the human text before the first embedded tag.
fn strip_tag_markup(description: &str) -> Option<String> {
    let text = description.split('<').next().unwrap_or("").trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// The OpenAPI introspection tier.
pub struct OpenApiTier {
    client: reqwest::Client,
}

impl OpenApiTier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenApiTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionTier for OpenApiTier {
    fn name(&self) -> &'static str {
        "openapi"
    }

    async fn run(&self, creds: &SourceCredentials) -> TierOutcome {
        let url = format!("{}/", creds.rest_base());

        let response = match self
            .client
            .get(&url)
            .header("apikey", &creds.anon_key)
            .header("Authorization", format!("Bearer {}", creds.anon_key))
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return TierOutcome::Failed(format!("introspection transport error: {}", e)),
        };

        if !response.status().is_success() {
            return TierOutcome::Failed(format!(
                "introspection endpoint returned status {}",
                response.status()
            ));
        }

        let doc: serde_json::Value = match response.json().await {
            Ok(doc) => doc,
            Err(e) => {
                return TierOutcome::Failed(format!("introspection body was not JSON: {}", e))
            }
        };

        let tables = parse_openapi_document(&doc);
        if tables.is_empty() {
            TierOutcome::Empty
        } else {
            TierOutcome::Success(tables)
        }
    }
}
