//! Schema extraction from a live or cached data source.
//!
//! Extraction runs through an ordered chain of strategies, each materially
//! cheaper and more reliable than the one before it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     SchemaExtractor                      │
//! │                                                          │
//! │   1. RpcTier        rpc/get_schema_metadata (richest)    │
//! │   2. OpenApiTier    GET /rest/v1/ introspection          │
//! │   3. CatalogTier    built-in reference catalog           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Tiers run strictly in order, never concurrently. A failing tier is a
//! logged warning, not an error; the catalog tier never fails, so the
//! extractor as a whole always yields a non-empty table set even when the
//! live source is completely unreachable.

mod catalog;
mod openapi;
mod rpc;

pub use catalog::{CatalogTier, ReferenceCatalog};
pub use openapi::{parse_openapi_document, OpenApiTier};
pub use rpc::{map_rpc_tables, RpcTier};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SourceCredentials;
use crate::model::RegisteredTable;

/// Outcome of running one extraction tier.
///
/// Tiers report failure as data so the orchestrator's fall-through is
/// explicit and each tier is testable in isolation.
#[derive(Debug, Clone)]
pub enum TierOutcome {
    /// The tier produced at least one table.
    Success(Vec<RegisteredTable>),
    /// The tier ran but found nothing usable.
    Empty,
    /// The tier could not run (transport error, bad status, bad payload).
    Failed(String),
}

/// One strategy for obtaining schema metadata.
#[async_trait]
pub trait ExtractionTier: Send + Sync {
    /// Tier name for logging.
    fn name(&self) -> &'static str;

    /// Attempt extraction against the given source.
    async fn run(&self, creds: &SourceCredentials) -> TierOutcome;
}

/// The layered schema extractor.
pub struct SchemaExtractor {
    tiers: Vec<Box<dyn ExtractionTier>>,
}

impl SchemaExtractor {
    /// Build the default chain: RPC, then OpenAPI introspection, then the
    /// reference catalog.
    pub fn new(catalog: ReferenceCatalog) -> Self {
        Self {
            tiers: vec![
                Box::new(RpcTier::new()),
                Box::new(OpenApiTier::new()),
                Box::new(CatalogTier::new(catalog)),
            ],
        }
    }

    /// Build an extractor with a custom tier chain.
    pub fn with_tiers(tiers: Vec<Box<dyn ExtractionTier>>) -> Self {
        Self { tiers }
    }

    /// Run the tier chain in order and return the first non-empty success.
    ///
    /// Returns an empty vec only if every tier fails or comes back empty,
    /// which the default chain cannot do (the catalog tier is total).
    pub async fn extract_schema(&self, creds: &SourceCredentials) -> Vec<RegisteredTable> {
        for tier in &self.tiers {
            match tier.run(creds).await {
                TierOutcome::Success(tables) => {
                    info!(
                        tier = tier.name(),
                        tables = tables.len(),
                        "schema extraction succeeded"
                    );
                    return tables;
                }
                TierOutcome::Empty => {
                    warn!(tier = tier.name(), "extraction tier returned no tables");
                }
                TierOutcome::Failed(reason) => {
                    warn!(tier = tier.name(), %reason, "extraction tier failed");
                }
            }
        }
        Vec::new()
    }
}

/// Strip schema qualifiers and quoting from a foreign-key table
/// reference (`public."orders"` → `orders`).
pub(crate) fn normalize_fk_table(raw: &str) -> String {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect();
    match unquoted.rsplit_once('.') {
        Some((_, bare)) => bare.to_string(),
        None => unquoted,
    }
}
