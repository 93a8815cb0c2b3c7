//! # NeuronLink
//!
//! Schema-registry synchronization and metric-formula compilation for a
//! PostgREST-style data source.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                SchemaRegistrySynchronizer                │
//! │  (merge-on-sync, drift detection, description seeding)   │
//! └─────────────────────────────────────────────────────────┘
//!        │                   │                    │
//!        ▼ [extract]         ▼ [hash]             ▼ [store/ai]
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────────┐
//! │ RPC → OpenAPI│   │ URL digest + │   │ PostgREST registry │
//! │ → catalog    │   │ drift hash   │   │ rows, AI describer │
//! └──────────────┘   └──────────────┘   └────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Formula compiler                      │
//! │  required-field extraction → paren/heuristic validation  │
//! │  → spreadsheet-grammar fallback                          │
//! └─────────────────────────────────────────────────────────┘
//!        │
//!        ▼ [timeintel]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Windowed SQL rewriting (YoY/MoM/YTD/QTD/…)        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod ai;
pub mod config;
pub mod extract;
pub mod formula;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod timeintel;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::ai::{DescriptionGenerator, LlmDescriptionGenerator, NullDescriptionGenerator};
    pub use crate::config::{Settings, SourceCredentials};
    pub use crate::extract::{ExtractionTier, ReferenceCatalog, SchemaExtractor, TierOutcome};
    pub use crate::formula::{extract_required_fields, parse_formula, ParsedFormula};
    pub use crate::inference::infer_semantic_type;
    pub use crate::model::{
        ForeignKeyRef, Metric, RegisteredColumn, RegisteredTable, SchemaRegistryEntry,
        SemanticType, TimeIntelligenceConfig, TimeIntelligenceKind,
    };
    pub use crate::registry::{
        hash_connection_url, hash_schema_structure, MemoryRegistryStore, PostgrestRegistryStore,
        RegistryStore, SchemaRegistrySynchronizer, SyncOutcome,
    };
    pub use crate::timeintel::{
        build_time_intelligence_sql, requires_time_intelligence, validate_date_field,
    };
}

// Also export the most common entry points at the crate root.
pub use formula::{parse_formula, ParsedFormula};
pub use inference::infer_semantic_type;
pub use registry::{hash_connection_url, hash_schema_structure, SchemaRegistrySynchronizer};
pub use timeintel::build_time_intelligence_sql;
