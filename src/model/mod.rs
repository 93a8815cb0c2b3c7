//! Core data model for the schema registry and metric definitions.
//!
//! These types are the wire-facing shapes of the system: `RegisteredTable`
//! collections travel through the extraction tiers, into the structural
//! hash, and out to the persistence collaborator as `tables_data`; `Metric`
//! rows are what the metrics store reads and writes.

mod metric;
mod schema;

pub use metric::{Metric, TimeIntelligenceConfig, TimeIntelligenceKind};
pub use schema::{
    ForeignKeyRef, RegisteredColumn, RegisteredTable, SchemaRegistryEntry, SemanticType,
};
