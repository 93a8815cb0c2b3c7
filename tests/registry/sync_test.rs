use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use neuronlink::ai::{AiResult, DescriptionGenerator, StaticDescriptionGenerator};
use neuronlink::config::SourceCredentials;
use neuronlink::extract::{
    CatalogTier, ExtractionTier, ReferenceCatalog, SchemaExtractor, TierOutcome,
};
use neuronlink::model::{RegisteredColumn, RegisteredTable};
use neuronlink::registry::{
    hash_connection_url, hash_schema_structure, MemoryRegistryStore, RegistryError,
    RegistryStore, SchemaRegistrySynchronizer,
};

/// A tier that returns a fixed outcome.
struct FixedTier(TierOutcome);

#[async_trait]
impl ExtractionTier for FixedTier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn run(&self, _creds: &SourceCredentials) -> TierOutcome {
        self.0.clone()
    }
}

/// Records every batch of table names sent to the AI collaborator.
#[derive(Default)]
struct RecordingDescriber {
    calls: Mutex<Vec<Vec<String>>>,
    answers: HashMap<String, String>,
}

impl RecordingDescriber {
    fn answering(answers: &[(&str, &str)]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DescriptionGenerator for RecordingDescriber {
    async fn generate_table_descriptions(
        &self,
        table_names: &[String],
    ) -> AiResult<HashMap<String, String>> {
        self.calls.lock().unwrap().push(table_names.to_vec());
        Ok(table_names
            .iter()
            .filter_map(|name| self.answers.get(name).map(|d| (name.clone(), d.clone())))
            .collect())
    }
}

fn creds() -> SourceCredentials {
    SourceCredentials::new("https://demo.example.co", "anon")
}

fn column(name: &str, data_type: &str) -> RegisteredColumn {
    RegisteredColumn::new(name, data_type)
}

fn table(name: &str, description: Option<&str>, columns: Vec<RegisteredColumn>) -> RegisteredTable {
    RegisteredTable {
        name: name.to_string(),
        description: description.map(|d| d.to_string()),
        columns,
    }
}

/// Two tables not present in the reference catalog; one described by the
/// source, one not.
fn extracted_tables() -> Vec<RegisteredTable> {
    vec![
        table(
            "invoices",
            Some("Invoice headers."),
            vec![column("id", "integer"), column("total_amount", "numeric")],
        ),
        table(
            "payments",
            None,
            vec![column("id", "integer"), column("invoice_id", "integer")],
        ),
    ]
}

fn synchronizer_with(
    store: Arc<MemoryRegistryStore>,
    outcome: TierOutcome,
    describer: Arc<RecordingDescriber>,
) -> SchemaRegistrySynchronizer {
    SchemaRegistrySynchronizer::new(
        Box::new(store),
        SchemaExtractor::with_tiers(vec![Box::new(FixedTier(outcome))]),
        Box::new(describer),
        ReferenceCatalog::builtin(),
    )
}

#[tokio::test]
async fn first_sync_describes_only_undescribed_tables_via_ai() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));

    let synchronizer = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer.clone(),
    );

    let outcome = synchronizer.sync(&creds()).await;

    // Exactly one AI call, with exactly the one undescribed table.
    assert_eq!(describer.calls(), vec![vec!["payments".to_string()]]);

    assert!(!outcome.drift_detected);
    let entry = &outcome.entry;
    assert_eq!(entry.db_url_hash, hash_connection_url(&creds().url));
    assert_eq!(
        entry.table("invoices").unwrap().description.as_deref(),
        Some("Invoice headers.")
    );
    assert_eq!(
        entry.table("payments").unwrap().description.as_deref(),
        Some("Payments applied to invoices.")
    );
    assert!(!entry.schema_hash.is_empty());
    assert!(!entry.last_synced_at.is_empty());

    // The merged entry was persisted.
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn ai_gaps_leave_tables_undescribed() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::default());

    let synchronizer = synchronizer_with(
        store,
        TierOutcome::Success(extracted_tables()),
        describer.clone(),
    );

    let outcome = synchronizer.sync(&creds()).await;
    assert!(outcome.entry.table("payments").unwrap().description.is_none());
    assert_eq!(describer.calls().len(), 1);
}

#[tokio::test]
async fn first_sync_seeds_descriptions_from_catalog_before_ai() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::default());

    // "orders" exists in the built-in catalog, so only "payments" should
    // reach the AI collaborator.
    let tables = vec![
        table("orders", None, vec![column("id", "integer")]),
        table("payments", None, vec![column("id", "integer")]),
    ];

    let synchronizer = synchronizer_with(
        store,
        TierOutcome::Success(tables),
        describer.clone(),
    );

    let outcome = synchronizer.sync(&creds()).await;
    assert!(outcome.entry.table("orders").unwrap().description.is_some());
    assert_eq!(describer.calls(), vec![vec!["payments".to_string()]]);
}

#[tokio::test]
async fn second_sync_detects_drift_and_preserves_descriptions() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));

    let first = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer.clone(),
    );
    let first_outcome = first.sync(&creds()).await;
    assert!(!first_outcome.drift_detected);

    // Same schema, but one column's type changed — and the source now
    // reports no descriptions at all.
    let mut drifted = extracted_tables();
    drifted[0].description = None;
    drifted[0].columns[1] = column("total_amount", "money");

    let second = synchronizer_with(
        store.clone(),
        TierOutcome::Success(drifted),
        Arc::new(RecordingDescriber::default()),
    );
    let second_outcome = second.sync(&creds()).await;

    assert!(second_outcome.drift_detected);
    // Table descriptions backfill from the previous snapshot.
    assert_eq!(
        second_outcome
            .entry
            .table("invoices")
            .unwrap()
            .description
            .as_deref(),
        Some("Invoice headers.")
    );
    assert_eq!(
        second_outcome
            .entry
            .table("payments")
            .unwrap()
            .description
            .as_deref(),
        Some("Payments applied to invoices.")
    );
}

#[tokio::test]
async fn unchanged_schema_reports_no_drift() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));

    let synchronizer = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer,
    );

    synchronizer.sync(&creds()).await;
    let again = synchronizer_with(
        store,
        TierOutcome::Success(extracted_tables()),
        Arc::new(RecordingDescriber::default()),
    );
    let outcome = again.sync(&creds()).await;
    assert!(!outcome.drift_detected);
    assert_eq!(
        outcome.entry.schema_hash,
        hash_schema_structure(&extracted_tables())
    );
}

#[tokio::test]
async fn missing_registry_relation_degrades_to_transient_result() {
    let store = Arc::new(MemoryRegistryStore::with_relation_missing());
    let describer = Arc::new(RecordingDescriber::default());

    let synchronizer = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer.clone(),
    );

    let outcome = synchronizer.sync(&creds()).await;

    assert!(!outcome.drift_detected);
    assert_eq!(outcome.entry.tables.len(), 2);
    assert_eq!(outcome.entry.schema_hash, "");
    assert_eq!(outcome.entry.last_synced_at, "");
    // Nothing persisted, no AI spend on a degraded run.
    assert!(store.is_empty().await);
    assert!(describer.calls().is_empty());
}

#[tokio::test]
async fn empty_extraction_keeps_previous_snapshot() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));

    let first = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer,
    );
    let first_outcome = first.sync(&creds()).await;

    // Source outage: the whole tier chain comes back empty.
    let outage = synchronizer_with(
        store.clone(),
        TierOutcome::Empty,
        Arc::new(RecordingDescriber::default()),
    );
    let outcome = outage.sync(&creds()).await;

    assert!(!outcome.drift_detected);
    assert_eq!(outcome.entry, first_outcome.entry);
    // The known-good snapshot was not overwritten.
    let stored = store
        .load(&hash_connection_url(&creds().url))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, first_outcome.entry);
}

#[tokio::test]
async fn empty_extraction_with_no_previous_entry_yields_empty_entry() {
    let store = Arc::new(MemoryRegistryStore::new());
    let synchronizer = synchronizer_with(
        store.clone(),
        TierOutcome::Empty,
        Arc::new(RecordingDescriber::default()),
    );

    let outcome = synchronizer.sync(&creds()).await;
    assert!(!outcome.drift_detected);
    assert!(outcome.entry.tables.is_empty());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn fallback_catalog_extraction_persists_normally() {
    // RPC fails, introspection fails: the catalog tier's result is a
    // real extraction, not a "zero tables" outage.
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::default());

    let synchronizer = SchemaRegistrySynchronizer::new(
        Box::new(store.clone()),
        SchemaExtractor::with_tiers(vec![
            Box::new(FixedTier(TierOutcome::Failed("rpc down".to_string()))),
            Box::new(FixedTier(TierOutcome::Failed("401".to_string()))),
            Box::new(CatalogTier::new(ReferenceCatalog::builtin())),
        ]),
        Box::new(describer.clone()),
        ReferenceCatalog::builtin(),
    );

    let outcome = synchronizer.sync(&creds()).await;
    assert!(!outcome.entry.tables.is_empty());
    assert_eq!(store.len().await, 1);
    // Catalog tables are already described, so the AI stays idle.
    assert!(describer.calls().is_empty());
}

#[tokio::test]
async fn update_table_description_round_trips() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));

    let synchronizer = synchronizer_with(
        store.clone(),
        TierOutcome::Success(extracted_tables()),
        describer,
    );
    synchronizer.sync(&creds()).await;

    let db_url_hash = hash_connection_url(&creds().url);
    let updated = synchronizer
        .update_table_description(&db_url_hash, "invoices", "Invoices issued to customers.")
        .await
        .unwrap();

    assert_eq!(
        updated.table("invoices").unwrap().description.as_deref(),
        Some("Invoices issued to customers.")
    );

    let stored = store.load(&db_url_hash).await.unwrap().unwrap();
    assert_eq!(
        stored.table("invoices").unwrap().description.as_deref(),
        Some("Invoices issued to customers.")
    );
}

#[tokio::test]
async fn update_table_description_fails_loudly_for_missing_entry() {
    let store = Arc::new(MemoryRegistryStore::new());
    let synchronizer = synchronizer_with(
        store,
        TierOutcome::Empty,
        Arc::new(RecordingDescriber::default()),
    );

    let err = synchronizer
        .update_table_description("no-such-key", "orders", "text")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::EntryNotFound(_)));
}

#[tokio::test]
async fn update_table_description_fails_loudly_for_missing_table() {
    let store = Arc::new(MemoryRegistryStore::new());
    let describer = Arc::new(RecordingDescriber::answering(&[(
        "payments",
        "Payments applied to invoices.",
    )]));
    let synchronizer = synchronizer_with(
        store,
        TierOutcome::Success(extracted_tables()),
        describer,
    );
    synchronizer.sync(&creds()).await;

    let db_url_hash = hash_connection_url(&creds().url);
    let err = synchronizer
        .update_table_description(&db_url_hash, "missing_table", "text")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::TableNotFound(_)));
}

#[tokio::test]
async fn static_describer_is_interchangeable() {
    // The trait seam accepts any generator implementation.
    let store = Arc::new(MemoryRegistryStore::new());
    let answers: HashMap<String, String> = [(
        "payments".to_string(),
        "Payments applied to invoices.".to_string(),
    )]
    .into_iter()
    .collect();

    let synchronizer = SchemaRegistrySynchronizer::new(
        Box::new(store),
        SchemaExtractor::with_tiers(vec![Box::new(FixedTier(TierOutcome::Success(
            extracted_tables(),
        )))]),
        Box::new(StaticDescriptionGenerator::new(answers)),
        ReferenceCatalog::builtin(),
    );

    let outcome = synchronizer.sync(&creds()).await;
    assert_eq!(
        outcome.entry.table("payments").unwrap().description.as_deref(),
        Some("Payments applied to invoices.")
    );
}
