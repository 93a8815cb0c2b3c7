use async_trait::async_trait;

use neuronlink::config::SourceCredentials;
use neuronlink::extract::{
    parse_openapi_document, CatalogTier, ExtractionTier, ReferenceCatalog, SchemaExtractor,
    TierOutcome,
};

/// A tier that always reports the same outcome, standing in for an
/// unreachable remote tier.
struct FixedTier {
    name: &'static str,
    outcome: TierOutcome,
}

#[async_trait]
impl ExtractionTier for FixedTier {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, _creds: &SourceCredentials) -> TierOutcome {
        self.outcome.clone()
    }
}

fn creds() -> SourceCredentials {
    SourceCredentials::new("https://demo.example.co", "anon")
}

#[tokio::test]
async fn rpc_and_openapi_failures_fall_back_to_catalog() {
    // RPC transport failure, then an HTTP 401 from introspection, then
    // the catalog: the extractor must come back non-empty.
    let extractor = SchemaExtractor::with_tiers(vec![
        Box::new(FixedTier {
            name: "rpc",
            outcome: TierOutcome::Failed("rpc transport error: connection refused".to_string()),
        }),
        Box::new(FixedTier {
            name: "openapi",
            outcome: TierOutcome::Failed(
                "introspection endpoint returned status 401 Unauthorized".to_string(),
            ),
        }),
        Box::new(CatalogTier::new(ReferenceCatalog::builtin())),
    ]);

    let tables = extractor.extract_schema(&creds()).await;
    assert!(!tables.is_empty());
    assert!(tables.iter().any(|t| t.name == "orders"));
    // Catalog tables arrive fully described.
    assert!(tables.iter().all(|t| t.description.is_some()));
}

#[tokio::test]
async fn successful_remote_tier_preempts_catalog() {
    let remote_tables = parse_openapi_document(&serde_json::json!({
        "definitions": {
            "invoices": {
                "properties": {
                    "id": { "type": "integer", "description": "<pk/>" },
                    "amount": { "type": "number", "format": "numeric" }
                }
            }
        }
    }));

    let extractor = SchemaExtractor::with_tiers(vec![
        Box::new(FixedTier {
            name: "openapi",
            outcome: TierOutcome::Success(remote_tables),
        }),
        Box::new(CatalogTier::new(ReferenceCatalog::builtin())),
    ]);

    let tables = extractor.extract_schema(&creds()).await;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "invoices");
}

#[test]
fn openapi_document_parsing_end_to_end() {
    let doc = serde_json::json!({
        "swagger": "2.0",
        "definitions": {
            "orders": {
                "description": "Customer orders<long generated note>",
                "properties": {
                    "id": { "type": "integer", "format": "bigint", "description": "Note:\n<pk/>" },
                    "customer_id": {
                        "type": "integer",
                        "description": "Buyer reference. <fk table='customers' column='id'/>"
                    },
                    "status": { "type": "string" },
                    "created_at": { "type": "string", "format": "timestamp with time zone" }
                }
            },
            "customers": {
                "properties": {
                    "id": { "type": "integer", "description": "<pk/>" },
                    "company_name": { "type": "string" }
                }
            },
            "_rpc_internal": {
                "properties": { "hidden": { "type": "string" } }
            }
        }
    });

    let tables = parse_openapi_document(&doc);
    assert_eq!(tables.len(), 2);

    let orders = tables.iter().find(|t| t.name == "orders").unwrap();
    assert_eq!(orders.description.as_deref(), Some("Customer orders"));

    let id = orders.column("id").unwrap();
    assert!(id.is_primary);
    assert_eq!(id.data_type, "bigint");

    let customer_id = orders.column("customer_id").unwrap();
    let fk = customer_id.foreign_key.as_ref().unwrap();
    assert_eq!((fk.table.as_str(), fk.column.as_str()), ("customers", "id"));
    assert_eq!(customer_id.description.as_deref(), Some("Buyer reference."));

    // Format wins over type; bare type falls through.
    assert_eq!(orders.column("status").unwrap().data_type, "string");
    assert_eq!(
        orders.column("created_at").unwrap().data_type,
        "timestamp with time zone"
    );
}

#[test]
fn catalog_synthesis_matches_declared_structure() {
    let catalog = ReferenceCatalog::builtin();
    let tables = catalog.synthesize_tables();

    let order_items = tables.iter().find(|t| t.name == "order_items").unwrap();

    // Primary keys first, with integer type.
    assert_eq!(order_items.columns[0].name, "id");
    assert!(order_items.columns[0].is_primary);
    assert_eq!(order_items.columns[0].data_type, "integer");

    // Foreign keys next, carrying their references.
    let order_id = order_items.column("order_id").unwrap();
    assert_eq!(order_id.foreign_key.as_ref().unwrap().table, "orders");

    // Remaining described columns synthesize as text.
    let quantity = order_items.column("quantity").unwrap();
    assert_eq!(quantity.data_type, "text");
    assert!(quantity.description.is_some());
}

#[tokio::test]
async fn exhausted_chain_returns_empty_rather_than_failing() {
    let extractor = SchemaExtractor::with_tiers(vec![Box::new(FixedTier {
        name: "rpc",
        outcome: TierOutcome::Failed("down".to_string()),
    })]);
    assert!(extractor.extract_schema(&creds()).await.is_empty());
}
