//! NeuronLink CLI - Sync schema registries and check metric formulas
//!
//! Usage:
//!   neuronlink sync [--url <url> --key <key>]
//!   neuronlink describe <table> <text>
//!   neuronlink check <formula> [--fields a,b,c]
//!   neuronlink infer <name>...
//!
//! Examples:
//!   neuronlink sync --url https://demo.example.co --key $ANON_KEY
//!   neuronlink check "SUM(sales) - SUM(cost)" --fields sales,cost
//!   neuronlink infer created_at total_amount is_active

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use neuronlink::ai::{DescriptionGenerator, LlmDescriptionGenerator, NullDescriptionGenerator};
use neuronlink::config::{Settings, SourceCredentials};
use neuronlink::extract::{ReferenceCatalog, SchemaExtractor};
use neuronlink::formula::parse_formula;
use neuronlink::inference::{infer_semantic_type, matching_rule_name};
use neuronlink::registry::{
    hash_connection_url, PostgrestRegistryStore, SchemaRegistrySynchronizer,
};

#[derive(Parser)]
#[command(name = "neuronlink")]
#[command(about = "NeuronLink - schema registry sync and metric formula tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the schema registry for a data source
    Sync {
        /// Source base URL (defaults to config/env)
        #[arg(long)]
        url: Option<String>,

        /// Source API key (defaults to config/env)
        #[arg(long)]
        key: Option<String>,
    },

    /// Set a table description in the registry
    Describe {
        /// Table name (exact match)
        table: String,

        /// New description text
        text: String,

        /// Source base URL (defaults to config/env)
        #[arg(long)]
        url: Option<String>,

        /// Source API key (defaults to config/env)
        #[arg(long)]
        key: Option<String>,
    },

    /// Validate a metric formula and show its field dependencies
    Check {
        /// The formula text
        formula: String,

        /// Comma-separated list of known fields
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Infer semantic types for column names
    Infer {
        /// Column names to classify
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("neuronlink=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { url, key } => {
            let creds = match resolve_credentials(url, key) {
                Ok(creds) => creds,
                Err(message) => {
                    eprintln!("error: {}", message);
                    return ExitCode::FAILURE;
                }
            };
            run_sync(&creds).await
        }

        Commands::Describe {
            table,
            text,
            url,
            key,
        } => {
            let creds = match resolve_credentials(url, key) {
                Ok(creds) => creds,
                Err(message) => {
                    eprintln!("error: {}", message);
                    return ExitCode::FAILURE;
                }
            };
            run_describe(&creds, &table, &text).await
        }

        Commands::Check { formula, fields } => {
            let parsed = parse_formula(&formula, &fields);
            if parsed.is_valid {
                println!("valid");
                if !parsed.required_fields.is_empty() {
                    println!("required fields: {}", parsed.required_fields.join(", "));
                }
                ExitCode::SUCCESS
            } else {
                println!(
                    "invalid: {}",
                    parsed.error.as_deref().unwrap_or("unknown error")
                );
                ExitCode::FAILURE
            }
        }

        Commands::Infer { names } => {
            for name in names {
                println!(
                    "{}: {:?} (rule: {})",
                    name,
                    infer_semantic_type(&name),
                    matching_rule_name(&name)
                );
            }
            ExitCode::SUCCESS
        }
    }
}

/// Resolve credentials from flags, then config file, then environment.
fn resolve_credentials(url: Option<String>, key: Option<String>) -> Result<SourceCredentials, String> {
    if let (Some(url), Some(key)) = (url.clone(), key.clone()) {
        return Ok(SourceCredentials::new(url, key));
    }

    let settings = Settings::load().map_err(|e| e.to_string())?;
    if let Some(creds) = settings.source_credentials().map_err(|e| e.to_string())? {
        return Ok(SourceCredentials::new(
            url.unwrap_or(creds.url),
            key.unwrap_or(creds.anon_key),
        ));
    }

    let env_creds = SourceCredentials::from_env().map_err(|e| e.to_string())?;
    Ok(SourceCredentials::new(
        url.unwrap_or(env_creds.url),
        key.unwrap_or(env_creds.anon_key),
    ))
}

/// Build the synchronizer from settings and run one sync.
async fn run_sync(creds: &SourceCredentials) -> ExitCode {
    let synchronizer = build_synchronizer(creds);
    let outcome = synchronizer.sync(creds).await;

    println!(
        "synced {} tables (drift: {})",
        outcome.entry.tables.len(),
        if outcome.drift_detected { "yes" } else { "no" }
    );
    for table in &outcome.entry.tables {
        let described = table.description.as_deref().unwrap_or("-");
        println!("  {:<20} {} columns  {}", table.name, table.columns.len(), described);
    }
    ExitCode::SUCCESS
}

async fn run_describe(creds: &SourceCredentials, table: &str, text: &str) -> ExitCode {
    let synchronizer = build_synchronizer(creds);
    let db_url_hash = hash_connection_url(&creds.url);

    match synchronizer
        .update_table_description(&db_url_hash, table, text)
        .await
    {
        Ok(_) => {
            println!("updated description for {}", table);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_synchronizer(creds: &SourceCredentials) -> SchemaRegistrySynchronizer {
    let catalog = ReferenceCatalog::builtin();
    let describer: Box<dyn DescriptionGenerator> = match Settings::load().ok().and_then(|s| s.ai) {
        Some(ai) => {
            let api_key = neuronlink::config::expand_env_vars(&ai.api_key)
                .unwrap_or_else(|_| ai.api_key.clone());
            Box::new(LlmDescriptionGenerator::new(ai.base_url, api_key, ai.model))
        }
        None => Box::new(NullDescriptionGenerator),
    };

    SchemaRegistrySynchronizer::new(
        Box::new(PostgrestRegistryStore::new(creds)),
        SchemaExtractor::new(catalog.clone()),
        describer,
        catalog,
    )
}
