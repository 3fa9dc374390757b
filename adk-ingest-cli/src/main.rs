//! # adk-ingest CLI
//!
//! Ingests a PDF or CSV source into a Pinecone index and queries it.
//!
//! ```bash
//! # Ingest the source described in the config file
//! adk-ingest ingest --config ingest.json
//!
//! # Retrieve the three closest passages
//! adk-ingest query --config ingest.json --text "enrolment in rural districts"
//!
//! # Dry run against an in-memory index
//! adk-ingest query --config ingest.json --text "dropout" --in-memory
//! ```
//!
//! Secrets are read from the environment (or a `.env` file): `PINECONE_API_KEY`
//! and the embedding key named in the config (default `OPENAI_API_KEY`).

use std::path::PathBuf;
use std::sync::Arc;

use adk_ingest::pinecone::PineconeClient;
use adk_ingest::{
    DEFAULT_TOP_K, InMemoryIndexService, IndexService, IngestPipeline, RetrievalOptions,
    ScoredMatch,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "adk-ingest")]
#[command(about = "Ingest documents into a vector index and query them")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = "ingest.json")]
    config: PathBuf,

    /// Use an in-memory index instead of Pinecone
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, embed and upsert the configured source
    Ingest,

    /// Retrieve passages similar to a query
    Query {
        /// Query text
        #[arg(short, long)]
        text: String,

        /// Maximum matches
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Namespace to search (defaults to the configured namespace or source name)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Do not return stored metadata
        #[arg(long)]
        no_metadata: bool,

        /// Do not return stored vector values
        #[arg(long)]
        no_values: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let service: Arc<dyn IndexService> = if cli.in_memory {
        info!("using in-memory index");
        Arc::new(InMemoryIndexService::new())
    } else {
        Arc::new(PineconeClient::from_env().context("PINECONE_API_KEY must be set")?)
    };

    let pipeline = IngestPipeline::builder()
        .index_config(config.index.clone())
        .embedding_provider(Arc::new(config.embedding_provider()?))
        .index_service(service)
        .build()?;

    match cli.command {
        Commands::Ingest => {
            let report = pipeline.ingest(&config.source).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Query { text, top_k, namespace, no_metadata, no_values } => {
            if cli.in_memory {
                // A fresh in-memory index is empty; fill it first.
                pipeline.ingest(&config.source).await?;
            }

            let mut options = pipeline
                .retrieval_options(Some(&config.source.file_name))
                .top_k(top_k)
                .include_metadata(!no_metadata)
                .include_values(!no_values);
            if let Some(namespace) = namespace {
                options.namespace = namespace;
            }

            let print = |m: &ScoredMatch| {
                println!("[{}] {:.4}  {}", m.id, m.score, m.original_text().unwrap_or("-"));
            };
            let matches = pipeline.query(&text, &options, Some(&print)).await;
            if matches.is_empty() {
                println!("No matches.");
            }
        }
    }

    Ok(())
}
