//! Chanakya CLI - Command-line interface
//!
//! Usage:
//!   chanakya ingest [--file arthashastra.txt] [--index ./vector_index] [--reset]
//!   chanakya ask <question>
//!   chanakya stats

use anyhow::Context;
use chanakya_core::{AppConfig, LlmClient, LoggingConfig};
use chanakya_parser::ChunkConfig;
use chanakya_rag::{create_llm_client, ChanakyaRag};
use chanakya_vector::{
    create_embedding_client, EmbeddingClient, IngestPipeline, LocalVectorStore, VectorRetriever,
    VectorStore,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chanakya")]
#[command(about = "Ask Chanakya about the Arthashastra")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and store the corpus
    Ingest {
        /// Corpus file (defaults to index.source_file)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Index directory (defaults to index.path)
        #[arg(short, long)]
        index: Option<PathBuf>,

        /// Remove existing vectors before ingesting
        #[arg(long)]
        reset: bool,
    },
    /// Ask a single question
    Ask {
        /// Question to ask
        question: String,

        /// Also print the retrieved passages
        #[arg(long)]
        show_sources: bool,
    },
    /// Show index statistics
    Stats {
        /// Index directory (defaults to index.path)
        #[arg(short, long)]
        index: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Ingest { file, index, reset } => ingest(config, file, index, reset).await,
        Commands::Ask {
            question,
            show_sources,
        } => ask(config, &question, show_sources).await,
        Commands::Stats { index } => stats(config, index).await,
    }
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout is reserved for command output
    if config.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn ingest(
    config: AppConfig,
    file: Option<PathBuf>,
    index: Option<PathBuf>,
    reset: bool,
) -> anyhow::Result<()> {
    let file = file.unwrap_or(config.index.source_file);
    let index = index.unwrap_or(config.index.path);

    let chunk_config = ChunkConfig::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
    let embedder: Arc<dyn EmbeddingClient> =
        Arc::from(create_embedding_client(&config.embedding)?);
    let store = Arc::new(
        LocalVectorStore::open_or_create(&index, &config.index.collection, embedder.model_name())
            .await?,
    );

    if reset {
        store.clear().await?;
        println!("Cleared existing vectors in {}", index.display());
    }

    let pipeline = IngestPipeline::new(embedder, store.clone())
        .with_chunk_config(chunk_config)
        .with_batch_size(config.embedding.batch_size);

    let chunks = pipeline
        .chunk_file(&file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    println!("Total chunks: {}", chunks.len());

    println!("Creating vector store...");
    pipeline.ingest_chunks(chunks).await?;

    let total = store.count().await?;
    tracing::info!(total, index = %index.display(), "Index updated");
    println!("Done! Vector store saved to {}", index.display());

    Ok(())
}

async fn ask(config: AppConfig, question: &str, show_sources: bool) -> anyhow::Result<()> {
    let embedder: Arc<dyn EmbeddingClient> =
        Arc::from(create_embedding_client(&config.embedding)?);
    let store = Arc::new(LocalVectorStore::open(&config.index.path).await?);
    if store.count().await? == 0 {
        anyhow::bail!(
            "Index at {} is empty, run `chanakya ingest` first",
            config.index.path.display()
        );
    }

    let retriever = VectorRetriever::new(embedder, store);
    if let Err(e) = retriever.check_dimension().await {
        tracing::warn!(error = %e, "Embedding model does not match the index");
    }
    let retriever = Arc::new(retriever);
    let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);
    let rag = ChanakyaRag::new(retriever, llm, &config.rag);

    let answer = rag.ask(question).await?;
    println!("{}", answer.response);

    if show_sources {
        println!();
        for (i, source) in answer.sources.iter().enumerate() {
            println!(
                "[{}] {}#{} (score {:.3})",
                i + 1,
                source.source.source,
                source.source.chunk_index,
                source.score
            );
        }
    }

    Ok(())
}

async fn stats(config: AppConfig, index: Option<PathBuf>) -> anyhow::Result<()> {
    let index = index.unwrap_or(config.index.path);
    let store = LocalVectorStore::open(&index).await?;

    println!("Index: {}", index.display());
    println!("Chunks: {}", store.count().await?);

    match store.metadata().await {
        Some(meta) => {
            println!("Collection: {}", meta.name);
            println!("Embedding model: {}", meta.embedding_model);
            println!("Dimension: {}", meta.dimension);
            println!("Metric: {}", meta.metric);
            println!("Created: {}", meta.created_at);
        }
        None => println!("Collection: (not created)"),
    }

    Ok(())
}
