//! Application state management
//!
//! Author: hephaex@gmail.com

use chanakya_core::{AppConfig, LlmClient, Result, SearchBackend};
use chanakya_rag::{create_llm_client, ChanakyaRag};
use chanakya_vector::{
    create_embedding_client, EmbeddingClient, LocalVectorStore, VectorRetriever, VectorStore,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Chat requests served
    pub request_count: AtomicU64,
    /// Retrieve-then-generate pipeline
    pub rag: Arc<ChanakyaRag>,
    /// Vector index backing retrieval
    pub store: Arc<dyn VectorStore>,
}

impl AppState {
    /// Assemble state from ready-made components
    pub fn new(config: AppConfig, rag: Arc<ChanakyaRag>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            rag,
            store,
        }
    }

    /// Open the index and create the model clients named in `config`
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingClient> =
            Arc::from(create_embedding_client(&config.embedding)?);
        let store: Arc<dyn VectorStore> =
            Arc::new(LocalVectorStore::open(&config.index.path).await?);
        let retriever = VectorRetriever::new(embedder, store.clone());
        if let Err(e) = retriever.check_dimension().await {
            tracing::warn!(error = %e, "Embedding model does not match the index");
        }
        let retriever: Arc<dyn SearchBackend> = Arc::new(retriever);
        let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);

        let rag = Arc::new(ChanakyaRag::new(retriever, llm, &config.rag));
        Ok(Self::new(config, rag, store))
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
