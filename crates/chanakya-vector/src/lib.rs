//! Chanakya Vector - Embeddings, vector storage and retrieval
//!
//! Provides the embedding clients, a directory-backed vector store,
//! the retriever used at query time and the ingestion pipeline that
//! populates the store.

use async_trait::async_trait;
use chanakya_core::{ChanakyaError, DocumentChunk, Result, SearchBackend, SearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod embedding;
pub mod ingest;
pub mod local_store;

pub use embedding::{create_embedding_client, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding};
pub use ingest::{IngestPipeline, IngestReport};
pub use local_store::{CollectionMetadata, LocalVectorStore};

#[cfg(feature = "local-embeddings")]
pub use embedding::LocalEmbedding;

/// A chunk's text paired with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVector {
    pub id: Uuid,
    pub source: String,
    pub chunk_index: u32,
    pub content: String,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl StoredVector {
    /// Pair a chunk with its embedding
    pub fn from_chunk(chunk: DocumentChunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            source: chunk.source,
            chunk_index: chunk.chunk_index,
            content: chunk.content,
            vector,
            created_at: Utc::now(),
        }
    }
}

/// Trait for vector database operations
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append vectors, returning how many were stored
    async fn add(&self, vectors: Vec<StoredVector>) -> Result<usize>;

    /// Search for similar vectors, most similar first
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored vectors
    async fn count(&self) -> Result<usize>;

    /// Remove every stored vector
    async fn clear(&self) -> Result<()>;

    /// Dimension of the stored vectors, `None` while empty
    async fn dimension(&self) -> Result<Option<usize>>;
}

/// Cosine similarity in [-1, 1]; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// ============================================================================
// Retriever
// ============================================================================

/// Text-in retrieval over an embedding client and a vector store
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Fail when the embedder's output size differs from the indexed vectors
    pub async fn check_dimension(&self) -> Result<()> {
        let Some(stored) = self.store.dimension().await? else {
            return Ok(());
        };
        let expected = self.embedder.dimension();
        if stored != expected {
            return Err(ChanakyaError::SearchError(format!(
                "Index holds {stored}-dimensional vectors but {} produces {expected}",
                self.embedder.model_name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for VectorRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query_vector = self.embedder.embed(query).await?;
        let results = self.store.search(&query_vector, limit).await?;
        tracing::debug!(returned = results.len(), limit, "Vector search completed");
        Ok(results)
    }

    fn name(&self) -> &str {
        "vector"
    }
}


#[cfg(test)]
mod tests {
    use super::testing::LetterEmbedding;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_retriever_returns_at_most_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(
            LocalVectorStore::open_or_create(temp_dir.path(), "test", "letters")
                .await
                .unwrap(),
        );

        let embedder = LetterEmbedding;
        let texts = [
            "taxation", "treasury", "espionage", "diplomacy", "warfare", "justice", "agriculture",
            "mining",
        ];
        let mut vectors = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let v = embedder.embed(text).await.unwrap();
            vectors.push(StoredVector::from_chunk(
                DocumentChunk::new("test.txt", i as u32, *text),
                v,
            ));
        }
        store.add(vectors).await.unwrap();

        let retriever = VectorRetriever::new(Arc::new(LetterEmbedding), store);
        let results = retriever.search("espionage", 5).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].content, "espionage");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    /// Embedder reporting a different size than the letter vectors
    struct WideEmbedding;

    #[async_trait]
    impl EmbeddingClient for WideEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 384])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; 384]).collect())
        }

        fn dimension(&self) -> usize {
            384
        }

        fn model_name(&self) -> &str {
            "wide"
        }
    }

    async fn letter_store(dir: &TempDir) -> Arc<LocalVectorStore> {
        let store = Arc::new(
            LocalVectorStore::open_or_create(dir.path(), "test", "letters")
                .await
                .unwrap(),
        );
        let v = LetterEmbedding.embed("arthashastra").await.unwrap();
        store
            .add(vec![StoredVector::from_chunk(
                DocumentChunk::new("test.txt", 0, "arthashastra"),
                v,
            )])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_check_dimension_matches() {
        let temp_dir = TempDir::new().unwrap();
        let store = letter_store(&temp_dir).await;

        let retriever = VectorRetriever::new(Arc::new(LetterEmbedding), store);
        assert!(retriever.check_dimension().await.is_ok());
    }

    #[tokio::test]
    async fn test_check_dimension_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let store = letter_store(&temp_dir).await;

        let retriever = VectorRetriever::new(Arc::new(WideEmbedding), store);
        let err = retriever.check_dimension().await.unwrap_err();
        assert!(matches!(err, ChanakyaError::SearchError(ref m) if m.contains("26") && m.contains("384")));
    }

    #[tokio::test]
    async fn test_check_dimension_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(LocalVectorStore::open(temp_dir.path()).await.unwrap());

        let retriever = VectorRetriever::new(Arc::new(WideEmbedding), store);
        assert!(retriever.check_dimension().await.is_ok());
    }
}
