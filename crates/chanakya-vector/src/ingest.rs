//! Ingestion pipeline
//!
//! Loads a UTF-8 corpus, cuts it into overlapping windows, embeds every
//! window and appends the results to a vector store.

use crate::{EmbeddingClient, StoredVector, VectorStore};
use chanakya_core::{ChanakyaError, DocumentChunk, Result};
use chanakya_parser::{chunk_document, ChunkConfig, DocumentParser, ParserError, PlainTextParser};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Summary of one ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Source file path
    pub source: String,
    /// Chunks cut from the source
    pub chunks: usize,
    /// Vectors appended to the store
    pub stored: usize,
    /// Store size after the run
    pub total_in_store: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// Chunk, embed and persist a corpus
pub struct IngestPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chunk_config: ChunkConfig,
    batch_size: usize,
}

impl IngestPipeline {
    /// Create a pipeline with the default 1000/200 window
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            chunk_config: ChunkConfig::default(),
            batch_size: 32,
        }
    }

    /// Set chunking parameters
    pub fn with_chunk_config(mut self, config: ChunkConfig) -> Self {
        self.chunk_config = config;
        self
    }

    /// Set the number of chunks embedded per call
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load and chunk a file without touching the store
    pub fn chunk_file(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        let doc = PlainTextParser.parse(path).map_err(parser_error)?;
        let chunks = chunk_document(&doc, &self.chunk_config).map_err(parser_error)?;

        info!(
            source = %doc.file_path,
            chars = doc.char_count(),
            chunks = chunks.len(),
            "Chunked document"
        );

        Ok(chunks
            .into_iter()
            .map(|c| DocumentChunk::new(doc.file_path.clone(), c.index, c.content))
            .collect())
    }

    /// Embed chunks and append them to the store
    pub async fn ingest_chunks(&self, chunks: Vec<DocumentChunk>) -> Result<usize> {
        let mut stored = 0;

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(ChanakyaError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            let vectors: Vec<StoredVector> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, vector)| StoredVector::from_chunk(chunk, vector))
                .collect();

            stored += self.store.add(vectors).await?;
            debug!(stored, total = chunks.len(), "Embedded batch");
        }

        Ok(stored)
    }

    /// Run the whole pipeline for one file
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let start = Instant::now();

        let chunks = self.chunk_file(path)?;
        let chunk_count = chunks.len();
        let stored = self.ingest_chunks(chunks).await?;
        let total_in_store = self.store.count().await?;

        let report = IngestReport {
            source: path.display().to_string(),
            chunks: chunk_count,
            stored,
            total_in_store,
            elapsed: start.elapsed(),
        };
        info!(
            source = %report.source,
            chunks = report.chunks,
            total = report.total_in_store,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Ingestion complete"
        );

        Ok(report)
    }
}

fn parser_error(err: ParserError) -> ChanakyaError {
    match err {
        ParserError::IoError { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
            ChanakyaError::NotFound(path)
        }
        ParserError::IoError { source, .. } => ChanakyaError::Io(source),
        ParserError::InvalidConfig(msg) => ChanakyaError::ConfigError(msg),
        other => ChanakyaError::ValidationError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenEmbedding, LetterEmbedding};
    use crate::LocalVectorStore;
    use chanakya_core::SearchBackend;
    use tempfile::TempDir;

    const THREE_SENTENCES: &str = "Kautilya served as advisor to Chandragupta Maurya. \
        The Arthashastra describes statecraft, economics and military strategy. \
        A king should protect his subjects as a father protects his children.";

    async fn pipeline(dir: &Path) -> (IngestPipeline, Arc<LocalVectorStore>) {
        let store = Arc::new(
            LocalVectorStore::open_or_create(dir.join("index"), "test", "letters")
                .await
                .unwrap(),
        );
        let pipeline = IngestPipeline::new(Arc::new(LetterEmbedding), store.clone());
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_three_sentences_make_one_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus.txt");
        std::fs::write(&corpus, THREE_SENTENCES).unwrap();

        let (pipeline, store) = pipeline(temp_dir.path()).await;
        let report = pipeline.ingest_file(&corpus).await.unwrap();

        assert_eq!(report.chunks, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_chunk_count_within_bound() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus.txt");
        let text = THREE_SENTENCES.repeat(40);
        std::fs::write(&corpus, &text).unwrap();

        let (pipeline, _store) = pipeline(temp_dir.path()).await;
        let pipeline = pipeline.with_batch_size(4);
        let report = pipeline.ingest_file(&corpus).await.unwrap();

        let bound = ChunkConfig::default().max_chunks(text.chars().count());
        assert!(report.chunks >= 1);
        assert!(report.chunks <= bound);
        assert_eq!(report.stored, report.chunks);
    }

    #[tokio::test]
    async fn test_rerun_same_chunk_count() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus.txt");
        std::fs::write(&corpus, THREE_SENTENCES.repeat(10)).unwrap();

        let (pipeline, store) = pipeline(temp_dir.path()).await;
        let first = pipeline.ingest_file(&corpus).await.unwrap();
        let second = pipeline.ingest_file(&corpus).await.unwrap();

        assert_eq!(first.chunks, second.chunks);
        // Re-ingesting into the same directory appends
        assert_eq!(store.count().await.unwrap(), first.chunks * 2);
        assert_eq!(second.total_in_store, first.chunks * 2);
    }

    #[tokio::test]
    async fn test_ingested_chunk_is_retrievable() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus.txt");
        std::fs::write(&corpus, THREE_SENTENCES).unwrap();

        let (pipeline, store) = pipeline(temp_dir.path()).await;
        pipeline.ingest_file(&corpus).await.unwrap();

        let retriever = crate::VectorRetriever::new(Arc::new(LetterEmbedding), store);
        let results = retriever.search("Who advised Chandragupta?", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, THREE_SENTENCES);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (pipeline, _store) = pipeline(temp_dir.path()).await;

        let err = pipeline
            .ingest_file(&temp_dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChanakyaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus.txt");
        std::fs::write(&corpus, THREE_SENTENCES).unwrap();

        let store = Arc::new(
            LocalVectorStore::open_or_create(temp_dir.path().join("index"), "test", "broken")
                .await
                .unwrap(),
        );
        let pipeline = IngestPipeline::new(Arc::new(BrokenEmbedding), store.clone());

        let err = pipeline.ingest_file(&corpus).await.unwrap_err();
        assert!(matches!(err, ChanakyaError::EmbeddingError(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
