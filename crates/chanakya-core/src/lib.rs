//! Chanakya Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the system:
//! - Common error types
//! - Document chunk and search result models
//! - Shared traits for retrieval backends and LLM clients
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, IndexConfig, LlmConfig,
    LlmProvider, LoggingConfig, RagConfig, ServerConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Chanakya operations
#[derive(Error, Debug)]
pub enum ChanakyaError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for ChanakyaError {
    fn from(err: ConfigError) -> Self {
        ChanakyaError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChanakyaError>;

// ============================================================================
// Document Models
// ============================================================================

/// A chunk of source text ready to be embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique identifier
    pub id: Uuid,

    /// Path of the file the chunk was cut from
    pub source: String,

    /// Chunk index within the document
    pub chunk_index: u32,

    /// Text content
    pub content: String,
}

impl DocumentChunk {
    /// Create a new chunk
    pub fn new(source: impl Into<String>, chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            chunk_index,
            content: content.into(),
        }
    }
}

/// Reference to where a retrieved passage came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Source file path recorded at ingestion
    pub source: String,

    /// Chunk index within that file
    pub chunk_index: u32,
}

impl SourceReference {
    pub fn new(source: impl Into<String>, chunk_index: u32) -> Self {
        Self {
            source: source.into(),
            chunk_index,
        }
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// Search result from a retrieval backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Retrieved passage
    pub content: String,

    /// Relevance score (higher is better)
    pub score: f32,

    /// Source reference
    pub source: SourceReference,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for retrieval backends
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search for content relevant to `query`, best match first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a complete (non-streamed) response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
