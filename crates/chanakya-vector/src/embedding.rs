//! Embedding client for generating vector representations
//!
//! Supports an in-process fastembed model (feature `local-embeddings`)
//! as well as the OpenAI and Ollama embedding APIs.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use chanakya_core::{ChanakyaError, EmbeddingConfig, EmbeddingProvider, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Model identifier recorded alongside stored vectors
    fn model_name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        };

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model,
            dimension,
        }
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.as_ref().ok_or_else(|| {
            ChanakyaError::ConfigError("OpenAI API key required for embeddings".to_string())
        })?;

        let client = Self::new(api_key.clone(), config.model.clone());
        Ok(match &config.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| ChanakyaError::EmbeddingError("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OpenAiEmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChanakyaError::EmbeddingError(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChanakyaError::EmbeddingError(format!(
                "OpenAI embedding error ({status}): {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            ChanakyaError::EmbeddingError(format!("Failed to parse embedding response: {e}"))
        })?;

        // Sort by index and extract embeddings
        let mut embeddings = result.data;
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            m if m.contains("bge-small") => 384,
            _ => 768,
        };

        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(config.ollama_url.clone(), config.model.clone())
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ChanakyaError::EmbeddingError(format!("Ollama embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChanakyaError::EmbeddingError(format!(
                "Ollama embedding error: {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            ChanakyaError::EmbeddingError(format!("Failed to parse embedding response: {e}"))
        })?;

        Ok(result.embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Ollama doesn't have native batch embedding, so we process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Local (fastembed) Embedding Client
// ============================================================================

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedding;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::EmbeddingClient;
    use async_trait::async_trait;
    use chanakya_core::{ChanakyaError, EmbeddingConfig, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::{Arc, Mutex};

    /// In-process ONNX embedding model
    pub struct LocalEmbedding {
        model: Arc<Mutex<TextEmbedding>>,
        name: String,
        dimension: usize,
    }

    impl LocalEmbedding {
        /// Load (downloading on first use) the named model
        pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
            let (model, dimension) = match config.model.as_str() {
                "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => {
                    (EmbeddingModel::BGESmallENV15, 384)
                }
                "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
                "sentence-transformers/all-MiniLM-L6-v2" | "all-minilm" => {
                    (EmbeddingModel::AllMiniLML6V2, 384)
                }
                other => {
                    return Err(ChanakyaError::ConfigError(format!(
                        "Unsupported local embedding model: {other}"
                    )))
                }
            };

            let mut options = InitOptions::new(model).with_show_download_progress(true);
            if let Some(dir) = &config.cache_dir {
                options = options.with_cache_dir(dir.clone());
            }

            let model = TextEmbedding::try_new(options)
                .map_err(|e| ChanakyaError::EmbeddingError(e.to_string()))?;

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
                name: config.model.clone(),
                dimension,
            })
        }
    }

    #[async_trait]
    impl EmbeddingClient for LocalEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let results = self.embed_batch(&[text.to_string()]).await?;
            results
                .into_iter()
                .next()
                .ok_or_else(|| ChanakyaError::EmbeddingError("No embedding returned".to_string()))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();

            // ONNX inference is CPU bound
            tokio::task::spawn_blocking(move || {
                let mut model = model.lock().map_err(|_| {
                    ChanakyaError::EmbeddingError("Embedding model lock poisoned".to_string())
                })?;
                model
                    .embed(texts, None)
                    .map_err(|e| ChanakyaError::EmbeddingError(e.to_string()))
            })
            .await
            .map_err(|e| ChanakyaError::EmbeddingError(format!("Embedding task failed: {e}")))?
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            &self.name
        }
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingClient>> {
    match config.provider {
        EmbeddingProvider::OpenAI => Ok(Box::new(OpenAiEmbedding::from_config(config)?)),
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(config))),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Local => Ok(Box::new(LocalEmbedding::from_config(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Local => Err(ChanakyaError::ConfigError(
            "local embeddings require the `local-embeddings` feature".to_string(),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================
