//! Directory-backed vector store
//!
//! Layout on disk:
//! - `{path}/collection.json` - collection metadata
//! - `{path}/vectors.jsonl`   - one stored vector per line, append-only
//!
//! The whole collection is held in memory and searched exhaustively.
//!
//! Author: hephaex@gmail.com

use crate::{cosine_similarity, StoredVector, VectorStore};
use async_trait::async_trait;
use chanakya_core::{ChanakyaError, Result, SearchResult, SourceReference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const METADATA_FILE: &str = "collection.json";
const VECTORS_FILE: &str = "vectors.jsonl";

/// Collection metadata stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

/// Vector store persisted to a local directory
pub struct LocalVectorStore {
    path: PathBuf,
    name: String,
    embedding_model: String,
    metadata: RwLock<Option<CollectionMetadata>>,
    entries: RwLock<Vec<StoredVector>>,
}

impl LocalVectorStore {
    /// Open an existing collection for reading.
    ///
    /// A missing directory opens as an empty store; nothing is created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = read_metadata(&path).await?;
        let entries = read_vectors(&path).await?;

        match &metadata {
            Some(meta) => info!(
                path = %path.display(),
                collection = %meta.name,
                count = entries.len(),
                "Opened vector store"
            ),
            None => warn!(path = %path.display(), "Vector store is empty or missing"),
        }

        let (name, embedding_model) = metadata
            .as_ref()
            .map(|m| (m.name.clone(), m.embedding_model.clone()))
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            embedding_model,
            metadata: RwLock::new(metadata),
            entries: RwLock::new(entries),
        })
    }

    /// Open a collection for writing, creating the directory when needed
    pub async fn open_or_create(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Result<Self> {
        let path = path.into();
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            ChanakyaError::StorageError(format!("Failed to create {}: {e}", path.display()))
        })?;

        let mut store = Self::open(&path).await?;
        let name = name.into();
        let embedding_model = embedding_model.into();

        if let Some(meta) = store.metadata.read().await.as_ref() {
            if meta.embedding_model != embedding_model {
                warn!(
                    existing = %meta.embedding_model,
                    requested = %embedding_model,
                    "Collection was built with a different embedding model"
                );
            }
        }

        store.name = name;
        store.embedding_model = embedding_model;
        Ok(store)
    }

    /// Directory backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collection metadata, if anything has been written
    pub async fn metadata(&self) -> Option<CollectionMetadata> {
        self.metadata.read().await.clone()
    }

    async fn ensure_metadata(&self, dimension: usize) -> Result<()> {
        let mut metadata = self.metadata.write().await;

        if let Some(meta) = metadata.as_ref() {
            if meta.dimension != dimension {
                return Err(ChanakyaError::ValidationError(format!(
                    "Vector dimension {dimension} does not match collection dimension {}",
                    meta.dimension
                )));
            }
            return Ok(());
        }

        let meta = CollectionMetadata {
            name: self.name.clone(),
            dimension,
            metric: "cosine".to_string(),
            embedding_model: self.embedding_model.clone(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&meta).map_err(|e| {
            ChanakyaError::StorageError(format!("Failed to serialize metadata: {e}"))
        })?;
        tokio::fs::write(self.path.join(METADATA_FILE), json)
            .await
            .map_err(|e| ChanakyaError::StorageError(format!("Failed to write metadata: {e}")))?;

        *metadata = Some(meta);
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn add(&self, vectors: Vec<StoredVector>) -> Result<usize> {
        let Some(first) = vectors.first() else {
            return Ok(0);
        };
        let dimension = first.vector.len();

        if let Some(bad) = vectors.iter().find(|v| v.vector.len() != dimension) {
            return Err(ChanakyaError::ValidationError(format!(
                "Chunk {} has dimension {}, expected {dimension}",
                bad.chunk_index,
                bad.vector.len()
            )));
        }

        self.ensure_metadata(dimension).await?;

        let mut buffer = String::new();
        for vector in &vectors {
            let line = serde_json::to_string(vector).map_err(|e| {
                ChanakyaError::StorageError(format!("Failed to serialize vector: {e}"))
            })?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.join(VECTORS_FILE))
            .await
            .map_err(|e| ChanakyaError::StorageError(format!("Failed to open vectors: {e}")))?;
        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| ChanakyaError::StorageError(format!("Failed to write vectors: {e}")))?;
        file.sync_data()
            .await
            .map_err(|e| ChanakyaError::StorageError(format!("Failed to sync vectors: {e}")))?;

        let added = vectors.len();
        self.entries.write().await.extend(vectors);
        debug!(added, "Appended vectors");

        Ok(added)
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        if entries.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(meta) = self.metadata.read().await.as_ref() {
            if meta.dimension != query_vector.len() {
                return Err(ChanakyaError::SearchError(format!(
                    "Query dimension {} does not match collection dimension {}",
                    query_vector.len(),
                    meta.dimension
                )));
            }
        }

        let mut scored: Vec<(f32, &StoredVector)> = entries
            .iter()
            .map(|entry| (cosine_similarity(query_vector, &entry.vector), entry))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchResult {
                content: entry.content.clone(),
                score,
                source: SourceReference::new(entry.source.clone(), entry.chunk_index),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.metadata.read().await.as_ref().map(|m| m.dimension))
    }

    async fn clear(&self) -> Result<()> {
        for file in [VECTORS_FILE, METADATA_FILE] {
            match tokio::fs::remove_file(self.path.join(file)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ChanakyaError::StorageError(format!(
                        "Failed to remove {file}: {e}"
                    )))
                }
            }
        }

        self.entries.write().await.clear();
        *self.metadata.write().await = None;
        info!(path = %self.path.display(), "Cleared vector store");
        Ok(())
    }
}

async fn read_metadata(path: &Path) -> Result<Option<CollectionMetadata>> {
    let metadata_path = path.join(METADATA_FILE);
    let json = match tokio::fs::read_to_string(&metadata_path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ChanakyaError::StorageError(format!(
                "Failed to read {}: {e}",
                metadata_path.display()
            )))
        }
    };

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| ChanakyaError::StorageError(format!("Failed to parse metadata: {e}")))
}

async fn read_vectors(path: &Path) -> Result<Vec<StoredVector>> {
    let vectors_path = path.join(VECTORS_FILE);
    let content = match tokio::fs::read_to_string(&vectors_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ChanakyaError::StorageError(format!(
                "Failed to read {}: {e}",
                vectors_path.display()
            )))
        }
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                ChanakyaError::StorageError(format!("Corrupt vector at line {}: {e}", i + 1))
            })
        })
        .collect()
}
