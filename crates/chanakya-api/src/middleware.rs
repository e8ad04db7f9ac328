//! Static file guard
//!
//! Keeps dotfiles (`.env` holds the API keys) and the vector index out of
//! `/static` when they live under the static directory.
//!
//! Author: hephaex@gmail.com

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Top-level names under the static directory that must not be served
#[derive(Debug, Clone, Default)]
pub struct StaticGuard {
    blocked: Vec<String>,
}

impl StaticGuard {
    /// Block every path in `private` that sits inside `static_dir`
    pub fn new(static_dir: &Path, private: &[&Path]) -> Self {
        let root = normalize(static_dir);
        let blocked = private
            .iter()
            .filter_map(|p| {
                let rel = normalize(p).strip_prefix(&root).ok()?.to_path_buf();
                match rel.components().next() {
                    Some(Component::Normal(name)) => Some(name.to_string_lossy().to_lowercase()),
                    _ => None,
                }
            })
            .collect();

        Self { blocked }
    }

    /// Whether a request path (relative to `/static`) may be served
    pub fn allows(&self, path: &str) -> bool {
        let mut segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase().replace("%2e", "."))
            .peekable();

        if let Some(first) = segments.peek() {
            if self.blocked.iter().any(|b| b == first) {
                return false;
            }
        }

        segments.all(|s| !s.starts_with('.'))
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Answer 404 for guarded paths before they reach the file service
pub async fn static_guard(
    State(guard): State<Arc<StaticGuard>>,
    request: Request,
    next: Next,
) -> Response {
    if !guard.allows(request.uri().path()) {
        tracing::warn!(path = %request.uri().path(), "Refused guarded static path");
        return StatusCode::NOT_FOUND.into_response();
    }

    next.run(request).await
}
