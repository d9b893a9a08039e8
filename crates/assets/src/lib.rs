//! Asset pipeline: model templates resolved by path, cloned per use.
//!
//! Consumers ask an [`AssetProvider`] for a template by path and get back a
//! [`TemplateHandle`] once it has loaded. Loading is cooperative: the
//! [`ModelCache`] queues requests and completes them when pumped, once per
//! frame, so callers observe progress only by polling.
//!
//! # Invariants
//! - Resolving the same path twice yields handles to the same template.
//! - Instances share geometry and material ids, never node ids or transforms.
//! - A failed path stays failed; nothing is retried automatically.

mod cache;
mod source;

use std::sync::Arc;
use std::task::Poll;

use dunes_scene::SceneNode;
use sha2::{Digest, Sha256};

pub use cache::ModelCache;
pub use source::{GltfSource, MemorySource, ProceduralSource, TemplateSource};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to load {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// A loaded model: the prototype object graph for one path.
#[derive(Debug)]
pub struct ModelTemplate {
    pub path: String,
    pub root: SceneNode,
}

/// Shared, read-only reference to a loaded template.
#[derive(Debug, Clone)]
pub struct TemplateHandle {
    template: Arc<ModelTemplate>,
}

impl TemplateHandle {
    pub fn new(template: Arc<ModelTemplate>) -> Self {
        Self { template }
    }

    pub fn path(&self) -> &str {
        &self.template.path
    }

    /// Fresh copy of the template graph with independent node ids and transforms.
    pub fn instantiate(&self) -> SceneNode {
        self.template.root.instantiate()
    }

    pub fn mesh_count(&self) -> usize {
        self.template.root.mesh_count()
    }

    /// Whether two handles point at the same loaded template.
    pub fn same_template(&self, other: &TemplateHandle) -> bool {
        Arc::ptr_eq(&self.template, &other.template)
    }
}

/// Resolves model paths to templates without blocking.
pub trait AssetProvider {
    /// Poll for the template at `path`. Unknown paths start loading.
    fn resolve(&mut self, path: &str) -> Poll<Result<TemplateHandle, AssetError>>;

    /// Poll for several templates at once, preserving input order.
    ///
    /// Ready only when every path is ready; fails if any path failed.
    fn resolve_many(&mut self, paths: &[String]) -> Poll<Result<Vec<TemplateHandle>, AssetError>> {
        let mut handles = Vec::with_capacity(paths.len());
        let mut pending = false;
        for path in paths {
            match self.resolve(path) {
                Poll::Ready(Ok(handle)) => handles.push(handle),
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                // keep going so every path gets queued this frame
                Poll::Pending => pending = true,
            }
        }
        if pending {
            Poll::Pending
        } else {
            Poll::Ready(Ok(handles))
        }
    }
}

/// Content-addressed 64-bit id: the first eight bytes of a SHA-256 digest.
pub fn content_id(parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

pub fn crate_info() -> &'static str {
    "dunes-assets v0.1.0"
}
