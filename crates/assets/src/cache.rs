use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::task::Poll;

use crate::source::TemplateSource;
use crate::{AssetError, AssetProvider, ModelTemplate, TemplateHandle};

enum Entry {
    Queued,
    Ready(Arc<ModelTemplate>),
    Failed(String),
}

/// Path-keyed template cache with cooperative loading.
///
/// `resolve` never blocks: an unknown path is queued and reported pending.
/// `pump` performs up to `loads_per_pump` queued loads; the frame loop calls
/// it once per tick. Failures are cached and logged once.
pub struct ModelCache {
    source: Box<dyn TemplateSource>,
    entries: HashMap<String, Entry>,
    queue: VecDeque<String>,
    loads_per_pump: usize,
}

impl ModelCache {
    pub fn new(source: impl TemplateSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: HashMap::new(),
            queue: VecDeque::new(),
            loads_per_pump: usize::MAX,
        }
    }

    /// Limit how many loads complete per `pump`. Zero is treated as one.
    pub fn with_loads_per_pump(mut self, loads: usize) -> Self {
        self.loads_per_pump = loads.max(1);
        self
    }

    /// Complete queued loads. Returns how many finished (successfully or not).
    pub fn pump(&mut self) -> usize {
        let mut done = 0;
        while done < self.loads_per_pump {
            let Some(path) = self.queue.pop_front() else {
                break;
            };
            let entry = match self.source.load(&path) {
                Ok(template) => {
                    tracing::debug!(%path, meshes = template.root.mesh_count(), "model loaded");
                    Entry::Ready(Arc::new(template))
                }
                Err(e) => {
                    tracing::error!(%path, "error loading model: {e}");
                    Entry::Failed(e.to_string())
                }
            };
            self.entries.insert(path, entry);
            done += 1;
        }
        done
    }

    /// Whether no loads are waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn ready_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Failed(_)))
            .count()
    }
}

impl AssetProvider for ModelCache {
    fn resolve(&mut self, path: &str) -> Poll<Result<TemplateHandle, AssetError>> {
        match self.entries.get(path) {
            Some(Entry::Ready(template)) => Poll::Ready(Ok(TemplateHandle::new(template.clone()))),
            Some(Entry::Failed(reason)) => Poll::Ready(Err(AssetError::LoadFailed {
                path: path.to_string(),
                reason: reason.clone(),
            })),
            Some(Entry::Queued) => Poll::Pending,
            None => {
                tracing::trace!(path, "queueing model load");
                self.entries.insert(path.to_string(), Entry::Queued);
                self.queue.push_back(path.to_string());
                Poll::Pending
            }
        }
    }
}
