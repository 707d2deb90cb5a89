//! Short-lived render cache
//!
//! Rendering can be expensive for the host, and a publish event may ask for
//! the same document several times in quick succession. Entries expire after
//! a fixed TTL; a zero TTL disables caching.

use crate::documents::{Document, DocumentSource};
use crate::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A rendered document and when it was rendered
#[derive(Debug, Clone)]
struct CachedDocument {
    document: Document,
    rendered_at: Instant,
}

impl CachedDocument {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.rendered_at.elapsed() >= ttl
    }
}

/// Wraps a source with a per-id render cache
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedDocument>>,
}

impl<S: DocumentSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lookup(&self, id: &str) -> Option<Document> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(id)
            .filter(|cached| !cached.is_stale(self.ttl))
            .map(|cached| cached.document.clone())
    }

    fn remember(&self, document: &Document) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, cached| !cached.is_stale(self.ttl));
            entries.insert(
                document.id.clone(),
                CachedDocument {
                    document: document.clone(),
                    rendered_at: Instant::now(),
                },
            );
        }
    }
}

impl<S: DocumentSource> DocumentSource for CachedSource<S> {
    fn list_ids(&self) -> Result<Vec<String>> {
        self.inner.list_ids()
    }

    fn render(&self, id: &str) -> Result<Document> {
        if self.ttl.is_zero() {
            return self.inner.render(id);
        }

        if let Some(document) = self.lookup(id) {
            tracing::trace!("Render cache hit for {}", id);
            return Ok(document);
        }

        let document = self.inner.render(id)?;
        self.remember(&document);
        Ok(document)
    }
}
