//! Short-lived, session-scoped cache holding the AI pricing context between
//! the preview and the create step.
//!
//! The preview shown to the client never exposes cost/margin structure; the
//! full enriched items are parked here instead, keyed by session id, and
//! read exactly once by the subsequent create. Racing puts for the same
//! session are last-write-wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::suggestion::EnrichedLineItem;

pub const DEFAULT_PREVIEW_TTL: Duration = Duration::from_secs(900);

#[derive(Clone, Debug, PartialEq)]
pub struct CachedAiContext {
    pub items: Vec<EnrichedLineItem>,
}

#[derive(Debug)]
pub struct PreviewCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, CachedAiContext)>>,
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_PREVIEW_TTL)
    }
}

impl PreviewCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn put(&self, session_id: &str, context: CachedAiContext) {
        let mut entries = self.entries.lock().expect("preview cache lock");
        let now = Instant::now();
        entries.retain(|_, (inserted, _)| now.duration_since(*inserted) < self.ttl);
        entries.insert(session_id.to_string(), (now, context));
    }

    /// Remove and return the context for a session. Expired entries are
    /// treated as absent.
    pub fn take(&self, session_id: &str) -> Option<CachedAiContext> {
        let mut entries = self.entries.lock().expect("preview cache lock");
        let (inserted, context) = entries.remove(session_id)?;
        if inserted.elapsed() >= self.ttl {
            return None;
        }
        Some(context)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CachedAiContext, PreviewCache};

    #[test]
    fn take_is_read_once() {
        let cache = PreviewCache::default();
        cache.put("sess-1", CachedAiContext { items: Vec::new() });

        assert!(cache.take("sess-1").is_some());
        assert!(cache.take("sess-1").is_none());
    }

    #[test]
    fn expired_entries_are_absent() {
        let cache = PreviewCache::with_ttl(Duration::ZERO);
        cache.put("sess-1", CachedAiContext { items: Vec::new() });

        assert!(cache.take("sess-1").is_none());
    }

    #[test]
    fn sessions_are_isolated() {
        let cache = PreviewCache::default();
        cache.put("sess-1", CachedAiContext { items: Vec::new() });

        assert!(cache.take("sess-2").is_none());
        assert!(cache.take("sess-1").is_some());
    }
}
