//! In-memory cache of fetched file documents.

use crate::model::FileDocument;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    file: Arc<FileDocument>,
    stored_at: Instant,
}

/// File documents keyed by file id.
///
/// Clones share the same storage. Entries older than the optional TTL are
/// treated as absent.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Option<Duration>,
}

impl FileCache {
    /// Create a cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache whose entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Entry lifetime, if bounded.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Look up a fresh entry.
    pub fn get(&self, file_id: &str) -> Option<Arc<FileDocument>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(file_id) {
            None => return None,
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl),
        };
        if expired {
            entries.remove(file_id);
            return None;
        }
        entries.get(file_id).map(|entry| entry.file.clone())
    }

    /// Store a document, replacing any previous entry.
    pub fn insert(&self, file_id: impl Into<String>, file: Arc<FileDocument>) {
        self.entries.lock().insert(
            file_id.into(),
            Entry {
                file,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for `file_id`.
    pub fn invalidate(&self, file_id: &str) {
        self.entries.lock().remove(file_id);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
