//! Process-lifetime memoisation of provider responses.
//!
//! Entries are created on the first successful completion for a key and never
//! evicted or persisted. One [`ResponseCache`] is built per job and shared by
//! every worker through an `Arc`; workers may run on separate OS threads, so
//! access goes through a mutex.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::ProviderKind;

/// Cache key: provider family, prompt, and input text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    provider: ProviderKind,
    prompt: String,
    text: String,
}

impl CacheKey {
    /// Builds the key for one completion request.
    pub fn new(provider: ProviderKind, prompt: &str, text: &str) -> Self {
        Self {
            provider,
            prompt: prompt.to_owned(),
            text: text.to_owned(),
        }
    }
}

/// Unbounded response cache shared by all workers of one job.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, String>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached response for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&self, key: CacheKey, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Number of cached responses.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
