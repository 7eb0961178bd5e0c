// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache of credentials issued by this node.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::VerifiableCredential;

pub const DEFAULT_CACHE_CAPACITY: usize = 1_000;

pub struct CredentialCache {
    cache: Mutex<LruCache<String, VerifiableCredential>>,
}

impl CredentialCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn get(&self, credential_id: &str) -> Option<VerifiableCredential> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(credential_id).cloned()
    }

    pub fn put(&self, credential: VerifiableCredential) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(credential.id.clone(), credential);
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
