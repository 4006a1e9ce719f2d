// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded, process-lifetime meta-string interning cache.
//!
//! Scoped separately from the per-operation transient dedup ids tracked by
//! [`crate::resolver::context`]: this cache survives across `reset_write`/
//! `reset_read` calls and is keyed by the 64-bit hash so repeated identifiers
//! across many serialize calls skip re-encoding entirely.

use super::{MetaString, MetaStringEncoder};
use crate::error::Result;
use lru::LruCache;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

pub struct MetaStringCache {
    entries: LruCache<u64, MetaString>,
}

impl MetaStringCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        MetaStringCache {
            entries: LruCache::new(capacity),
        }
    }

    fn key(text: &str) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the cached encoding for `text`, computing and storing it via
    /// `encoder` on a miss. Namespace and typename strings repeat across many
    /// `serialize` calls on the same [`crate::fory::Fory`] instance, so this
    /// avoids re-running [`MetaStringEncoder::encode`] on every call.
    pub fn get_or_encode(&mut self, text: &str, encoder: &MetaStringEncoder) -> Result<MetaString> {
        let key = Self::key(text);
        if let Some(ms) = self.entries.get(&key) {
            return Ok(ms.clone());
        }
        let ms = encoder.encode(text)?;
        self.entries.put(key, ms.clone());
        Ok(ms)
    }
}

impl Default for MetaStringCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
