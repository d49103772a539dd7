//! Bounded content-addressed audio cache.
//!
//! Maps `(text, voice, rate, pitch)` to synthesized audio bytes so the
//! foreground playback path and the background preload path never
//! synthesize the same mark twice. Process-lifetime only; entries never
//! mutate after insertion; capacity overflow evicts oldest-first.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_128;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 200;

/// Stable cache key over the full synthesis tuple. Rate and pitch feed
/// the hash by bit pattern, so changed parameters never alias a stale
/// entry.
pub fn cache_key(text: &str, voice_id: &str, rate: f32, pitch: f32) -> u128 {
    let mut buf = Vec::with_capacity(text.len() + voice_id.len() + 10);
    buf.extend_from_slice(text.trim().as_bytes());
    buf.push(0);
    buf.extend_from_slice(voice_id.as_bytes());
    buf.push(0);
    buf.extend_from_slice(&rate.to_bits().to_le_bytes());
    buf.extend_from_slice(&pitch.to_bits().to_le_bytes());
    xxh3_128(&buf)
}

struct CacheInner {
    map: HashMap<u128, Bytes>,
    order: VecDeque<u128>,
}

/// FIFO-bounded audio byte cache. `get` does not refresh entry order.
pub struct AudioCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl AudioCache {
    /// Cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Cache bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Cheap clone of the stored bytes on a hit.
    pub fn get(&self, key: u128) -> Option<Bytes> {
        self.inner.lock().map.get(&key).cloned()
    }

    /// Insert under first-writer-wins: a concurrent duplicate synthesis
    /// for the same key is wasted work, not a correctness bug.
    pub fn insert(&self, key: u128, audio: Bytes) {
        let mut inner = self.inner.lock();
        if inner.map.contains_key(&key) {
            return;
        }
        inner.map.insert(key, audio);
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AudioCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_every_tuple_component() {
        let base = cache_key("hello", "v1", 1.0, 1.0);
        assert_ne!(base, cache_key("bye", "v1", 1.0, 1.0));
        assert_ne!(base, cache_key("hello", "v2", 1.0, 1.0));
        assert_ne!(base, cache_key("hello", "v1", 1.5, 1.0));
        assert_ne!(base, cache_key("hello", "v1", 1.0, 0.5));
        // Whitespace-trimmed text aliases intentionally.
        assert_eq!(base, cache_key("  hello ", "v1", 1.0, 1.0));
    }

    #[test]
    fn first_writer_wins() {
        let cache = AudioCache::new();
        cache.insert(1, Bytes::from_static(b"first"));
        cache.insert(1, Bytes::from_static(b"second"));
        assert_eq!(cache.get(1).unwrap(), Bytes::from_static(b"first"));
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let cache = AudioCache::with_capacity(2);
        cache.insert(1, Bytes::from_static(b"a"));
        cache.insert(2, Bytes::from_static(b"b"));
        cache.insert(3, Bytes::from_static(b"c"));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
        assert_eq!(cache.len(), 2);
    }
}
