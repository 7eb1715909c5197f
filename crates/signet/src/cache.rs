//! Lazily populated, kid-keyed key set backed by a remote fetch and an
//! external cache store.
//!
//! A [`CachedKeySet`] resolves key ids against a published key-set document.
//! On first lookup it tries to adopt a document from the cache store; any
//! lookup for a kid still absent from the in-memory set triggers exactly one
//! synchronous fetch of the source document, which replaces the in-memory
//! set wholesale and is persisted back to the store.
//!
//! There is deliberately no negative cache: a kid that remains unknown after
//! a fetch is reported as not found, and the next lookup for it fetches
//! again. This trades resistance to invalid-kid bursts for always picking up
//! newly rotated keys without waiting out a TTL.
//!
//! The type is read-only by construction: it exposes lookups only, no
//! mutation entry points.

use crate::errors::{CacheWriteError, SignetError, TransportError};
use crate::jwk::{self, KeySet};
use crate::key::Key;
use crate::resolver::{require_kid, KeyResolver};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Fetches the raw key-set document from its source URI.
///
/// One synchronous request per call; no retries. Retry policy, if any,
/// belongs to the caller or the implementation.
pub trait KeySetFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: KeySetFetcher + ?Sized> KeySetFetcher for Arc<T> {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, TransportError> {
        (**self).fetch(uri)
    }
}

/// External store persisting raw key-set documents across processes.
pub trait CacheStore {
    /// Return the stored bytes for `key`, or `None` on a miss (including
    /// expiry).
    fn lookup(&self, key: &str) -> Option<Vec<u8>>;

    /// Store bytes under `key` with an optional time-to-live.
    ///
    /// # Errors
    ///
    /// Write failures are surfaced but are non-fatal to the lookup that
    /// triggered the write.
    fn store(&self, key: &str, value: &[u8], ttl: Option<Duration>)
        -> Result<(), CacheWriteError>;
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        (**self).lookup(key)
    }

    fn store(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), CacheWriteError> {
        (**self).store(key, value, ttl)
    }
}

/// Namespace prefix for derived cache keys.
const CACHE_KEY_PREFIX: &str = "jwk";

/// Cache keys longer than this are replaced by a digest.
const MAX_CACHE_KEY_LENGTH: usize = 64;

/// Derive a bounded, store-safe cache key from a source URI.
///
/// Characters outside `[A-Za-z0-9_.!]` are stripped and the namespace prefix
/// is prepended; a result over [`MAX_CACHE_KEY_LENGTH`] is replaced by the
/// hex SHA-256 of itself, keeping keys bounded and collision-resistant while
/// staying human-legible for short URIs.
fn derive_cache_key(uri: &str) -> String {
    let filtered: String = uri
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '!'))
        .collect();
    let key = format!("{CACHE_KEY_PREFIX}{filtered}");
    if key.len() > MAX_CACHE_KEY_LENGTH {
        hex::encode(Sha256::digest(key.as_bytes()))
    } else {
        key
    }
}

/// Read-only, kid-keyed view over a remote key-set document, cached in
/// memory and in an external store.
///
/// Not safe for unsynchronized concurrent use in the sense that concurrent
/// lookups may each independently fetch (there is no de-duplication of
/// in-flight fetches); each caller still gets a definite answer from its own
/// freshly parsed set, and the last store write wins.
pub struct CachedKeySet<F: KeySetFetcher, C: CacheStore> {
    source_uri: String,
    cache_key: String,
    fetcher: F,
    cache: C,
    ttl: Option<Duration>,
    keys: RwLock<Option<KeySet>>,
}

impl<F: KeySetFetcher, C: CacheStore> CachedKeySet<F, C> {
    /// Create a cached key set over a source URI.
    ///
    /// No fetch happens here; population is lazy, on first lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::InvalidKeySetUri`] for an empty URI.
    pub fn new(source_uri: impl Into<String>, fetcher: F, cache: C) -> Result<Self, SignetError> {
        let source_uri = source_uri.into();
        if source_uri.is_empty() {
            return Err(SignetError::InvalidKeySetUri(
                "key set URI must not be empty".to_string(),
            ));
        }
        let cache_key = derive_cache_key(&source_uri);
        Ok(Self {
            source_uri,
            cache_key,
            fetcher,
            cache,
            ttl: None,
            keys: RwLock::new(None),
        })
    }

    /// Set the time-to-live used when persisting fetched documents to the
    /// cache store. Without one, entries are stored without expiry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The source URI this set resolves against.
    #[must_use]
    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    /// The derived cache-store key.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Look up a key by id, populating or refreshing the set as needed.
    ///
    /// Returns `Ok(None)` when the kid is absent even from a freshly
    /// fetched document.
    ///
    /// # Errors
    ///
    /// - [`SignetError::KeySetFetchFailed`] on transport failure; neither
    ///   the in-memory set nor the cache store is mutated.
    /// - [`SignetError::MalformedKey`] when a fetched document is
    ///   structurally malformed.
    pub fn try_get(&self, kid: &str) -> Result<Option<Key>, SignetError> {
        // First lookup only: adopt a document from the external store.
        if self.read_keys(Option::is_none) {
            if let Some(bytes) = self.cache.lookup(&self.cache_key) {
                match jwk::parse_key_set(&bytes) {
                    Ok(set) => {
                        tracing::debug!(
                            target: "signet.keyset",
                            key_count = set.len(),
                            "adopted key set from cache store"
                        );
                        self.replace(set);
                    }
                    Err(error) => {
                        tracing::warn!(
                            target: "signet.keyset",
                            error = %error,
                            "ignoring unparsable cached key set document"
                        );
                    }
                }
            }
        }

        if let Some(key) = self.get_in_memory(kid) {
            return Ok(Some(key));
        }

        // The kid is absent (or nothing is populated yet): one fetch,
        // wholesale replacement, then a final re-check.
        self.refresh()?;
        Ok(self.get_in_memory(kid))
    }

    /// Whether a key with this id can be resolved.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CachedKeySet::try_get`].
    pub fn contains(&self, kid: &str) -> Result<bool, SignetError> {
        self.try_get(kid).map(|key| key.is_some())
    }

    /// Fetch the source document, replace the in-memory set, and persist
    /// the document to the cache store.
    fn refresh(&self) -> Result<(), SignetError> {
        tracing::debug!(target: "signet.keyset", uri = %self.source_uri, "fetching key set");
        let document = self
            .fetcher
            .fetch(&self.source_uri)
            .map_err(|source| SignetError::KeySetFetchFailed {
                uri: self.source_uri.clone(),
                source,
            })?;
        let set = jwk::parse_key_set(&document)?;
        tracing::debug!(
            target: "signet.keyset",
            key_count = set.len(),
            "key set refreshed"
        );
        self.replace(set);

        if let Err(error) = self.cache.store(&self.cache_key, &document, self.ttl) {
            // Non-fatal: the freshly fetched set is usable in memory.
            tracing::warn!(
                target: "signet.keyset",
                error = %error,
                "failed to persist key set to cache store"
            );
        }
        Ok(())
    }

    fn get_in_memory(&self, kid: &str) -> Option<Key> {
        self.read_keys(|keys| keys.as_ref().and_then(|set| set.get(kid).cloned()))
    }

    fn read_keys<T>(&self, f: impl FnOnce(&Option<KeySet>) -> T) -> T {
        let guard = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn replace(&self, set: KeySet) {
        let mut guard = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(set);
    }
}

impl<F: KeySetFetcher, C: CacheStore> KeyResolver for CachedKeySet<F, C> {
    fn resolve(&self, kid: Option<&str>) -> Result<Key, SignetError> {
        let kid = require_kid(kid)?;
        self.try_get(kid)?
            .ok_or_else(|| SignetError::KeyIdNotFound(kid.to_string()))
    }
}

impl<F: KeySetFetcher, C: CacheStore> std::fmt::Debug for CachedKeySet<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeySet")
            .field("source_uri", &self.source_uri)
            .field("cache_key", &self.cache_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// In-process [`CacheStore`] holding documents in a map with optional
/// expiry. Suitable as a per-process default and for tests.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = matches!(
            entries.get(key),
            Some((_, Some(deadline))) if *deadline <= Instant::now()
        );
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(bytes, _)| bytes.clone())
    }

    fn store(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), CacheWriteError> {
        let deadline = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), (value.to_vec(), deadline));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_short_uri_is_legible() {
        assert_eq!(derive_cache_key("httpjwkuri"), "jwkhttpjwkuri");
    }

    #[test]
    fn test_cache_key_strips_illegal_characters() {
        assert_eq!(
            derive_cache_key("https://example.com/jwks.json"),
            "jwkhttpsexample.comjwks.json"
        );
    }

    #[test]
    fn test_cache_key_keeps_allowed_punctuation() {
        assert_eq!(derive_cache_key("a_b.c!d"), "jwka_b.c!d");
    }

    #[test]
    fn test_cache_key_long_uri_is_hashed() {
        let uri = format!("https://example.com/{}", "a".repeat(100));
        let key = derive_cache_key(&uri);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic and distinct per URI.
        assert_eq!(key, derive_cache_key(&uri));
        let other = format!("https://example.com/{}", "b".repeat(100));
        assert_ne!(key, derive_cache_key(&other));
    }

    #[test]
    fn test_cache_key_boundary_is_not_hashed() {
        // Exactly 64 characters stays literal; 65 gets hashed.
        let at_limit = "a".repeat(MAX_CACHE_KEY_LENGTH - CACHE_KEY_PREFIX.len());
        assert_eq!(
            derive_cache_key(&at_limit),
            format!("{CACHE_KEY_PREFIX}{at_limit}")
        );
        let over_limit = "a".repeat(MAX_CACHE_KEY_LENGTH - CACHE_KEY_PREFIX.len() + 1);
        assert_eq!(derive_cache_key(&over_limit).len(), 64);
        assert!(!derive_cache_key(&over_limit).starts_with(CACHE_KEY_PREFIX));
    }

    #[test]
    fn test_memory_cache_store_round_trip() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.lookup("k"), None);
        store.store("k", b"value", None).unwrap();
        assert_eq!(store.lookup("k"), Some(b"value".to_vec()));
    }

    #[test]
    fn test_memory_cache_store_honors_ttl() {
        let store = MemoryCacheStore::new();
        store
            .store("k", b"value", Some(Duration::from_nanos(1)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.lookup("k"), None);
    }

    #[test]
    fn test_empty_uri_rejected() {
        struct NoFetch;
        impl KeySetFetcher for NoFetch {
            fn fetch(&self, _uri: &str) -> Result<Vec<u8>, TransportError> {
                Err(TransportError("unreachable".to_string()))
            }
        }
        let result = CachedKeySet::new("", NoFetch, MemoryCacheStore::new());
        assert!(matches!(result, Err(SignetError::InvalidKeySetUri(_))));
    }
}
