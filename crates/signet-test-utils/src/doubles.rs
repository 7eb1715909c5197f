//! Scripted collaborator doubles for the cached key-set state machine.

use signet::{CacheStore, CacheWriteError, KeySetFetcher, MemoryCacheStore, TransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fetcher double returning a scripted response and counting calls.
///
/// Clones share state, so a test can keep a handle for assertions after
/// moving a clone into a `CachedKeySet`.
#[derive(Clone)]
pub struct ScriptedFetcher {
    inner: Arc<FetcherInner>,
}

struct FetcherInner {
    response: Mutex<Result<Vec<u8>, String>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    /// Fetcher that always returns the given document.
    pub fn returning(document: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                response: Mutex::new(Ok(document)),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Fetcher that always fails at the transport layer.
    pub fn failing(message: &str) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                response: Mutex::new(Err(message.to_string())),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Replace the scripted response, e.g. to simulate key rotation.
    pub fn set_response(&self, document: Vec<u8>) {
        *self.inner.response.lock().unwrap() = Ok(document);
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

impl KeySetFetcher for ScriptedFetcher {
    fn fetch(&self, _uri: &str) -> Result<Vec<u8>, TransportError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.inner.response.lock().unwrap() {
            Ok(document) => Ok(document.clone()),
            Err(message) => Err(TransportError(message.clone())),
        }
    }
}

/// Cache-store double wrapping a [`MemoryCacheStore`] and counting traffic.
#[derive(Clone, Default)]
pub struct CountingCacheStore {
    inner: Arc<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    store: MemoryCacheStore,
    lookups: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry without counting it as a write.
    pub fn seed(&self, key: &str, value: &[u8]) {
        self.inner
            .store
            .store(key, value, None)
            .expect("memory store writes cannot fail");
    }

    /// Number of lookups observed.
    pub fn lookups(&self) -> usize {
        self.inner.lookups.load(Ordering::SeqCst)
    }

    /// Number of writes observed.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

impl CacheStore for CountingCacheStore {
    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.store.lookup(key)
    }

    fn store(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), CacheWriteError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.store.store(key, value, ttl)
    }
}

/// Cache store whose writes always fail and whose lookups always miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCacheStore;

impl CacheStore for FailingCacheStore {
    fn lookup(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn store(
        &self,
        _key: &str,
        _value: &[u8],
        _ttl: Option<Duration>,
    ) -> Result<(), CacheWriteError> {
        Err(CacheWriteError("scripted write failure".to_string()))
    }
}
