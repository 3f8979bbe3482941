use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::*;

use super::config::KEY_CACHE_TTL;
use super::error::KeyCacheError;
use super::fetcher::KeySetFetcher;
use super::key::{PublicKeyHandle, SigningKeySet};

/// Immutable view of the most recent successful fetch.
#[derive(Debug)]
struct KeySnapshot {
    keys: HashMap<String, Arc<PublicKeyHandle>>,
    fetched_at: Instant,
}

impl KeySnapshot {
    fn decode(set: SigningKeySet) -> KeySnapshot {
        let mut keys = HashMap::with_capacity(set.keys.len());

        for key in &set.keys {
            match PublicKeyHandle::try_from(key) {
                Ok(handle) => {
                    keys.insert(key.kid.clone(), Arc::new(handle));
                }
                Err(err) => {
                    warn!(kid = %key.kid, kty = %key.kty, "Skipping signing key: {err}");
                }
            }
        }

        KeySnapshot {
            keys,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Decoded public keys by `kid`, refreshed lazily as one unit.
///
/// A lookup is served from memory only while the last fetch is younger than
/// the TTL *and* the key is present. Any other lookup refetches the whole
/// set and swaps it in atomically, so readers only ever see a complete
/// snapshot. Refreshes are serialized: callers queued behind a refresh
/// reuse its result instead of fetching again.
#[derive(Debug)]
pub struct KeyCache {
    fetcher: KeySetFetcher,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<KeySnapshot>>>,
    refresh: Mutex<()>,
}

impl KeyCache {
    pub fn new(fetcher: KeySetFetcher) -> KeyCache {
        KeyCache::with_ttl(fetcher, KEY_CACHE_TTL)
    }

    pub(crate) fn with_ttl(fetcher: KeySetFetcher, ttl: Duration) -> KeyCache {
        KeyCache {
            fetcher,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the public key for `kid`, fetching the key set when needed.
    pub async fn resolve(&self, kid: &str) -> Result<Arc<PublicKeyHandle>, KeyCacheError> {
        let seen = self.current();
        if let Some(key) = fresh_key(seen.as_deref(), kid, self.ttl) {
            debug!(kid, "Signing key cache hit");
            return Ok(key);
        }

        let _guard = self.refresh.lock().await;

        // Someone else refreshed while we were waiting for the lock.
        let latest = self.current();
        if !same_snapshot(seen.as_ref(), latest.as_ref()) {
            if let Some(snapshot) = latest.as_deref().filter(|s| s.is_fresh(self.ttl)) {
                return snapshot
                    .keys
                    .get(kid)
                    .cloned()
                    .ok_or_else(|| KeyCacheError::KeyNotFound(kid.to_owned()));
            }
        }

        let set = self.fetcher.fetch().await.map_err(|err| {
            error!(url = %self.fetcher.url(), "Failed to refresh signing keys: {err}");
            err
        })?;

        let snapshot = Arc::new(KeySnapshot::decode(set));
        info!(key_count = snapshot.keys.len(), "Signing key cache refreshed");
        self.replace(Arc::clone(&snapshot));

        match snapshot.keys.get(kid) {
            Some(key) => Ok(Arc::clone(key)),
            None => {
                warn!(kid, "Signing key not found after refresh");
                Err(KeyCacheError::KeyNotFound(kid.to_owned()))
            }
        }
    }

    /// Number of keys in the current snapshot, fresh or not.
    pub fn len(&self) -> usize {
        self.current().map_or(0, |snapshot| snapshot.keys.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Option<Arc<KeySnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, snapshot: Arc<KeySnapshot>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

fn fresh_key(
    snapshot: Option<&KeySnapshot>,
    kid: &str,
    ttl: Duration,
) -> Option<Arc<PublicKeyHandle>> {
    snapshot
        .filter(|s| s.is_fresh(ttl))
        .and_then(|s| s.keys.get(kid))
        .cloned()
}

fn same_snapshot(a: Option<&Arc<KeySnapshot>>, b: Option<&Arc<KeySnapshot>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
