//! Per-run lookup cache
//!
//! [`CachedProvider`] decorates any [`AsnProvider`] with a memoization layer
//! keyed by the literal IP string, so each distinct IP hits the underlying
//! engine at most once per run. Keys are not normalized: `"08.8.8.8"` and
//! `"8.8.8.8"` are different entries. Results are cached including `0`
//! ("not found"). The map's extent is bounded by the distinct IPs of one run,
//! so there is no eviction policy.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::errors::LookupError;
use crate::provider::AsnProvider;

/// Memoizing wrapper around a lookup provider.
pub struct CachedProvider<P> {
    inner: P,
    cache: HashMap<String, u32>,
}

impl<P: AsnProvider> CachedProvider<P> {
    /// Wrap a provider with an empty cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    /// Provider identifier, forwarded from the wrapped provider.
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Snapshot date in effect, forwarded from the wrapped provider.
    pub fn snapshot_date(&self) -> NaiveDate {
        self.inner.snapshot_date()
    }

    /// Initialize the wrapped provider.
    pub fn initialize(&mut self) -> Result<(), LookupError> {
        self.inner.initialize()
    }

    /// Resolve an IP to an ASN, consulting the cache first.
    pub fn lookup(&mut self, ip: &str) -> Result<u32, LookupError> {
        if let Some(asn) = self.cache.get(ip) {
            return Ok(*asn);
        }
        let asn = self.inner.lookup_raw(ip)?;
        self.cache.insert(ip.to_string(), asn);
        Ok(asn)
    }

    /// Empty the cache. Does not affect the wrapped provider's
    /// initialization state.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of distinct IPs cached so far.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Access the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}
