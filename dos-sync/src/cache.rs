//! Caching layer for DoS location lookups.
//!
//! Many services share a postcode, and a location row changes far less
//! often than the services that point at it. Lookups are cached by
//! normalised postcode, so "TE5 7ER" and "te57er" share an entry.
//!
//! The cache is an explicit component: build one, pass it to every
//! reconciliation that should share it, drop it to start fresh.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::trace;

use crate::domain::normalise_postcode;
use crate::dos::{DosLocation, LocationLookup, LookupError};

/// Cached lookup result: every location with the postcode.
type LocationEntry = Arc<Vec<DosLocation>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached postcodes.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Bounded, expiring cache of location lookups keyed by normalised postcode.
#[derive(Clone)]
pub struct LocationCache {
    locations: MokaCache<String, LocationEntry>,
}

impl LocationCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let locations = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { locations }
    }

    /// Get locations for a postcode, querying `lookup` on a miss.
    ///
    /// Errors are not cached; the next call queries again.
    pub fn get_or_fetch(
        &self,
        lookup: &dyn LocationLookup,
        postcode: &str,
    ) -> Result<LocationEntry, LookupError> {
        let key = normalise_postcode(postcode);

        if let Some(cached) = self.locations.get(&key) {
            trace!(postcode = %key, "location cache hit");
            return Ok(cached);
        }

        let entry = Arc::new(lookup.find_by_postcode(postcode)?);
        self.locations.insert(key, entry.clone());

        Ok(entry)
    }

    /// Locations for a postcode that carry full geo data.
    pub fn valid_locations(
        &self,
        lookup: &dyn LocationLookup,
        postcode: &str,
    ) -> Result<Vec<DosLocation>, LookupError> {
        Ok(self
            .get_or_fetch(lookup, postcode)?
            .iter()
            .filter(|l| l.is_valid())
            .cloned()
            .collect())
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.locations.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingLookup {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LocationLookup for CountingLookup {
        fn find_by_postcode(&self, postcode: &str) -> Result<Vec<DosLocation>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Unavailable("down".into()));
            }
            Ok(vec![
                DosLocation {
                    id: 1,
                    postcode: postcode.to_string(),
                    easting: Some(1),
                    northing: Some(2),
                    latitude: Some(53.0),
                    longitude: Some(-1.0),
                    postaltown: None,
                },
                DosLocation {
                    id: 2,
                    postcode: postcode.to_string(),
                    easting: None,
                    northing: Some(2),
                    latitude: Some(53.0),
                    longitude: Some(-1.0),
                    postaltown: None,
                },
            ])
        }
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(900));
        assert_eq!(config.max_capacity, 10_000);
    }

    #[test]
    fn second_lookup_is_cached() {
        let cache = LocationCache::new(&CacheConfig::default());
        let lookup = CountingLookup::new();

        let first = cache.get_or_fetch(&lookup, "TE5 7ER").unwrap();
        let second = cache.get_or_fetch(&lookup, "te57er").unwrap();

        assert_eq!(lookup.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn different_postcodes_miss() {
        let cache = LocationCache::new(&CacheConfig::default());
        let lookup = CountingLookup::new();

        cache.get_or_fetch(&lookup, "TE5 7ER").unwrap();
        cache.get_or_fetch(&lookup, "AB1 2CD").unwrap();
        assert_eq!(lookup.calls(), 2);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let cache = LocationCache::new(&CacheConfig::default());
        let lookup = CountingLookup::new();

        cache.get_or_fetch(&lookup, "TE5 7ER").unwrap();
        cache.invalidate_all();
        cache.get_or_fetch(&lookup, "TE5 7ER").unwrap();
        assert_eq!(lookup.calls(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = LocationCache::new(&CacheConfig::default());
        let lookup = CountingLookup {
            calls: AtomicUsize::new(0),
            fail: true,
        };

        assert!(cache.get_or_fetch(&lookup, "TE5 7ER").is_err());
        assert!(cache.get_or_fetch(&lookup, "TE5 7ER").is_err());
        assert_eq!(lookup.calls(), 2);
    }

    #[test]
    fn valid_locations_filters_partial_geocoding() {
        let cache = LocationCache::new(&CacheConfig::default());
        let lookup = CountingLookup::new();

        let valid = cache.valid_locations(&lookup, "TE5 7ER").unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].id, 1);
    }
}
