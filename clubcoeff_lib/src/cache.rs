//! Per-run memo of resolved (season, club) lookups.

use std::collections::HashMap;

/// A (season, queried club name) pair. Keys the match cache, the
/// corrections table and the review partition of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub season: String,
    pub club: String,
}

impl MatchKey {
    pub fn new(season: impl Into<String>, club: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            club: club.into(),
        }
    }
}

/// A cached outcome. `Unresolved` is remembered as firmly as a coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheEntry {
    Coefficient(f64),
    Unresolved,
}

impl CacheEntry {
    pub fn coefficient(self) -> Option<f64> {
        match self {
            Self::Coefficient(c) => Some(c),
            Self::Unresolved => None,
        }
    }
}

impl From<Option<f64>> for CacheEntry {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unresolved, Self::Coefficient)
    }
}

/// Unbounded in-memory cache with no expiry.
///
/// Lives for one run only. The key space is bounded by the input batch, so
/// nothing is ever evicted; the first value stored for a key stays
/// authoritative.
#[derive(Debug, Default)]
pub struct MatchCache {
    store: HashMap<MatchKey, CacheEntry>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached outcome, or `None` when the key was never resolved.
    pub fn get(&self, season: &str, club: &str) -> Option<CacheEntry> {
        self.store.get(&MatchKey::new(season, club)).copied()
    }

    /// Records an outcome. An existing entry is left untouched.
    pub fn put(&mut self, season: &str, club: &str, value: impl Into<CacheEntry>) {
        self.store
            .entry(MatchKey::new(season, club))
            .or_insert_with(|| value.into());
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of cached keys that resolved to a coefficient.
    pub fn resolved_count(&self) -> usize {
        self.store
            .values()
            .filter(|e| matches!(e, CacheEntry::Coefficient(_)))
            .count()
    }
}
