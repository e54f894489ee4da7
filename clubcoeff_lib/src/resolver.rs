//! Club name to coefficient resolution.
//!
//! Resolution order for a (season, club) query, first success wins:
//!
//! 1. Match cache
//! 2. Approved manual correction (falls through, audited, if its target is
//!    not in the season table)
//! 3. Season existence check
//! 4. Exact club name
//! 5. Fuzzy search over the season's clubs, accepted at `score >= threshold`.
//!    A blank name has no candidates.
//!
//! Every outcome is cached for the rest of the run. Misses never error: they
//! return `None` and leave an [`AuditRecord`] explaining why.

use serde::Serialize;

use crate::audit::{AuditLog, AuditRecord};
use crate::cache::{CacheEntry, MatchCache};
use crate::corrections::CorrectionTable;
use crate::fuzzy;
use crate::ranking::RankingStore;

/// Default minimum fuzzy score.
pub const DEFAULT_THRESHOLD: f64 = 90.0;

/// How a resolution was reached.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Cached,
    Manual,
    Exact,
    Fuzzy,
    Unresolved,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cached => write!(f, "cached"),
            Self::Manual => write!(f, "manual"),
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Outcome of one resolution.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Resolution {
    pub season: String,
    pub club_query: String,
    pub coefficient: Option<f64>,
    pub match_type: MatchType,
    /// Ranking-table name the coefficient came from (manual or fuzzy only).
    pub matched_name: Option<String>,
    /// Fuzzy score of `matched_name`.
    pub score: Option<f64>,
}

impl Resolution {
    fn new(season: &str, club: &str, coefficient: Option<f64>, match_type: MatchType) -> Self {
        Self {
            season: season.to_string(),
            club_query: club.to_string(),
            coefficient,
            match_type,
            matched_name: None,
            score: None,
        }
    }

    fn matched(mut self, name: &str, score: Option<f64>) -> Self {
        self.matched_name = Some(name.to_string());
        self.score = score;
        self
    }
}

/// Resolves club names against the rankings, owning the run's cache and
/// audit log.
pub struct Resolver<'a> {
    rankings: &'a RankingStore,
    corrections: &'a CorrectionTable,
    cache: MatchCache,
    audit: AuditLog,
    default_threshold: f64,
}

impl<'a> Resolver<'a> {
    /// Resolver with a fresh cache and audit log.
    pub fn new(rankings: &'a RankingStore, corrections: &'a CorrectionTable) -> Self {
        Self::with_state(rankings, corrections, MatchCache::new(), AuditLog::new())
    }

    /// Resolver over caller-provided cache and audit log.
    pub fn with_state(
        rankings: &'a RankingStore,
        corrections: &'a CorrectionTable,
        cache: MatchCache,
        audit: AuditLog,
    ) -> Self {
        Self {
            rankings,
            corrections,
            cache,
            audit,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_default_threshold(mut self, threshold: f64) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    /// Coefficient for `club` in `season`, or `None` when no reliable match
    /// exists.
    pub fn resolve(&mut self, season: &str, club: &str, threshold: f64) -> Option<f64> {
        self.resolve_detailed(season, club, threshold).coefficient
    }

    /// [`Resolver::resolve`] at the default threshold.
    pub fn resolve_default(&mut self, season: &str, club: &str) -> Option<f64> {
        self.resolve(season, club, self.default_threshold)
    }

    /// Resolve and report which path produced the result.
    ///
    /// The cache key is (season, club) only: the first threshold used for a
    /// key decides its outcome for the whole run.
    pub fn resolve_detailed(&mut self, season: &str, club: &str, threshold: f64) -> Resolution {
        if let Some(entry) = self.cache.get(season, club) {
            tracing::debug!("{} '{}': cache hit", season, club);
            return Resolution::new(season, club, entry.coefficient(), MatchType::Cached);
        }

        let rankings = self.rankings;
        let corrections = self.corrections;

        if let Some(target) = corrections.resolve_override(season, club) {
            if let Some(coefficient) = rankings.lookup_coefficient(season, target) {
                tracing::debug!("{} '{}': manual override -> '{}'", season, club, target);
                self.cache.put(season, club, CacheEntry::Coefficient(coefficient));
                return Resolution::new(season, club, Some(coefficient), MatchType::Manual)
                    .matched(target, None);
            }
            tracing::warn!(
                "Approved correction for {} '{}' points at '{}', which is not in the rankings",
                season,
                club,
                target
            );
            self.audit.push(AuditRecord::manual_target_missing(
                season, club, target, threshold,
            ));
        }

        let Some(table) = rankings.lookup_table(season) else {
            self.audit
                .push(AuditRecord::season_missing(season, club, threshold));
            return self.unresolved(season, club);
        };

        if let Some(coefficient) = table.get(club) {
            tracing::debug!("{} '{}': exact match", season, club);
            self.cache.put(season, club, CacheEntry::Coefficient(coefficient));
            return Resolution::new(season, club, Some(coefficient), MatchType::Exact);
        }

        let best = if club.is_empty() {
            None
        } else {
            fuzzy::extract_best(club, table.iter(), |&(name, _)| name)
        };
        let Some(best) = best else {
            self.audit
                .push(AuditRecord::no_candidate(season, club, threshold));
            return self.unresolved(season, club);
        };

        let (best_name, coefficient) = best.item;
        if best.score >= threshold {
            tracing::debug!(
                "{} '{}': fuzzy match -> '{}' ({:.1})",
                season,
                club,
                best_name,
                best.score
            );
            self.cache.put(season, club, CacheEntry::Coefficient(coefficient));
            return Resolution::new(season, club, Some(coefficient), MatchType::Fuzzy)
                .matched(best_name, Some(best.score));
        }

        self.audit.push(AuditRecord::below_threshold(
            season, club, best_name, best.score, threshold,
        ));
        self.unresolved(season, club)
    }

    fn unresolved(&mut self, season: &str, club: &str) -> Resolution {
        self.cache.put(season, club, CacheEntry::Unresolved);
        Resolution::new(season, club, None, MatchType::Unresolved)
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Hand back the cache and audit log at the end of a run.
    pub fn into_parts(self) -> (MatchCache, AuditLog) {
        (self.cache, self.audit)
    }
}
