//! Audit trail of uncertain or failed club resolutions.
//!
//! Clean hits (cache, approved correction, exact name, confident fuzzy match)
//! leave no record. Everything else is appended here once, and at the end of
//! a run the trail is split into keys a reviewer has already seen and keys
//! that still need a look.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::cache::MatchKey;

/// Header of both audit CSV artifacts.
pub const AUDIT_COLUMNS: [&str; 6] = [
    "season",
    "club_query",
    "reason",
    "matched_name",
    "score",
    "threshold",
];

/// Error types for writing audit artifacts.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to write audit CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write audit file: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a resolution was recorded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditReason {
    /// An approved correction points at a club absent from the season table.
    ManualTargetMissing,
    /// The rankings source has no table for the season.
    SeasonMissing,
    /// The season table is empty.
    NoCandidate,
    /// The best fuzzy candidate scored under the threshold.
    BelowThreshold,
}

impl std::fmt::Display for AuditReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualTargetMissing => write!(f, "manual_target_missing"),
            Self::SeasonMissing => write!(f, "season_missing"),
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::BelowThreshold => write!(f, "below_threshold"),
        }
    }
}

/// One audit entry. Constructed only through the per-reason constructors so
/// the populated fields always agree with `reason`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    season: String,
    club_query: String,
    reason: AuditReason,
    matched_name: Option<String>,
    score: Option<f64>,
    threshold: f64,
}

impl AuditRecord {
    pub fn manual_target_missing(season: &str, club: &str, target: &str, threshold: f64) -> Self {
        Self {
            season: season.to_string(),
            club_query: club.to_string(),
            reason: AuditReason::ManualTargetMissing,
            matched_name: Some(target.to_string()),
            score: None,
            threshold,
        }
    }

    pub fn season_missing(season: &str, club: &str, threshold: f64) -> Self {
        Self::unmatched(season, club, AuditReason::SeasonMissing, threshold)
    }

    pub fn no_candidate(season: &str, club: &str, threshold: f64) -> Self {
        Self::unmatched(season, club, AuditReason::NoCandidate, threshold)
    }

    pub fn below_threshold(
        season: &str,
        club: &str,
        best_name: &str,
        score: f64,
        threshold: f64,
    ) -> Self {
        Self {
            season: season.to_string(),
            club_query: club.to_string(),
            reason: AuditReason::BelowThreshold,
            matched_name: Some(best_name.to_string()),
            score: Some(score),
            threshold,
        }
    }

    fn unmatched(season: &str, club: &str, reason: AuditReason, threshold: f64) -> Self {
        Self {
            season: season.to_string(),
            club_query: club.to_string(),
            reason,
            matched_name: None,
            score: None,
            threshold,
        }
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn club_query(&self) -> &str {
        &self.club_query
    }

    pub fn reason(&self) -> AuditReason {
        self.reason
    }

    pub fn matched_name(&self) -> Option<&str> {
        self.matched_name.as_deref()
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.season.as_str(), self.club_query.as_str())
    }
}

/// Records split by whether a reviewer has seen their key.
#[derive(Debug, Default)]
pub struct AuditPartition<'a> {
    pub reviewed: Vec<&'a AuditRecord>,
    pub new: Vec<&'a AuditRecord>,
}

/// Append-only audit trail for one run.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AuditRecord) {
        tracing::debug!(
            "audit: {} '{}' -> {} (matched {:?}, score {:?})",
            record.season,
            record.club_query,
            record.reason,
            record.matched_name,
            record.score
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split records by key membership in `reviewed`. A key counts as
    /// reviewed whatever the approval marker said. Order is preserved.
    pub fn partition(&self, reviewed: &HashSet<MatchKey>) -> AuditPartition<'_> {
        let mut partition = AuditPartition::default();
        for record in &self.records {
            if reviewed.contains(&record.key()) {
                partition.reviewed.push(record);
            } else {
                partition.new.push(record);
            }
        }
        partition
    }

    /// Record count per reason, in declaration order, zero counts omitted.
    pub fn reason_counts(&self) -> Vec<(AuditReason, usize)> {
        [
            AuditReason::ManualTargetMissing,
            AuditReason::SeasonMissing,
            AuditReason::NoCandidate,
            AuditReason::BelowThreshold,
        ]
        .into_iter()
        .map(|reason| {
            let count = self.records.iter().filter(|r| r.reason == reason).count();
            (reason, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

/// Write audit records as CSV. The header is always written.
pub fn write_audit_csv<'a, W, I>(writer: W, records: I) -> Result<(), AuditError>
where
    W: Write,
    I: IntoIterator<Item = &'a AuditRecord>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(AUDIT_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write audit records to `path`, replacing any existing file.
pub fn write_audit_file<'a, I>(path: &Path, records: I) -> Result<(), AuditError>
where
    I: IntoIterator<Item = &'a AuditRecord>,
{
    let file = std::fs::File::create(path)?;
    write_audit_csv(file, records)
}
