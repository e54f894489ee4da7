//! Human-reviewed club name corrections.
//!
//! The corrections CSV is the feedback loop of the matcher: reviewers copy
//! rows from the new-failures audit file, fill in `matched_name`, and mark
//! `is_actually_correct`. Approved rows become overrides; every reviewed row,
//! approved or not, keeps its key out of future "new" audit subsets.
//!
//! Expected columns: `season`, `club_query`, `matched_name`,
//! `is_actually_correct`. Column order does not matter and extra columns are
//! ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::cache::MatchKey;

pub const SEASON_COLUMN: &str = "season";
pub const CLUB_QUERY_COLUMN: &str = "club_query";
pub const MATCHED_NAME_COLUMN: &str = "matched_name";
pub const APPROVED_COLUMN: &str = "is_actually_correct";

/// Error types for loading the corrections file.
#[derive(Error, Debug)]
pub enum CorrectionsError {
    #[error("Failed to read corrections file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse corrections CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Corrections file has no header row")]
    MissingHeader,
}

/// Why an approved row could not become an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    MissingSeason,
    MissingClubQuery,
    MissingMatchedName,
}

impl std::fmt::Display for RowSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSeason => write!(f, "missing season"),
            Self::MissingClubQuery => write!(f, "missing club_query"),
            Self::MissingMatchedName => write!(f, "missing matched_name"),
        }
    }
}

/// One row of the corrections file. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionRow {
    pub season: Option<String>,
    pub club_query: Option<String>,
    pub matched_name: Option<String>,
    pub approved: Option<String>,
}

impl CorrectionRow {
    /// Key of a reviewed row. Needs both `season` and `club_query`.
    pub fn reviewed_key(&self) -> Option<MatchKey> {
        match (&self.season, &self.club_query) {
            (Some(season), Some(club)) => Some(MatchKey::new(season.as_str(), club.as_str())),
            _ => None,
        }
    }

    pub fn is_approved(&self) -> bool {
        is_truthy(self.approved.as_deref())
    }

    /// Turn the row into an override.
    ///
    /// * `Ok(None)` - not approved; the row is only a review marker
    /// * `Ok(Some(..))` - approved with all fields present
    /// * `Err(RowSkip)` - approved but incomplete
    pub fn to_override(&self) -> Result<Option<(MatchKey, String)>, RowSkip> {
        if !self.is_approved() {
            return Ok(None);
        }
        let season = self.season.as_deref().ok_or(RowSkip::MissingSeason)?;
        let club = self.club_query.as_deref().ok_or(RowSkip::MissingClubQuery)?;
        let target = self
            .matched_name
            .as_deref()
            .ok_or(RowSkip::MissingMatchedName)?;
        Ok(Some((MatchKey::new(season, club), target.to_string())))
    }
}

/// Approval marker check: `1`, `1.0`, `true` or `yes` (any case).
pub fn is_truthy(raw: Option<&str>) -> bool {
    let Some(value) = raw.map(str::trim) else {
        return false;
    };
    if let Ok(n) = value.parse::<f64>() {
        return n == 1.0;
    }
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

/// Counts from a corrections load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionsReport {
    pub approved: usize,
    pub not_approved: usize,
    /// (1-based data row number, reason)
    pub skipped: Vec<(usize, RowSkip)>,
}

/// Column positions resolved from the header row.
struct Columns {
    season: Option<usize>,
    club_query: Option<usize>,
    matched_name: Option<usize>,
    approved: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            season: find(SEASON_COLUMN),
            club_query: find(CLUB_QUERY_COLUMN),
            matched_name: find(MATCHED_NAME_COLUMN),
            approved: find(APPROVED_COLUMN),
        }
    }

    fn row(&self, record: &StringRecord) -> CorrectionRow {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        CorrectionRow {
            season: cell(self.season),
            club_query: cell(self.club_query),
            matched_name: cell(self.matched_name),
            approved: cell(self.approved),
        }
    }
}

/// Approved overrides plus every reviewed key.
#[derive(Debug, Default)]
pub struct CorrectionTable {
    overrides: HashMap<MatchKey, String>,
    reviewed: HashSet<MatchKey>,
    report: CorrectionsReport,
}

impl CorrectionTable {
    /// An empty table: no overrides, nothing reviewed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from parsed rows. Later approved rows for a key replace earlier
    /// ones.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CorrectionRow>,
    {
        let mut table = Self::default();
        for (i, row) in rows.into_iter().enumerate() {
            if let Some(key) = row.reviewed_key() {
                table.reviewed.insert(key);
            }
            match row.to_override() {
                Ok(Some((key, target))) => {
                    table.report.approved += 1;
                    table.overrides.insert(key, target);
                }
                Ok(None) => table.report.not_approved += 1,
                Err(reason) => {
                    tracing::debug!("Skipping corrections row {}: {}", i + 1, reason);
                    table.report.skipped.push((i + 1, reason));
                }
            }
        }
        table
    }

    /// Parse corrections CSV content. Header names are trimmed, cells are
    /// kept verbatim. Short rows are tolerated; a missing header row or
    /// unparseable CSV is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorrectionsError> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(CorrectionsError::MissingHeader);
        }
        let columns = Columns::from_headers(&headers);

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(columns.row(&record));
        }
        Ok(Self::from_rows(rows))
    }

    /// Load the corrections file. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, CorrectionsError> {
        if !path.exists() {
            tracing::info!(
                "No corrections file at {}; continuing without overrides",
                path.display()
            );
            return Ok(Self::empty());
        }
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} approved corrections ({} reviewed keys, {} rows skipped) from {}",
            table.report.approved,
            table.reviewed.len(),
            table.report.skipped.len(),
            path.display()
        );
        Ok(table)
    }

    /// Canonical club name a reviewer approved for this query, if any.
    pub fn resolve_override(&self, season: &str, club: &str) -> Option<&str> {
        self.overrides
            .get(&MatchKey::new(season, club))
            .map(String::as_str)
    }

    /// Every (season, club_query) present in the source, approved or not.
    pub fn all_reviewed_keys(&self) -> &HashSet<MatchKey> {
        &self.reviewed
    }

    pub fn report(&self) -> &CorrectionsReport {
        &self.report
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}
