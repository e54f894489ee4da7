//! Per-season club coefficient tables.
//!
//! The rankings source is a JSON object keyed by season, each value mapping a
//! canonical club name to its coefficient:
//!
//! ```json
//! {"24/25": {"Real Madrid": 381.0, "FC Barcelona": 350.0}}
//! ```
//!
//! Tables are loaded once and never mutated. Club order inside a season is
//! kept as it appears in the file so fuzzy tie-breaking is deterministic.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Error types for loading the rankings source.
#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Failed to read rankings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rankings JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Invalid coefficient {value} for '{club}' in season {season}")]
    InvalidCoefficient {
        season: String,
        club: String,
        value: f64,
    },
}

/// Club coefficients for one season, in source order. A club repeated in
/// the source keeps its first position and its last coefficient.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SeasonTable {
    clubs: IndexMap<String, f64>,
}

impl SeasonTable {
    /// Build a table from `(club, coefficient)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut clubs = IndexMap::new();
        for (club, coefficient) in pairs {
            clubs.insert(club.into(), coefficient);
        }
        Self { clubs }
    }

    /// Exact (verbatim) lookup.
    pub fn get(&self, club: &str) -> Option<f64> {
        self.clubs.get(club).copied()
    }

    pub fn contains(&self, club: &str) -> bool {
        self.clubs.contains_key(club)
    }

    /// Iterate `(club, coefficient)` in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.clubs.iter().map(|(club, c)| (club.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }
}

/// All seasons of the rankings source.
#[derive(Debug, Clone, Default)]
pub struct RankingStore {
    seasons: HashMap<String, SeasonTable>,
}

impl RankingStore {
    /// Build a store from already-parsed season tables, rejecting negative or
    /// non-finite coefficients.
    pub fn new(seasons: HashMap<String, SeasonTable>) -> Result<Self, RankingError> {
        for (season, table) in &seasons {
            for (club, value) in table.iter() {
                if !value.is_finite() || value < 0.0 {
                    return Err(RankingError::InvalidCoefficient {
                        season: season.clone(),
                        club: club.to_string(),
                        value,
                    });
                }
            }
        }
        Ok(Self { seasons })
    }

    /// Parse the rankings JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, RankingError> {
        let seasons: HashMap<String, SeasonTable> = serde_json::from_str(json)?;
        Self::new(seasons)
    }

    /// Read and parse the rankings file. Any failure here is fatal for a run.
    pub fn load(path: &Path) -> Result<Self, RankingError> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded rankings for {} seasons ({} clubs) from {}",
            store.season_count(),
            store.club_count(),
            path.display()
        );
        Ok(store)
    }

    pub fn lookup_table(&self, season: &str) -> Option<&SeasonTable> {
        self.seasons.get(season)
    }

    pub fn lookup_coefficient(&self, season: &str, club: &str) -> Option<f64> {
        self.lookup_table(season)?.get(club)
    }

    pub fn season_count(&self) -> usize {
        self.seasons.len()
    }

    pub fn club_count(&self) -> usize {
        self.seasons.values().map(SeasonTable::len).sum()
    }
}
