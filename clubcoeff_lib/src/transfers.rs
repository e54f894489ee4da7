//! Transfer batch enrichment.
//!
//! Reads the transfers CSV, resolves each row's source club through a
//! [`Resolver`], and writes the rows back out with one extra column,
//! `from_club_uefa_coeff`. Every input column is carried through untouched.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

use crate::resolver::Resolver;

pub const SEASON_COLUMN: &str = "transfer_season";
pub const CLUB_COLUMN: &str = "from_club_name";
pub const COEFF_COLUMN: &str = "from_club_uefa_coeff";

/// Error types for the transfers CSV.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to access transfers file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to process transfers CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Transfers CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// One transfer with the fields resolution needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRow {
    /// `transfer_season` verbatim, `None` when blank.
    pub season: Option<String>,
    /// `from_club_name` verbatim, `None` when blank.
    pub from_club: Option<String>,
    /// Resolved coefficient; `None` until enriched or when unresolved.
    pub from_club_coeff: Option<f64>,
    record: StringRecord,
}

impl TransferRow {
    /// All input cells, in input column order (without any previous
    /// coefficient column).
    pub fn record(&self) -> &StringRecord {
        &self.record
    }

    /// Resolve this row's club. A blank season or club is resolved as an
    /// empty string, so it fails with an audit record like any other miss.
    pub fn enrich(&mut self, resolver: &mut Resolver<'_>, threshold: f64) {
        let season = self.season.as_deref().unwrap_or_default();
        let club = self.from_club.as_deref().unwrap_or_default();
        if season.is_empty() || club.is_empty() {
            tracing::debug!("Transfer row with blank season or club: '{}' '{}'", season, club);
        }
        self.from_club_coeff = resolver.resolve(season, club, threshold);
    }
}

/// Missing-coefficient statistics for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub missing: usize,
}

impl EnrichmentSummary {
    pub fn resolved(&self) -> usize {
        self.total - self.missing
    }

    /// Share of rows without a coefficient, 0-100. An empty batch is 0.
    pub fn missing_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.missing as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing UEFA coefficients: {}/{} ({:.2}%)",
            self.missing,
            self.total,
            self.missing_pct()
        )
    }
}

/// Format a coefficient for CSV output, always with a decimal point.
pub fn format_coefficient(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// A loaded transfers file.
#[derive(Debug, Clone)]
pub struct TransferBatch {
    headers: StringRecord,
    rows: Vec<TransferRow>,
}

impl TransferBatch {
    /// Parse transfers CSV. `transfer_season` and `from_club_name` must be
    /// present in the header; an existing `from_club_uefa_coeff` column is
    /// dropped and recomputed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TransferError> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
        let raw_headers = rdr.headers()?.clone();

        let position = |name: &'static str| {
            raw_headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(TransferError::MissingColumn(name))
        };
        let season_idx = position(SEASON_COLUMN)?;
        let club_idx = position(CLUB_COLUMN)?;
        let stale_coeff_idx = raw_headers.iter().position(|h| h.trim() == COEFF_COLUMN);

        let keep = |record: &StringRecord| -> StringRecord {
            record
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != stale_coeff_idx)
                .map(|(_, v)| v)
                .collect()
        };

        let headers = keep(&raw_headers);
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let cell = |idx: usize| {
                record
                    .get(idx)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };
            rows.push(TransferRow {
                season: cell(season_idx),
                from_club: cell(club_idx),
                from_club_coeff: None,
                record: keep(&record),
            });
        }

        Ok(Self { headers, rows })
    }

    pub fn load(path: &Path) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let batch = Self::from_reader(file)?;
        tracing::info!("Loaded {} transfers from {}", batch.len(), path.display());
        Ok(batch)
    }

    /// Input headers (without any previous coefficient column).
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[TransferRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [TransferRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve every row in order.
    pub fn enrich(&mut self, resolver: &mut Resolver<'_>, threshold: f64) {
        for row in &mut self.rows {
            row.enrich(resolver, threshold);
        }
    }

    pub fn summary(&self) -> EnrichmentSummary {
        EnrichmentSummary {
            total: self.rows.len(),
            missing: self
                .rows
                .iter()
                .filter(|r| r.from_club_coeff.is_none())
                .count(),
        }
    }

    /// Write the batch with `from_club_uefa_coeff` appended. Short input rows
    /// are padded so the coefficient stays in its column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TransferError> {
        let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

        let mut headers = self.headers.clone();
        headers.push_field(COEFF_COLUMN);
        wtr.write_record(&headers)?;

        let width = self.headers.len();
        for row in &self.rows {
            let mut record = row.record.clone();
            while record.len() < width {
                record.push_field("");
            }
            let coeff = row.from_club_coeff.map(format_coefficient).unwrap_or_default();
            record.push_field(&coeff);
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_file(&self, path: &Path) -> Result<(), TransferError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditReason;
    use crate::corrections::CorrectionTable;
    use crate::ranking::RankingStore;

    const TRANSFERS: &str = "player,transfer_season,from_club_name,fee\n\
                             Alice,24/25,Real Madrid,10\n\
                             Bob,24/25,Real Madric,5\n\
                             Carol,19/20,Ajax,1\n\
                             Dan,,FC Barcelona,0\n";

    fn rankings() -> RankingStore {
        RankingStore::from_json_str(r#"{"24/25": {"Real Madrid": 381.0, "FC Barcelona": 350.5}}"#)
            .unwrap()
    }

    #[test]
    fn test_parse_rows() {
        let batch = TransferBatch::from_reader(TRANSFERS.as_bytes()).unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.rows()[0].season.as_deref(), Some("24/25"));
        assert_eq!(batch.rows()[0].from_club.as_deref(), Some("Real Madrid"));
        assert_eq!(batch.rows()[3].season, None);
        assert_eq!(batch.headers().len(), 4);
    }

    #[test]
    fn test_missing_required_column() {
        let result = TransferBatch::from_reader("player,from_club_name\nAlice,Ajax\n".as_bytes());
        assert!(matches!(
            result.unwrap_err(),
            TransferError::MissingColumn(SEASON_COLUMN)
        ));
    }

    #[test]
    fn test_enrich_and_summary() {
        let rankings = rankings();
        let corrections = CorrectionTable::empty();
        let mut resolver = Resolver::new(&rankings, &corrections);

        let mut batch = TransferBatch::from_reader(TRANSFERS.as_bytes()).unwrap();
        batch.enrich(&mut resolver, 90.0);

        let coeffs: Vec<Option<f64>> = batch.rows().iter().map(|r| r.from_club_coeff).collect();
        assert_eq!(coeffs, vec![Some(381.0), Some(381.0), None, None]);

        let summary = batch.summary();
        assert_eq!(summary, EnrichmentSummary { total: 4, missing: 2 });
        assert_eq!(summary.resolved(), 2);
        assert_eq!(
            summary.to_string(),
            "Missing UEFA coefficients: 2/4 (50.00%)"
        );
        // Carol's unknown season and Dan's blank season are both audited
        let reasons: Vec<AuditReason> =
            resolver.audit_log().records().iter().map(|r| r.reason()).collect();
        assert_eq!(
            reasons,
            vec![AuditReason::SeasonMissing, AuditReason::SeasonMissing]
        );
    }

    #[test]
    fn test_blank_cells_are_audited() {
        let input = "transfer_season,from_club_name\n\
                     24/25,\n\
                     ,Real Madrid\n";
        let rankings = rankings();
        let corrections = CorrectionTable::empty();
        let mut resolver = Resolver::new(&rankings, &corrections);

        let mut batch = TransferBatch::from_reader(input.as_bytes()).unwrap();
        batch.enrich(&mut resolver, 90.0);
        assert_eq!(batch.summary(), EnrichmentSummary { total: 2, missing: 2 });

        let records = resolver.audit_log().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason(), AuditReason::NoCandidate);
        assert_eq!(records[0].season(), "24/25");
        assert_eq!(records[0].club_query(), "");
        assert_eq!(records[1].reason(), AuditReason::SeasonMissing);
        assert_eq!(records[1].season(), "");
        assert_eq!(records[1].club_query(), "Real Madrid");
    }

    #[test]
    fn test_cells_kept_verbatim() {
        let input = "transfer_season,from_club_name\n24/25, Real Madrid\n";
        let rankings = rankings();
        let corrections = CorrectionTable::empty();
        let mut resolver = Resolver::new(&rankings, &corrections);

        let mut batch = TransferBatch::from_reader(input.as_bytes()).unwrap();
        assert_eq!(batch.rows()[0].from_club.as_deref(), Some(" Real Madrid"));

        // padded name is not an exact hit, it goes through the fuzzy path
        let res = resolver.resolve_detailed("24/25", " Real Madrid", 90.0);
        assert_eq!(res.match_type, crate::resolver::MatchType::Fuzzy);
        batch.enrich(&mut resolver, 90.0);
        assert_eq!(batch.rows()[0].from_club_coeff, Some(381.0));
    }

    #[test]
    fn test_summary_empty_batch() {
        let summary = EnrichmentSummary { total: 0, missing: 0 };
        assert_eq!(summary.missing_pct(), 0.0);
        assert_eq!(summary.to_string(), "Missing UEFA coefficients: 0/0 (0.00%)");
    }

    #[test]
    fn test_write_appends_column() {
        let rankings = rankings();
        let corrections = CorrectionTable::empty();
        let mut resolver = Resolver::new(&rankings, &corrections);

        let mut batch = TransferBatch::from_reader(TRANSFERS.as_bytes()).unwrap();
        batch.enrich(&mut resolver, 90.0);

        let mut buf = Vec::new();
        batch.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "player,transfer_season,from_club_name,fee,from_club_uefa_coeff"
        );
        assert_eq!(lines[1], "Alice,24/25,Real Madrid,10,381.0");
        assert_eq!(lines[3], "Carol,19/20,Ajax,1,");
    }

    #[test]
    fn test_existing_coefficient_column_replaced() {
        let input = "transfer_season,from_club_uefa_coeff,from_club_name\n\
                     24/25,1.0,FC Barcelona\n";
        let rankings = rankings();
        let corrections = CorrectionTable::empty();
        let mut resolver = Resolver::new(&rankings, &corrections);

        let mut batch = TransferBatch::from_reader(input.as_bytes()).unwrap();
        batch.enrich(&mut resolver, 90.0);

        let mut buf = Vec::new();
        batch.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "transfer_season,from_club_name,from_club_uefa_coeff\n24/25,FC Barcelona,350.5\n"
        );
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(381.0), "381.0");
        assert_eq!(format_coefficient(350.5), "350.5");
        assert_eq!(format_coefficient(0.0), "0.0");
    }
}
