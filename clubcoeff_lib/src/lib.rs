//! Library layer for clubcoeff: club coefficient lookup with fuzzy name
//! resolution.
//!
//! Loads per-season ranking tables and human-reviewed corrections, resolves
//! free-text club names from a transfers batch to coefficients, and keeps an
//! audit trail of every uncertain or failed match for review.

pub mod audit;
pub mod cache;
pub mod corrections;
pub mod fuzzy;
pub mod ranking;
pub mod resolver;
pub mod transfers;

pub use audit::{write_audit_file, AuditError, AuditLog, AuditPartition, AuditReason, AuditRecord};
pub use cache::{CacheEntry, MatchCache, MatchKey};
pub use corrections::{CorrectionRow, CorrectionTable, CorrectionsError, RowSkip};
pub use ranking::{RankingError, RankingStore, SeasonTable};
pub use resolver::{MatchType, Resolution, Resolver, DEFAULT_THRESHOLD};
pub use transfers::{EnrichmentSummary, TransferBatch, TransferError, TransferRow};
