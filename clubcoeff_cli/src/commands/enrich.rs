//! The `enrich` subcommand: attaches source-club coefficients to a transfers
//! CSV and writes the fuzzy-match audit trail.

use anyhow::{Context, Result};
use clap::Args;
use clubcoeff_lib::audit::write_audit_file;
use clubcoeff_lib::{AuditLog, CorrectionTable, RankingStore, Resolver, TransferBatch};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use super::validate_threshold;
use crate::output::{print_transfer_preview, OutputFormat};

/// Arguments for the `enrich` subcommand.
///
/// Reads the transfers batch, resolves every `from_club_name` against the
/// ranking table for its `transfer_season`, and reports what could not be
/// matched.
#[derive(Args)]
pub struct EnrichArgs {
    /// Transfers CSV with transfer_season and from_club_name columns
    #[arg(long, default_value = "transfers.csv")]
    pub transfers: PathBuf,

    /// Per-season ranking JSON
    #[arg(long, default_value = "uefa_rankings.json")]
    pub rankings: PathBuf,

    /// Reviewed fuzzy-match corrections CSV (optional file)
    #[arg(long, default_value = "fuzzy_corrections.csv")]
    pub corrections: PathBuf,

    /// Full audit trail of failed or uncertain matches
    #[arg(long, default_value = "fuzzy_match_failures.csv")]
    pub audit: PathBuf,

    /// Audit records not yet present in the corrections file
    #[arg(long, default_value = "fuzzy_match_new_failures.csv")]
    pub new_audit: PathBuf,

    /// Write the enriched transfers CSV here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum fuzzy score to accept a match (0-100)
    #[arg(long, default_value = "90")]
    pub threshold: f64,

    /// Number of enriched rows to print
    #[arg(long, default_value = "5")]
    pub preview: usize,
}

pub fn run(args: &EnrichArgs, format: &OutputFormat) -> Result<()> {
    let threshold = validate_threshold(args.threshold)?;

    let rankings = RankingStore::load(&args.rankings)
        .with_context(|| format!("Failed to load rankings from {}", args.rankings.display()))?;
    let corrections = CorrectionTable::load(&args.corrections).with_context(|| {
        format!(
            "Failed to load corrections from {}",
            args.corrections.display()
        )
    })?;
    let mut batch = TransferBatch::load(&args.transfers)
        .with_context(|| format!("Failed to load transfers from {}", args.transfers.display()))?;

    let mut resolver = Resolver::new(&rankings, &corrections).with_default_threshold(threshold);

    let pb = ProgressBar::new(batch.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
    )?);
    pb.set_message("resolving clubs...");
    for row in batch.rows_mut() {
        row.enrich(&mut resolver, threshold);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let (cache, audit) = resolver.into_parts();
    tracing::info!(
        "Resolved {} distinct (season, club) pairs, {} with a coefficient",
        cache.len(),
        cache.resolved_count()
    );

    print_transfer_preview(&batch, args.preview, format)?;

    if let Some(ref path) = args.output {
        batch
            .write_file(path)
            .with_context(|| format!("Failed to write enriched transfers to {}", path.display()))?;
        eprintln!("Wrote {} enriched transfers to {}", batch.len(), path.display());
    }

    write_audit(&audit, &corrections, &args.audit, &args.new_audit)?;

    println!("\n[STATS] {}", batch.summary());
    Ok(())
}

fn write_audit(
    audit: &AuditLog,
    corrections: &CorrectionTable,
    all_path: &Path,
    new_path: &Path,
) -> Result<()> {
    if audit.is_empty() {
        return Ok(());
    }

    write_audit_file(all_path, audit.records())
        .with_context(|| format!("Failed to write audit trail to {}", all_path.display()))?;
    println!(
        "\n[INFO] Wrote {} fuzzy-match debug records to {}",
        audit.len(),
        display_path(all_path)
    );
    for (reason, count) in audit.reason_counts() {
        println!("  {}: {}", reason, count);
    }

    let partition = audit.partition(corrections.all_reviewed_keys());
    if partition.new.is_empty() {
        return Ok(());
    }
    write_audit_file(new_path, partition.new.iter().copied())
        .with_context(|| format!("Failed to write new audit records to {}", new_path.display()))?;
    println!(
        "[INFO] Found {} new fuzzy-match issues not yet in corrections. They have been written to {}",
        partition.new.len(),
        display_path(new_path)
    );
    Ok(())
}

/// Absolute path for messages when it can be resolved, the given path otherwise.
fn display_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
