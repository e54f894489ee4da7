//! The `lookup` subcommand: resolves one (season, club) pair and shows how.

use anyhow::{Context, Result};
use clap::Args;
use clubcoeff_lib::{CorrectionTable, RankingStore, Resolver};
use std::path::PathBuf;

use super::validate_threshold;
use crate::output::{print_resolution, OutputFormat};

/// Arguments for the `lookup` subcommand.
#[derive(Args)]
pub struct LookupArgs {
    /// Season key as it appears in the ranking file (e.g., 24/25)
    #[arg(long)]
    pub season: String,

    /// Club name to resolve
    #[arg(long)]
    pub club: String,

    /// Per-season ranking JSON
    #[arg(long, default_value = "uefa_rankings.json")]
    pub rankings: PathBuf,

    /// Reviewed fuzzy-match corrections CSV (optional file)
    #[arg(long, default_value = "fuzzy_corrections.csv")]
    pub corrections: PathBuf,

    /// Minimum fuzzy score to accept a match (0-100)
    #[arg(long, default_value = "90")]
    pub threshold: f64,
}

pub fn run(args: &LookupArgs, format: &OutputFormat) -> Result<()> {
    let threshold = validate_threshold(args.threshold)?;

    let rankings = RankingStore::load(&args.rankings)
        .with_context(|| format!("Failed to load rankings from {}", args.rankings.display()))?;
    let corrections = CorrectionTable::load(&args.corrections).with_context(|| {
        format!(
            "Failed to load corrections from {}",
            args.corrections.display()
        )
    })?;

    let mut resolver = Resolver::new(&rankings, &corrections);
    let resolution = resolver.resolve_detailed(&args.season, &args.club, threshold);

    print_resolution(&resolution, resolver.audit_log().records(), format)
}
