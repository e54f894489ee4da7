mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "clubcoeff")]
#[command(about = "Attach UEFA club coefficients to transfer records")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a transfers CSV with source-club coefficients
    Enrich(commands::enrich::EnrichArgs),
    /// Resolve a single (season, club) pair
    Lookup(commands::lookup::LookupArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clubcoeff=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from_name(cli.output_format.as_str());

    match &cli.command {
        Commands::Enrich(args) => commands::enrich::run(args, &format)?,
        Commands::Lookup(args) => commands::lookup::run(args, &format)?,
    }

    Ok(())
}
