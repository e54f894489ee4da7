use anyhow::Result;
use clubcoeff_lib::transfers::format_coefficient;
use clubcoeff_lib::{AuditRecord, Resolution, TransferBatch};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    /// Unknown names fall back to a plain table.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct ResolutionRow {
    #[tabled(rename = "Season")]
    #[serde(rename = "Season")]
    season: String,
    #[tabled(rename = "Query")]
    #[serde(rename = "Query")]
    club_query: String,
    #[tabled(rename = "Match")]
    #[serde(rename = "Match")]
    match_type: String,
    #[tabled(rename = "Matched Name")]
    #[serde(rename = "Matched Name")]
    matched_name: String,
    #[tabled(rename = "Score")]
    #[serde(rename = "Score")]
    score: String,
    #[tabled(rename = "Coefficient")]
    #[serde(rename = "Coefficient")]
    coefficient: String,
}

#[derive(Tabled, Serialize)]
struct AuditRow {
    #[tabled(rename = "Season")]
    #[serde(rename = "Season")]
    season: String,
    #[tabled(rename = "Query")]
    #[serde(rename = "Query")]
    club_query: String,
    #[tabled(rename = "Reason")]
    #[serde(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Matched Name")]
    #[serde(rename = "Matched Name")]
    matched_name: String,
    #[tabled(rename = "Score")]
    #[serde(rename = "Score")]
    score: String,
    #[tabled(rename = "Threshold")]
    #[serde(rename = "Threshold")]
    threshold: String,
}

/// First rows of an enriched batch, all columns as strings.
struct Preview {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

// -- Row builders --

fn build_preview(batch: &TransferBatch, limit: usize) -> Preview {
    let mut headers: Vec<String> = batch.headers().iter().map(str::to_string).collect();
    headers.push(clubcoeff_lib::transfers::COEFF_COLUMN.to_string());

    let rows = batch
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            let mut cells: Vec<String> = row.record().iter().map(str::to_string).collect();
            cells.resize(headers.len() - 1, String::new());
            cells.push(format_optional_coefficient(row.from_club_coeff));
            cells
        })
        .collect();

    Preview { headers, rows }
}

fn build_resolution_row(res: &Resolution) -> ResolutionRow {
    ResolutionRow {
        season: res.season.clone(),
        club_query: res.club_query.clone(),
        match_type: res.match_type.to_string(),
        matched_name: res.matched_name.clone().unwrap_or_default(),
        score: format_score(res.score),
        coefficient: format_optional_coefficient(res.coefficient),
    }
}

fn build_audit_rows(records: &[AuditRecord]) -> Vec<AuditRow> {
    records
        .iter()
        .map(|r| AuditRow {
            season: r.season().to_string(),
            club_query: r.club_query().to_string(),
            reason: r.reason().to_string(),
            matched_name: r.matched_name().unwrap_or_default().to_string(),
            score: format_score(r.score()),
            threshold: format!("{:.0}", r.threshold()),
        })
        .collect()
}

// -- Printers --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

/// Print the first `limit` rows of an enriched batch.
pub fn print_transfer_preview(
    batch: &TransferBatch,
    limit: usize,
    format: &OutputFormat,
) -> Result<()> {
    let preview = build_preview(batch, limit);
    match format {
        OutputFormat::Table | OutputFormat::Markdown => {
            let mut builder = Builder::default();
            builder.push_record(preview.headers);
            for row in preview.rows {
                builder.push_record(row);
            }
            let mut table = builder.build();
            if *format == OutputFormat::Markdown {
                table.with(Style::markdown());
            }
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(&preview.headers)?;
            for row in &preview.rows {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let objects: Vec<serde_json::Map<String, serde_json::Value>> = preview
                .rows
                .iter()
                .map(|row| {
                    preview
                        .headers
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(serde_json::Value::String))
                        .collect()
                })
                .collect();
            print_json(&objects);
        }
    }
    Ok(())
}

/// Print one resolution and the audit records it produced.
pub fn print_resolution(
    res: &Resolution,
    records: &[AuditRecord],
    format: &OutputFormat,
) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "resolution": res,
            "audit": records,
        }));
        return Ok(());
    }

    print_rows(vec![build_resolution_row(res)], format)?;
    if !records.is_empty() {
        println!();
        print_rows(build_audit_rows(records), format)?;
    }
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_optional_coefficient(value: Option<f64>) -> String {
    value.map(format_coefficient).unwrap_or_default()
}

fn format_score(score: Option<f64>) -> String {
    score.map(|s| format!("{:.1}", s)).unwrap_or_default()
}
