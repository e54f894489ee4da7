use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("clubcoeff_cli_{}", name));
    let _ = std::fs::remove_dir_all(&p);
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn clubcoeff(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clubcoeff"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("binary runs")
}

fn run_enrich(dir: &Path, extra: &[&str]) -> Output {
    run_enrich_with_rankings(dir, &fixture("uefa_rankings.json"), extra)
}

fn run_enrich_with_rankings(dir: &Path, rankings: &Path, extra: &[&str]) -> Output {
    let transfers = fixture("transfers.csv");
    let corrections = fixture("fuzzy_corrections.csv");
    let audit = dir.join("fuzzy_match_failures.csv");
    let new_audit = dir.join("fuzzy_match_new_failures.csv");

    let mut args = vec![
        "enrich",
        "--transfers",
        transfers.to_str().unwrap(),
        "--rankings",
        rankings.to_str().unwrap(),
        "--corrections",
        corrections.to_str().unwrap(),
        "--audit",
        audit.to_str().unwrap(),
        "--new-audit",
        new_audit.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    clubcoeff(&args)
}

// ---------------------------------------------------------------------------
// enrich
// ---------------------------------------------------------------------------

#[test]
fn test_enrich_writes_outputs_and_stats() {
    let dir = tmp_dir("enrich");
    let out = dir.join("transfers_enriched.csv");
    let output = run_enrich(&dir, &["--output", out.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[STATS] Missing UEFA coefficients: 3/6 (50.00%)"));
    assert!(stdout.contains("[INFO] Wrote 3 fuzzy-match debug records to"));
    assert!(stdout.contains("[INFO] Found 2 new fuzzy-match issues not yet in corrections"));

    let enriched = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = enriched.lines().collect();
    assert_eq!(
        lines[0],
        "player,transfer_season,from_club_name,fee_eur_m,from_club_uefa_coeff"
    );
    assert_eq!(lines[1], "Vinicius,24/25,Real Madrid,0,381.0");
    assert_eq!(lines[2], "Rodrygo,24/25,Real Madrid CF,0,381.0");
    assert_eq!(lines[3], "Barella,24/25,Internazionale,12,");
    assert_eq!(lines[4], "Neres,24/25,Benfica,20,150.5");
    assert_eq!(lines[5], "Tadic,22/23,Ajax,0,");

    let all = std::fs::read_to_string(dir.join("fuzzy_match_failures.csv")).unwrap();
    assert_eq!(all.lines().count(), 4);
    assert!(all.contains("Internazionale,below_threshold,Inter Milan"));

    let new = std::fs::read_to_string(dir.join("fuzzy_match_new_failures.csv")).unwrap();
    let new_lines: Vec<&str> = new.lines().collect();
    assert_eq!(new_lines.len(), 3);
    assert!(new_lines[1].starts_with("22/23,Ajax,season_missing"));
    assert!(new_lines[2].starts_with("23/24,Werder Bremen,below_threshold"));
}

#[test]
fn test_enrich_csv_preview() {
    let dir = tmp_dir("preview");
    let output = run_enrich(&dir, &["--output-format", "csv", "--preview", "2"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("player,transfer_season,from_club_name,fee_eur_m,from_club_uefa_coeff")
    );
    assert_eq!(lines.next(), Some("Vinicius,24/25,Real Madrid,0,381.0"));
    assert_eq!(lines.next(), Some("Rodrygo,24/25,Real Madrid CF,0,381.0"));
    assert_eq!(lines.next(), Some(""));
}

#[test]
fn test_enrich_rejects_threshold_out_of_range() {
    let dir = tmp_dir("bad_threshold");
    let output = run_enrich(&dir, &["--threshold", "150"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid --threshold value"));
    assert!(!dir.join("fuzzy_match_failures.csv").exists());
}

#[test]
fn test_enrich_missing_rankings_is_fatal() {
    let dir = tmp_dir("no_rankings");
    let missing = dir.join("nope.json");
    let output = run_enrich_with_rankings(&dir, &missing, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load rankings"), "stderr: {}", stderr);
    assert!(!dir.join("fuzzy_match_failures.csv").exists());
}

// ---------------------------------------------------------------------------
// lookup
// ---------------------------------------------------------------------------

fn lookup_json(season: &str, club: &str) -> Value {
    let rankings = fixture("uefa_rankings.json");
    let corrections = fixture("fuzzy_corrections.csv");
    let output = clubcoeff(&[
        "--output-format",
        "json",
        "lookup",
        "--season",
        season,
        "--club",
        club,
        "--rankings",
        rankings.to_str().unwrap(),
        "--corrections",
        corrections.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("lookup prints JSON")
}

#[test]
fn test_lookup_fuzzy_json() {
    let value = lookup_json("24/25", "Real Madric");
    assert_eq!(value["resolution"]["match_type"], "fuzzy");
    assert_eq!(value["resolution"]["matched_name"], "Real Madrid");
    assert_eq!(value["resolution"]["coefficient"], 381.0);
    assert_eq!(value["audit"].as_array().unwrap().len(), 0);
}

#[test]
fn test_lookup_manual_json() {
    let value = lookup_json("24/25", "Real Madrid CF");
    assert_eq!(value["resolution"]["match_type"], "manual");
    assert_eq!(value["resolution"]["coefficient"], 381.0);
}

#[test]
fn test_lookup_season_missing_json() {
    let value = lookup_json("22/23", "Ajax");
    assert_eq!(value["resolution"]["match_type"], "unresolved");
    assert!(value["resolution"]["coefficient"].is_null());
    assert_eq!(value["audit"][0]["reason"], "season_missing");
}
