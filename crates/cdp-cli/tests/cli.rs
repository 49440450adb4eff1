//! Integration tests for the `cdp` binary

#![cfg(feature = "solver-microlp")]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// theta = 1/3 against 100 existing slots: the optimal plan builds one L facility.
const REFERENCE_REGION: &str = r#"{
    "10001": {
        "population0_12": 1000, "population0_5": 300,
        "avg_individual_income": 70000, "employment_rate": 50.0,
        "childcare_dict": {
            "F-1": { "total_capacity": 100, "infant_capacity": 10,
                     "toddler_capacity": 10, "preschool_capacity": 20,
                     "latitude": 40.75, "longitude": -73.99 }
        },
        "potential_locations": [ { "latitude": 40.80, "longitude": -73.95 } ]
    }
}"#;

/// theta = 1/2 of 2000 children but one candidate site of at most 400 slots.
const UNREACHABLE_REGION: &str = r#"{
    "20001": {
        "population0_12": 2000, "population0_5": 100,
        "avg_individual_income": 50000, "employment_rate": 0.7,
        "childcare_dict": {},
        "potential_locations": [ { "latitude": 38.90, "longitude": -77.01 } ]
    }
}"#;

/// One valid region and one without population figures.
const MIXED_REGIONS: &str = r#"{
    "10001": {
        "population0_12": 1000, "population0_5": 300,
        "avg_individual_income": 70000, "employment_rate": 0.5,
        "childcare_dict": {}, "potential_locations": []
    },
    "07030": {
        "population0_12": -1, "population0_5": -1,
        "avg_individual_income": 90000, "employment_rate": -1,
        "childcare_dict": {}, "potential_locations": []
    }
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn read_summary(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap()
}

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("cdp")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("dataset"));
}

#[test]
fn test_solve_help() {
    cargo_bin_cmd!("cdp")
        .args(["solve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--formulation"))
        .stdout(predicate::str::contains("--accept-suboptimal"));
}

#[test]
fn test_solve_tiered_writes_plan() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);
    let out = dir.path().join("plan");

    cargo_bin_cmd!("cdp")
        .args(["solve", "--threads", "2", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Capacity Plan Summary"))
        .stdout(predicate::str::contains("Status: optimal"));

    for name in ["expansions.csv", "new_facilities.csv", "zip_coverage.csv", "summary.json"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    assert!(!out.join("site_builds.csv").exists());

    let summary = read_summary(&out);
    assert_eq!(summary["formulation"], "tiered");
    assert_eq!(summary["status"], "optimal");
    assert!((summary["objective"].as_f64().unwrap() - 131_000.0).abs() < 1e-6);
    assert_eq!(summary["facilities_built"], 1);
}

#[test]
fn test_solve_tiered_with_sites() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);
    let out = dir.path().join("plan");

    cargo_bin_cmd!("cdp")
        .args(["solve", "--sites", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let sites = fs::read_to_string(out.join("site_builds.csv")).unwrap();
    assert_eq!(sites.lines().count(), 2);
    assert!(sites.lines().nth(1).unwrap().contains(",L,"));
    assert_eq!(read_summary(&out)["site_selection"], true);
}

#[test]
fn test_solve_both_formulations() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);
    let out = dir.path().join("plan");

    cargo_bin_cmd!("cdp")
        .args(["solve", "--formulation", "both", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let flat = read_summary(&out.join("flat"));
    let tiered = read_summary(&out.join("tiered"));
    assert_eq!(flat["formulation"], "flat");
    assert_eq!(tiered["formulation"], "tiered");
    let (a, b) = (
        flat["objective"].as_f64().unwrap(),
        tiered["objective"].as_f64().unwrap(),
    );
    assert!((a - b).abs() < 1e-6);
}

#[test]
fn test_solve_infeasible_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", UNREACHABLE_REGION);
    let out = dir.path().join("plan");

    cargo_bin_cmd!("cdp")
        .args(["solve", "--sites", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("infeasible"));

    assert!(!out.exists());
}

#[test]
fn test_flat_with_sites_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);

    cargo_bin_cmd!("cdp")
        .args(["solve", "--formulation", "flat", "--sites", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("plan"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("only available with the tiered formulation"));
}

#[test]
fn test_skip_incomplete_regions() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", MIXED_REGIONS);

    cargo_bin_cmd!("cdp")
        .args(["solve", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("strict"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("07030"));

    let out = dir.path().join("lenient");
    cargo_bin_cmd!("cdp")
        .args(["solve", "--skip-incomplete", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 invalid regions"));

    assert_eq!(read_summary(&out)["regions"], 1);
}

#[test]
fn test_solve_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);
    let config = write(dir.path(), "cdp.toml", "[parameters]\nalpha = -1.0\n");

    cargo_bin_cmd!("cdp")
        .args(["solve", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("plan"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_thread_count() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);

    cargo_bin_cmd!("cdp")
        .args(["solve", "--threads", "zero", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("plan"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid thread count"));
}

#[test]
fn test_validate_reports_regions() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", REFERENCE_REGION);

    cargo_bin_cmd!("cdp")
        .args(["validate", "--sites", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Regions: 1"))
        .stdout(predicate::str::contains("Exclusive site pairs: 0"))
        .stdout(predicate::str::contains("Region data is valid"));
}

#[test]
fn test_validate_fails_on_incomplete_region() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "regions.json", MIXED_REGIONS);

    cargo_bin_cmd!("cdp")
        .args(["validate", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("07030"))
        .stderr(predicate::str::contains("1 invalid regions"));
}

#[test]
fn test_validate_sites_needs_facility_coordinates() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "regions.json",
        r#"{ "10001": { "population0_12": 100, "population0_5": 30,
                        "avg_individual_income": 70000, "employment_rate": 0.5,
                        "childcare_dict": { "F-1": { "total_capacity": 50, "infant_capacity": 5,
                            "toddler_capacity": 5, "preschool_capacity": 5 } },
                        "potential_locations": [] } }"#,
    );

    cargo_bin_cmd!("cdp")
        .args(["validate", "--input"])
        .arg(&input)
        .assert()
        .success();

    cargo_bin_cmd!("cdp")
        .args(["validate", "--sites", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("coordinates are required"));
}

#[test]
fn test_dataset_build() {
    let dir = TempDir::new().unwrap();
    let p = dir.path();
    let income = write(p, "income.csv", "ZIP code,average income\n10001,70000\n");
    let employment = write(p, "employment.csv", "zipcode,employment rate\n10001,50.0\n");
    let population = write(p, "population.csv", "zipcode,-5,5-9,10-14\n10001,300,400,500\n");
    let childcare = write(
        p,
        "childcare.csv",
        "zip_code,facility_id,total_capacity,infant_capacity,toddler_capacity,preschool_capacity\n\
         10001,F-1,100,10,10,20\n",
    );
    let locations = write(p, "locations.csv", "zipcode,latitude,longitude\n10001,40.76,-73.98\n");
    let out = p.join("data").join("regions.json");

    cargo_bin_cmd!("cdp")
        .args(["dataset", "build", "--income"])
        .arg(&income)
        .arg("--employment")
        .arg(&employment)
        .arg("--population")
        .arg(&population)
        .arg("--childcare")
        .arg(&childcare)
        .arg("--locations")
        .arg(&locations)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Regions: 1"))
        .stdout(predicate::str::contains("Regions with missing data: 0"));

    let regions: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(regions["10001"]["population0_12"], 1000.0);

    cargo_bin_cmd!("cdp")
        .args(["validate", "--input"])
        .arg(&out)
        .assert()
        .success();
}

#[test]
fn test_completions_bash() {
    cargo_bin_cmd!("cdp")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cdp"));
}
