//! Source tables → region JSON → validated store → solved plan → exported files.

use cdp_algo::{solve_plan, PlanOptions, SolverConfig};
use cdp_core::{PlanParameters, RegionKey};
use cdp_io::export::{COVERAGE_FILE, EXPANSIONS_FILE, NEW_FACILITIES_FILE, SITE_BUILDS_FILE, SUMMARY_FILE};
use cdp_io::{
    assemble_regions, load_regions, write_plan, write_region_map, LoadPolicy, SourceFiles,
    MISSING_SENTINEL,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Two complete ZIPs plus one (07030) that only appears in the income table.
fn source_files(dir: &Path) -> SourceFiles {
    SourceFiles {
        income: write(
            dir,
            "avg_individual_income.csv",
            "ZIP code,average income\n10001,70000\n501,45000\n07030,90000\n",
        ),
        employment: write(
            dir,
            "employment_rate.csv",
            "zipcode,employment rate\n10001,50.0\n00501,0.71\n",
        ),
        population: write(
            dir,
            "population.csv",
            "zipcode,-5,5-9,10-14\n10001,300,400,500\n00501,20,30,50\n",
        ),
        childcare: write(
            dir,
            "child_care_regulated.csv",
            "zip_code,facility_id,total_capacity,infant_capacity,toddler_capacity,preschool_capacity,latitude,longitude\n\
             10001,F-1,100,10,10,20,40.75,-73.99\n\
             00501,F-2,60,,10,10,40.81,-73.04\n",
        ),
        locations: write(
            dir,
            "potential_locations.csv",
            "zipcode,latitude,longitude\n10001,40.76,-73.98\n10001,40.80,-73.95\n",
        ),
    }
}

#[test]
fn assemble_validate_solve_and_export() {
    let dir = TempDir::new().unwrap();
    let assembly = assemble_regions(&source_files(dir.path())).unwrap();

    let keys: Vec<&str> = assembly.regions.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["00501", "07030", "10001"]);

    let manhattan = &assembly.regions["10001"];
    assert_eq!(manhattan.population0_5, Some(300.0));
    // 300 + 400 + 3/5 · 500
    assert_eq!(manhattan.population0_12, Some(1000.0));
    assert_eq!(manhattan.potential_locations.as_ref().unwrap().len(), 2);

    let hoboken = &assembly.regions["07030"];
    assert_eq!(hoboken.employment_rate, Some(MISSING_SENTINEL));

    let holtsville = &assembly.regions["00501"];
    let f2 = &holtsville.childcare_dict.as_ref().unwrap()["F-2"];
    assert_eq!(f2.infant_capacity, Some(Some(0.0)));

    let json_path = dir.path().join("regions.json");
    write_region_map(&assembly.regions, &json_path).unwrap();

    // 07030 has no population or employment data
    assert!(load_regions(&json_path, LoadPolicy::Strict).is_err());
    let loaded = load_regions(&json_path, LoadPolicy::SkipIncomplete).unwrap();
    assert_eq!(loaded.store.len(), 2);
    assert_eq!(loaded.skipped(), 1);
    let region = loaded.store.get(&RegionKey::new("10001")).unwrap();
    assert!((region.employment_rate - 0.5).abs() < 1e-12);

    let solution = solve_plan(
        &loaded.store,
        &PlanParameters::default(),
        PlanOptions::tiered().with_site_selection(true),
        &SolverConfig::default(),
    )
    .unwrap();

    let out = dir.path().join("plan");
    let written = write_plan(&solution, &out).unwrap();
    assert_eq!(written.len(), 5);
    for name in [EXPANSIONS_FILE, NEW_FACILITIES_FILE, COVERAGE_FILE, SITE_BUILDS_FILE, SUMMARY_FILE] {
        assert!(out.join(name).exists(), "{name} missing");
    }

    let expansions = fs::read_to_string(out.join(EXPANSIONS_FILE)).unwrap();
    assert!(expansions.starts_with("zip,facility_id,cap_existing_total,cap_existing_u5,expand_slots"));
    assert_eq!(expansions.lines().count(), 1 + 2);

    let builds = fs::read_to_string(out.join(NEW_FACILITIES_FILE)).unwrap();
    assert_eq!(builds.lines().count(), 1 + 2 * 3);

    let sites = fs::read_to_string(out.join(SITE_BUILDS_FILE)).unwrap();
    assert_eq!(sites.lines().count(), 1 + 2);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary["formulation"], "tiered");
    assert_eq!(summary["site_selection"], true);
    assert_eq!(summary["regions"], 2);
    assert_eq!(summary["regions_short_of_target"], 0);
}

#[test]
fn aggregate_plan_skips_site_table_and_keeps_headers() {
    let dir = TempDir::new().unwrap();
    let json_path = write(
        dir.path(),
        "regions.json",
        r#"{ "00000": { "population0_12": 0, "population0_5": 0,
                        "avg_individual_income": 50000, "employment_rate": 0.7,
                        "childcare_dict": {}, "potential_locations": [] } }"#,
    );
    let loaded = load_regions(&json_path, LoadPolicy::Strict).unwrap();
    let solution = solve_plan(
        &loaded.store,
        &PlanParameters::default(),
        PlanOptions::flat(),
        &SolverConfig::default(),
    )
    .unwrap();

    let out = dir.path().join("plan");
    let written = write_plan(&solution, &out).unwrap();
    assert_eq!(written.len(), 4);
    assert!(!out.join(SITE_BUILDS_FILE).exists());

    // no facilities, but the table still has its header
    let expansions = fs::read_to_string(out.join(EXPANSIONS_FILE)).unwrap();
    assert_eq!(expansions.lines().count(), 1);
    assert!(expansions.contains("triggered_baseline"));
}

#[test]
fn missing_source_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut files = source_files(dir.path());
    files.population = write(dir.path(), "population.csv", "zipcode,-5,5-9\n10001,1,2\n");
    let err = assemble_regions(&files).unwrap_err();
    assert!(format!("{err:#}").contains("'10-14'"));
}
