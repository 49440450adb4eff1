//! Plan export: one CSV per record kind plus a JSON summary.
//!
//! | File | One row per |
//! |------|-------------|
//! | `expansions.csv` | existing facility |
//! | `new_facilities.csv` | region × facility type |
//! | `zip_coverage.csv` | region |
//! | `site_builds.csv` | candidate site (site-level plans only) |
//! | `summary.json` | plan |

use anyhow::{Context, Result};
use cdp_algo::{CostBreakdown, Formulation, PlanSolution, SolveStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPANSIONS_FILE: &str = "expansions.csv";
pub const NEW_FACILITIES_FILE: &str = "new_facilities.csv";
pub const COVERAGE_FILE: &str = "zip_coverage.csv";
pub const SITE_BUILDS_FILE: &str = "site_builds.csv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Serialize)]
struct ExpansionRow<'a> {
    zip: &'a str,
    facility_id: &'a str,
    cap_existing_total: u32,
    cap_existing_u5: u32,
    expand_slots: u32,
    expand_u5_slots: u32,
    triggered_baseline: Option<u8>,
    tier1_slots: Option<u32>,
    tier2_slots: Option<u32>,
    tier3_slots: Option<u32>,
    expansion_cap: u32,
    expansion_cost: f64,
}

#[derive(Serialize)]
struct NewFacilityRow<'a> {
    zip: &'a str,
    #[serde(rename = "type")]
    facility_type: &'a str,
    build_count: u32,
    u5_slots: u32,
    cap_per_facility: u32,
    cap05_per_facility: u32,
    cost_per_facility: f64,
}

#[derive(Serialize)]
struct CoverageRow<'a> {
    zip: &'a str,
    theta: f64,
    pop_0_12: f64,
    pop_0_5: f64,
    slots_total: u64,
    slots_u5: u64,
    coverage_rhs: f64,
    u5_rhs: f64,
    existing_slots: u64,
    existing_u5_slots: u64,
    expansion_slots: u64,
    expansion_u5_slots: u64,
    built_slots: u64,
    built_u5_slots: u64,
}

#[derive(Serialize)]
struct SiteRow<'a> {
    zip: &'a str,
    site: usize,
    latitude: f64,
    longitude: f64,
    suppressed: bool,
    #[serde(rename = "type")]
    facility_type: Option<&'a str>,
    u5_slots: u32,
}

/// Top-level figures written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub formulation: Formulation,
    pub site_selection: bool,
    pub status: SolveStatus,
    pub optimal: bool,
    pub objective: f64,
    pub costs: CostBreakdown,
    pub regions: usize,
    pub regions_short_of_target: usize,
    pub facilities_expanded: usize,
    pub expansion_slots: u64,
    pub facilities_built: u64,
    pub built_slots: u64,
    pub solve_time_ms: u64,
}

impl From<&PlanSolution> for PlanSummary {
    fn from(solution: &PlanSolution) -> Self {
        Self {
            formulation: solution.formulation,
            site_selection: solution.site_selection,
            status: solution.status,
            optimal: solution.is_optimal(),
            objective: solution.objective_value,
            costs: solution.costs,
            regions: solution.coverage.len(),
            regions_short_of_target: solution.regions_short_of_target(),
            facilities_expanded: solution.facilities_expanded(),
            expansion_slots: solution.expansion_slots(),
            facilities_built: solution.facilities_built(),
            built_slots: solution.built_slots(),
            solve_time_ms: solution.solve_time.as_millis() as u64,
        }
    }
}

// Header written explicitly so tables without rows still carry it.
fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    wtr.write_record(header)
        .with_context(|| format!("writing CSV header to {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing CSV record to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing CSV writer for {}", path.display()))?;
    Ok(())
}

pub fn write_expansions_csv(solution: &PlanSolution, path: &Path) -> Result<()> {
    write_rows(
        path,
        &[
            "zip",
            "facility_id",
            "cap_existing_total",
            "cap_existing_u5",
            "expand_slots",
            "expand_u5_slots",
            "triggered_baseline",
            "tier1_slots",
            "tier2_slots",
            "tier3_slots",
            "expansion_cap",
            "expansion_cost",
        ],
        solution.expansions.iter().map(|e| {
            let tiers = e.tier_slots.map(|t| t.map(Some)).unwrap_or([None; 3]);
            ExpansionRow {
                zip: e.region.as_str(),
                facility_id: e.facility_id.as_str(),
                cap_existing_total: e.existing_total,
                cap_existing_u5: e.existing_under5,
                expand_slots: e.expand_slots,
                expand_u5_slots: e.expand_under5_slots,
                triggered_baseline: e.triggered_baseline.map(u8::from),
                tier1_slots: tiers[0],
                tier2_slots: tiers[1],
                tier3_slots: tiers[2],
                expansion_cap: e.expansion_cap,
                expansion_cost: e.expansion_cost,
            }
        }),
    )
}

pub fn write_new_facilities_csv(solution: &PlanSolution, path: &Path) -> Result<()> {
    write_rows(
        path,
        &[
            "zip",
            "type",
            "build_count",
            "u5_slots",
            "cap_per_facility",
            "cap05_per_facility",
            "cost_per_facility",
        ],
        solution.builds.iter().map(|b| NewFacilityRow {
            zip: b.region.as_str(),
            facility_type: b.facility_type.code(),
            build_count: b.build_count,
            u5_slots: b.under5_slots,
            cap_per_facility: b.capacity_per_facility,
            cap05_per_facility: b.under5_capacity_per_facility,
            cost_per_facility: b.cost_per_facility,
        }),
    )
}

pub fn write_coverage_csv(solution: &PlanSolution, path: &Path) -> Result<()> {
    write_rows(
        path,
        &[
            "zip",
            "theta",
            "pop_0_12",
            "pop_0_5",
            "slots_total",
            "slots_u5",
            "coverage_rhs",
            "u5_rhs",
            "existing_slots",
            "existing_u5_slots",
            "expansion_slots",
            "expansion_u5_slots",
            "built_slots",
            "built_u5_slots",
        ],
        solution.coverage.iter().map(|c| CoverageRow {
            zip: c.region.as_str(),
            theta: c.theta,
            pop_0_12: c.population_0_12,
            pop_0_5: c.population_0_5,
            slots_total: c.total_slots(),
            slots_u5: c.total_under5_slots(),
            coverage_rhs: c.coverage_target,
            u5_rhs: c.under5_target,
            existing_slots: c.existing_slots,
            existing_u5_slots: c.existing_under5_slots,
            expansion_slots: c.expansion_slots,
            expansion_u5_slots: c.expansion_under5_slots,
            built_slots: c.built_slots,
            built_u5_slots: c.built_under5_slots,
        }),
    )
}

pub fn write_site_builds_csv(solution: &PlanSolution, path: &Path) -> Result<()> {
    write_rows(
        path,
        &["zip", "site", "latitude", "longitude", "suppressed", "type", "u5_slots"],
        solution.sites.iter().map(|s| SiteRow {
            zip: s.region.as_str(),
            site: s.site.value(),
            latitude: s.location.latitude,
            longitude: s.location.longitude,
            suppressed: s.suppressed,
            facility_type: s.built.map(|t| t.code()),
            u5_slots: s.under5_slots,
        }),
    )
}

pub fn write_summary_json(solution: &PlanSolution, path: &Path) -> Result<()> {
    let summary = PlanSummary::from(solution);
    let json = serde_json::to_string_pretty(&summary).context("serializing plan summary to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))?;
    Ok(())
}

/// Write every artifact of a plan into `dir`, creating it if needed.
pub fn write_plan(solution: &PlanSolution, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut written = Vec::new();
    let mut emit = |name: &str, write: fn(&PlanSolution, &Path) -> Result<()>| -> Result<()> {
        let path = dir.join(name);
        write(solution, &path)?;
        written.push(path);
        Ok(())
    };

    emit(EXPANSIONS_FILE, write_expansions_csv)?;
    emit(NEW_FACILITIES_FILE, write_new_facilities_csv)?;
    emit(COVERAGE_FILE, write_coverage_csv)?;
    if solution.site_selection {
        emit(SITE_BUILDS_FILE, write_site_builds_csv)?;
    }
    emit(SUMMARY_FILE, write_summary_json)?;

    info!(
        dir = %dir.display(),
        files = written.len(),
        formulation = %solution.formulation,
        "plan written"
    );
    Ok(written)
}
