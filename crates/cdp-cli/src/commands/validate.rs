use anyhow::{bail, Context, Result};
use cdp_core::{SiteExclusions, THETA_HIGH};
use rayon::prelude::*;
use std::path::Path;

use crate::commands::util::load_input;
use cdp_cli::CdpConfig;

/// Check region data (and optionally site coordinates) without solving.
///
/// Every region is checked; the command fails if any was rejected.
pub fn handle(input: &Path, sites: bool, config: Option<&Path>) -> Result<()> {
    let config = CdpConfig::load_optional(config)?;
    let params = &config.parameters;
    params.validate().context("invalid planning parameters")?;

    let loaded = load_input(input, true)?;
    let store = &loaded.store;

    let high_need = store
        .iter()
        .filter(|r| r.theta(&params.demand) == THETA_HIGH)
        .count();
    let zero_capacity = store
        .iter()
        .flat_map(|r| r.facilities.values())
        .filter(|f| f.capacity().total == 0)
        .count();

    println!("Region summary:");
    println!("  Regions: {}", store.len());
    println!("  High-need regions (theta = {THETA_HIGH}): {high_need}");
    println!("  Facilities: {}", store.facility_count());
    println!("  Candidate sites: {}", store.candidate_site_count());
    if zero_capacity > 0 {
        println!("  Warning: {zero_capacity} facilities have zero capacity (rejected by the tiered formulation)");
    }

    let mut site_errors = Vec::new();
    if sites {
        let regions: Vec<_> = store.iter().collect();
        let exclusions: Vec<_> = regions
            .par_iter()
            .map(|r| SiteExclusions::for_region(r, params.min_separation_miles))
            .collect();

        let (mut pairs, mut suppressed) = (0, 0);
        for result in exclusions {
            match result {
                Ok(ex) => {
                    pairs += ex.pairs.len();
                    suppressed += ex.suppressed_count();
                }
                Err(err) => site_errors.push(err),
            }
        }
        println!("  Exclusive site pairs: {pairs}");
        println!("  Sites suppressed by existing facilities: {suppressed}");
        for err in &site_errors {
            println!("  Error: {err}");
        }
    }

    if loaded.skipped() > 0 || !site_errors.is_empty() {
        bail!(
            "{} invalid regions, {} regions not ready for site-level planning",
            loaded.skipped(),
            site_errors.len()
        );
    }
    println!("Region data is valid");
    Ok(())
}
