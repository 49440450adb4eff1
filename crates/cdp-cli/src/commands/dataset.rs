use anyhow::{Context, Result};
use cdp_io::{assemble_regions, write_region_map, SourceFiles, MISSING_SENTINEL};
use tracing::warn;

use cdp_cli::cli::DatasetCommands;

pub fn handle(command: &DatasetCommands) -> Result<()> {
    match command {
        DatasetCommands::Build {
            income,
            employment,
            population,
            childcare,
            locations,
            out,
        } => {
            let files = SourceFiles {
                income: income.clone(),
                employment: employment.clone(),
                population: population.clone(),
                childcare: childcare.clone(),
                locations: locations.clone(),
            };
            let assembly = assemble_regions(&files).context("assembling region data")?;
            for issue in &assembly.diagnostics.issues {
                warn!("{issue}");
            }

            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            write_region_map(&assembly.regions, out)?;

            let incomplete = assembly
                .regions
                .values()
                .filter(|r| {
                    [
                        r.population0_12,
                        r.population0_5,
                        r.avg_individual_income,
                        r.employment_rate,
                    ]
                    .contains(&Some(MISSING_SENTINEL))
                })
                .count();
            let facilities: usize = assembly
                .regions
                .values()
                .filter_map(|r| r.childcare_dict.as_ref())
                .map(|d| d.len())
                .sum();

            println!("Region dataset written to {}", out.display());
            println!("  Regions: {}", assembly.regions.len());
            println!("  Facilities: {facilities}");
            println!("  Regions with missing data: {incomplete}");
            println!("  Source warnings: {}", assembly.diagnostics.warning_count());
            Ok(())
        }
    }
}
