use anyhow::{Context, Result};
use cdp_io::{load_regions, LoadPolicy, LoadedRegions};
use rayon::ThreadPoolBuilder;
use std::path::Path;
use tracing::debug;

/// Size the global rayon pool from `--threads` (`auto` or a positive count).
pub fn configure_threads(spec: &str) -> Result<usize> {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .with_context(|| format!("invalid thread count '{spec}' (expected N or auto)"))?
    };
    // build_global only succeeds once per process
    if ThreadPoolBuilder::new().num_threads(count).build_global().is_err() {
        debug!("global thread pool already initialized");
    }
    Ok(count)
}

pub fn load_policy(skip_incomplete: bool) -> LoadPolicy {
    if skip_incomplete {
        LoadPolicy::SkipIncomplete
    } else {
        LoadPolicy::Strict
    }
}

/// Load region data and print one line per skipped region.
pub fn load_input(path: &Path, skip_incomplete: bool) -> Result<LoadedRegions> {
    let loaded = load_regions(path, load_policy(skip_incomplete))?;
    println!(
        "Loaded {} regions ({} facilities, {} candidate sites) from {}",
        loaded.store.len(),
        loaded.store.facility_count(),
        loaded.store.candidate_site_count(),
        path.display()
    );
    if loaded.skipped() > 0 {
        println!("Skipped {} invalid regions:", loaded.skipped());
        for issue in loaded.diagnostics.errors() {
            println!("  {issue}");
        }
    }
    Ok(loaded)
}
