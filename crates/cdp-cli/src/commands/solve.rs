//! `cdp solve`: load regions, build and solve one or both formulations, write the plan.

use anyhow::{bail, Context, Result};
use cdp_algo::{solve_formulations, solve_plan, Formulation, PlanOptions, PlanSolution};
use cdp_io::write_plan;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::commands::util::{configure_threads, load_input};
use cdp_cli::{CdpConfig, FormulationArg};

pub struct SolveArgs<'a> {
    pub input: &'a Path,
    pub out: &'a Path,
    pub formulation: FormulationArg,
    pub sites: bool,
    pub time_limit: Option<f64>,
    pub config: Option<&'a Path>,
    pub skip_incomplete: bool,
    pub accept_suboptimal: bool,
    pub threads: &'a str,
}

pub fn handle(args: SolveArgs<'_>) -> Result<()> {
    let threads = configure_threads(args.threads)?;
    info!(threads, "thread pool configured");

    let mut config = CdpConfig::load_optional(args.config)?;
    if let Some(secs) = args.time_limit {
        config.solver.time_limit_seconds = Some(secs);
    }

    let loaded = load_input(args.input, args.skip_incomplete)?;
    let store = &loaded.store;

    // Every formulation is solved before anything is written, so a failure
    // leaves no partial plan behind.
    let solutions: Vec<(PlanSolution, PathBuf)> = match args.formulation {
        FormulationArg::Both => {
            let (flat, tiered) =
                solve_formulations(store, &config.parameters, args.sites, &config.solver);
            let flat = flat.context("solving flat formulation")?;
            let tiered = tiered.context("solving tiered formulation")?;
            vec![
                (flat, args.out.join(Formulation::Flat.to_string())),
                (tiered, args.out.join(Formulation::Tiered.to_string())),
            ]
        }
        single => {
            let options = match single {
                FormulationArg::Flat => PlanOptions::flat(),
                _ => PlanOptions::tiered(),
            }
            .with_site_selection(args.sites);
            let solution = solve_plan(store, &config.parameters, options, &config.solver)
                .with_context(|| format!("solving {} formulation", options.formulation))?;
            vec![(solution, args.out.to_path_buf())]
        }
    };

    for (solution, dir) in &solutions {
        write_plan(solution, dir)?;
        println!("\n{}", solution.summary());
        println!("Results written to {}", dir.display());
    }

    check_optimality(solutions.iter().map(|(s, _)| s), args.accept_suboptimal)
}

/// Fails when any plan stopped short of optimality, unless that was accepted.
fn check_optimality<'a>(
    solutions: impl IntoIterator<Item = &'a PlanSolution>,
    accept_suboptimal: bool,
) -> Result<()> {
    let not_optimal: Vec<String> = solutions
        .into_iter()
        .filter(|s| !s.is_optimal())
        .map(|s| format!("{} ({})", s.formulation, s.status))
        .collect();
    if not_optimal.is_empty() {
        return Ok(());
    }

    let list = not_optimal.join(", ");
    if accept_suboptimal {
        warn!(plans = %list, "accepting plan that is not proven optimal");
        Ok(())
    } else {
        bail!("plan not proven optimal: {list} (rerun with --accept-suboptimal to accept)")
    }
}
