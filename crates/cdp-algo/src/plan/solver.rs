//! Plan construction and solve entry points.

use super::builder::{Formulation, PlanOptions, RegionVars};
use super::flat::build_flat_model;
use super::interpret::interpret;
use super::model::{MilpModel, SolverConfig};
use super::solution::PlanSolution;
use super::tiered::build_tiered_model;
use super::PlanError;
use cdp_core::{PlanParameters, RegionStore};
use tracing::{info, warn};

/// A fully built model together with the variable layout needed to read it back.
pub struct PlanModel {
    options: PlanOptions,
    params: PlanParameters,
    model: MilpModel,
    regions: Vec<RegionVars>,
}

impl PlanModel {
    pub(crate) fn new(
        options: PlanOptions,
        params: PlanParameters,
        model: MilpModel,
        regions: Vec<RegionVars>,
    ) -> Self {
        Self {
            options,
            params,
            model,
            regions,
        }
    }

    pub fn options(&self) -> PlanOptions {
        self.options
    }

    pub fn num_vars(&self) -> usize {
        self.model.num_vars()
    }

    pub fn num_constraints(&self) -> usize {
        self.model.num_constraints()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Solve and interpret. The model is consumed; its variables do not outlive
    /// this call.
    pub fn solve(self, config: &SolverConfig) -> Result<PlanSolution, PlanError> {
        let PlanModel {
            options,
            params,
            model,
            regions,
        } = self;

        let solved = model.solve(config)?;
        let solution = interpret(options, &params, &regions, &solved);

        if !solution.is_optimal() {
            warn!(
                formulation = %options.formulation,
                status = %solution.status,
                "solution is not proven optimal"
            );
        }
        Ok(solution)
    }
}

/// Build the model described by `options` without solving it.
pub fn build_plan_model(
    store: &RegionStore,
    params: &PlanParameters,
    options: PlanOptions,
) -> Result<PlanModel, PlanError> {
    match (options.formulation, options.site_selection) {
        (Formulation::Flat, false) => build_flat_model(store, params),
        (Formulation::Flat, true) => Err(PlanError::Configuration(
            "site-level planning is only available with the tiered formulation".into(),
        )),
        (Formulation::Tiered, sited) => build_tiered_model(store, params, sited),
    }
}

/// Build and solve one formulation.
pub fn solve_plan(
    store: &RegionStore,
    params: &PlanParameters,
    options: PlanOptions,
    config: &SolverConfig,
) -> Result<PlanSolution, PlanError> {
    info!(
        formulation = %options.formulation,
        site_selection = options.site_selection,
        regions = store.len(),
        facilities = store.facility_count(),
        "planning capacity"
    );
    build_plan_model(store, params, options)?.solve(config)
}

/// Solve the flat and tiered formulations side by side.
///
/// The two models share no state; each owns its own variables and backend
/// instance.
pub fn solve_formulations(
    store: &RegionStore,
    params: &PlanParameters,
    site_selection: bool,
    config: &SolverConfig,
) -> (
    Result<PlanSolution, PlanError>,
    Result<PlanSolution, PlanError>,
) {
    rayon::join(
        || solve_plan(store, params, PlanOptions::flat(), config),
        || {
            solve_plan(
                store,
                params,
                PlanOptions::tiered().with_site_selection(site_selection),
                config,
            )
        },
    )
}
