//! Formulation A: flat expansion pricing with a baseline fee trigger and
//! aggregate new builds.
//!
//! ## Big-M derivation
//!
//! The trigger must satisfy `z_f = 1 ⇔ x_f > total_f` through
//!
//! ```text
//! x_f - total_f ≤  M·z_f
//! x_f - total_f ≥ -M·(1 - z_f)
//! ```
//!
//! `x_f - total_f` ranges over `[-total_f, cap_f]`, so the smallest `M` that
//! leaves both branches feasible is `max(cap_f, total_f)`. We use
//! `M = cap_f + total_f`, which bounds that from above for every facility and
//! never cuts off a feasible expansion.

use super::builder::{
    add_coverage_constraints, add_shared_costs, aggregate_builds, CostTerms, FacilityVars,
    PlanOptions, RegionVars,
};
use super::model::MilpModel;
use super::solver::PlanModel;
use super::PlanError;
use cdp_core::{expansion_cap, PlanParameters, RegionStore};
use good_lp::constraint;
use tracing::{debug, info};

/// Build Formulation A over every region in the store.
pub fn build_flat_model(store: &RegionStore, params: &PlanParameters) -> Result<PlanModel, PlanError> {
    params.validate()?;

    let mut model = MilpModel::new("capacity-plan-flat");
    let mut costs = CostTerms::new();
    let mut regions = Vec::with_capacity(store.len());

    for region in store.iter() {
        let builds = aggregate_builds(&mut model, params);
        let mut rv = RegionVars::new(region, params, builds);

        for facility in region.facilities.values() {
            let baseline = facility.capacity();
            let cap = expansion_cap(baseline.total, params);
            let total = baseline.total as f64;
            let big_m = cap as f64 + total;

            let x = model.add_integer_var(0.0, Some(cap as f64));
            let u = model.add_integer_var(0.0, Some(cap as f64));
            let z = model.add_binary_var();

            model.add_constraint(constraint!(u <= x));
            model.add_constraint(constraint!(x - total <= big_m * z));
            model.add_constraint(constraint!(x - total >= big_m * z - big_m));

            let trigger_cost = params.fixed_fee + params.per_slot_fee * total;
            costs.expansion += trigger_cost * z + params.alpha * x;

            rv.facilities.push(FacilityVars {
                id: facility.id.clone(),
                baseline,
                expansion_cap: cap,
                expand: x,
                expand_under5: u,
                trigger: Some(z),
                tiers: None,
            });
        }

        add_coverage_constraints(&mut model, &rv, params);
        add_shared_costs(&mut costs, &rv, params);
        debug!(
            region = %rv.key,
            theta = rv.theta,
            facilities = rv.facilities.len(),
            coverage_target = rv.coverage_target,
            under5_target = rv.under5_target,
            "region constraints added"
        );
        regions.push(rv);
    }

    model.set_objective(costs.into_objective());
    info!(
        regions = regions.len(),
        vars = model.num_vars(),
        constraints = model.num_constraints(),
        "flat formulation built"
    );

    Ok(PlanModel::new(PlanOptions::flat(), params.clone(), model, regions))
}
