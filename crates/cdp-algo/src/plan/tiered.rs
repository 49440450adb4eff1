//! Formulation B: tiered expansion pricing, with new builds either aggregated
//! per region or placed on candidate sites.
//!
//! Expansion is split as `x_f = t1_f + t2_f + t3_f`. Tier `k` holds at most
//! `fraction_k · total_f` slots and costs `base_k + fixed_fee / total_f` per
//! slot, so larger facilities pay less per slot. There is no trigger variable.

use super::builder::{
    add_coverage_constraints, add_shared_costs, aggregate_builds, sited_builds, CostTerms,
    FacilityVars, PlanOptions, RegionVars,
};
use super::model::MilpModel;
use super::solver::PlanModel;
use super::PlanError;
use cdp_core::{expansion_cap, tier_caps, CdpResult, PlanParameters, RegionStore, SiteExclusions};
use good_lp::{constraint, Expression};
use rayon::prelude::*;
use tracing::{debug, info};

/// Build Formulation B over every region in the store.
///
/// Tier prices and (when siting) site exclusions are computed for all regions
/// before the first variable is declared, so a zero-capacity facility or a
/// facility without coordinates fails the whole build up front.
pub fn build_tiered_model(
    store: &RegionStore,
    params: &PlanParameters,
    site_selection: bool,
) -> Result<PlanModel, PlanError> {
    params.validate()?;

    let regions_in: Vec<_> = store.iter().collect();

    let rates = regions_in
        .iter()
        .map(|region| {
            region
                .facilities
                .values()
                .map(|f| {
                    params.tier_rates(f.total_capacity).map_err(|e| {
                        PlanError::Configuration(format!(
                            "facility {} in region {}: {e}",
                            f.id, region.key
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let exclusions: Option<Vec<SiteExclusions>> = if site_selection {
        let threshold = params.min_separation_miles;
        let computed = regions_in
            .par_iter()
            .map(|region| SiteExclusions::for_region(region, threshold))
            .collect::<CdpResult<Vec<_>>>()?;
        Some(computed)
    } else {
        None
    };

    let name = if site_selection {
        "capacity-plan-tiered-sited"
    } else {
        "capacity-plan-tiered"
    };
    let mut model = MilpModel::new(name);
    let mut costs = CostTerms::new();
    let mut regions = Vec::with_capacity(regions_in.len());

    for (pos, region) in regions_in.iter().enumerate() {
        let builds = match &exclusions {
            Some(all) => sited_builds(&mut model, region, params, &all[pos]),
            None => aggregate_builds(&mut model, params),
        };
        let mut rv = RegionVars::new(region, params, builds);

        for (facility, rate) in region.facilities.values().zip(&rates[pos]) {
            let baseline = facility.capacity();
            let cap = expansion_cap(baseline.total, params);
            let limits = tier_caps(baseline.total, params);

            let x = model.add_integer_var(0.0, Some(cap as f64));
            let u = model.add_integer_var(0.0, Some(cap as f64));
            let tiers = limits.map(|limit| model.add_integer_var(0.0, Some(limit as f64)));

            let split: Expression = tiers.iter().copied().sum();
            model.add_constraint(constraint!(x == split));
            model.add_constraint(constraint!(u <= x));

            for (t, r) in tiers.iter().zip(rate) {
                costs.expansion += *r * *t;
            }

            rv.facilities.push(FacilityVars {
                id: facility.id.clone(),
                baseline,
                expansion_cap: cap,
                expand: x,
                expand_under5: u,
                trigger: None,
                tiers: Some((tiers, *rate)),
            });
        }

        add_coverage_constraints(&mut model, &rv, params);
        add_shared_costs(&mut costs, &rv, params);
        debug!(
            region = %rv.key,
            theta = rv.theta,
            facilities = rv.facilities.len(),
            candidate_sites = region.candidate_sites.len(),
            "region constraints added"
        );
        regions.push(rv);
    }

    model.set_objective(costs.into_objective());
    info!(
        regions = regions.len(),
        vars = model.num_vars(),
        constraints = model.num_constraints(),
        site_selection,
        "tiered formulation built"
    );

    let options = PlanOptions::tiered().with_site_selection(site_selection);
    Ok(PlanModel::new(options, params.clone(), model, regions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_core::{Coordinates, Facility, FacilityId, Region, RegionKey};

    fn store_with(region: Region) -> RegionStore {
        let mut store = RegionStore::new();
        store.insert(region).unwrap();
        store
    }

    #[test]
    fn test_zero_capacity_facility_is_configuration_error() {
        let mut region = Region::new(RegionKey::new("1"), 100.0, 30.0, 70_000.0, 0.5);
        region.add_facility(Facility::new(FacilityId::new("empty"), 0, 0, 0, 0));
        let err = build_tiered_model(&store_with(region), &PlanParameters::default(), false)
            .err()
            .unwrap();
        assert!(matches!(err, PlanError::Configuration(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_siting_requires_facility_coordinates() {
        let mut region = Region::new(RegionKey::new("1"), 100.0, 30.0, 70_000.0, 0.5);
        region.add_facility(Facility::new(FacilityId::new("A"), 100, 10, 10, 10));
        region.add_candidate_site(Coordinates::new(40.0, -75.0));
        let store = store_with(region);

        let err = build_tiered_model(&store, &PlanParameters::default(), true)
            .err()
            .unwrap();
        assert!(matches!(err, PlanError::Data { .. }));

        // aggregate mode never looks at coordinates
        assert!(build_tiered_model(&store, &PlanParameters::default(), false).is_ok());
    }

    #[test]
    fn test_model_size_aggregate() {
        let mut region = Region::new(RegionKey::new("1"), 1000.0, 300.0, 70_000.0, 0.5);
        region.add_facility(Facility::new(FacilityId::new("A"), 100, 10, 10, 20));
        let plan = build_tiered_model(&store_with(region), &PlanParameters::default(), false).unwrap();
        // 3 types × (y, v) + (x, u, t1, t2, t3)
        assert_eq!(plan.num_vars(), 11);
        // 3 × (v ≤ Cap05·y) + split + (u ≤ x) + 2 coverage
        assert_eq!(plan.num_constraints(), 7);
    }
}
