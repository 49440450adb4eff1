//! Map solved variable values back onto facilities, regions and sites.

use super::builder::{BuildVars, RegionVars};
use super::model::SolvedModel;
use super::solution::{
    CostBreakdown, FacilityExpansion, NewBuild, PlanSolution, RegionCoverage, SiteDecision,
};
use super::PlanOptions;
use cdp_core::{FacilityType, PlanParameters};

/// Read every decision, rounded to the nearest integer, into plan records.
pub(crate) fn interpret(
    options: PlanOptions,
    params: &PlanParameters,
    regions: &[RegionVars],
    solved: &SolvedModel,
) -> PlanSolution {
    let mut costs = CostBreakdown::default();
    let mut expansions = Vec::new();
    let mut builds = Vec::with_capacity(regions.len() * FacilityType::COUNT);
    let mut sites = Vec::new();
    let mut coverage = Vec::with_capacity(regions.len());

    for region in regions {
        let mut expansion_slots = 0u64;
        let mut expansion_under5 = 0u64;

        for f in &region.facilities {
            let x = solved.count(f.expand);
            let u = solved.count(f.expand_under5);
            let triggered = f.trigger.map(|z| solved.flag(z));
            let tier_slots = f.tiers.as_ref().map(|(vars, _)| vars.map(|t| solved.count(t)));

            let expansion_cost: f64 = match (&f.tiers, triggered) {
                (Some((_, rates)), _) => tier_slots
                    .unwrap_or_default()
                    .iter()
                    .zip(rates)
                    .map(|(slots, rate)| *slots as f64 * rate)
                    .sum(),
                (None, Some(true)) => {
                    params.fixed_fee
                        + params.per_slot_fee * f.baseline.total as f64
                        + params.alpha * x as f64
                }
                (None, _) => params.alpha * x as f64,
            };
            costs.expansion += expansion_cost;
            costs.equipment += params.beta * u as f64;
            expansion_slots += u64::from(x);
            expansion_under5 += u64::from(u);

            expansions.push(FacilityExpansion {
                region: region.key.clone(),
                facility_id: f.id.clone(),
                existing_total: f.baseline.total,
                existing_under5: f.baseline.under5,
                expansion_cap: f.expansion_cap,
                expand_slots: x,
                expand_under5_slots: u,
                triggered_baseline: triggered,
                tier_slots,
                expansion_cost,
            });
        }

        let mut counts = [0u32; FacilityType::COUNT];
        let mut under5 = [0u32; FacilityType::COUNT];
        match &region.builds {
            BuildVars::Aggregate(types) => {
                for ty in FacilityType::ALL {
                    counts[ty.index()] = solved.count(types[ty.index()].count);
                    under5[ty.index()] = solved.count(types[ty.index()].under5);
                }
            }
            BuildVars::Sited(site_vars) => {
                for site in site_vars {
                    let mut built = None;
                    let mut site_under5 = 0;
                    if let Some(types) = &site.types {
                        for ty in FacilityType::ALL {
                            let tv = &types[ty.index()];
                            let v = solved.count(tv.under5);
                            under5[ty.index()] = under5[ty.index()].saturating_add(v);
                            if solved.flag(tv.count) {
                                counts[ty.index()] += 1;
                                built = Some(ty);
                                site_under5 += v;
                            }
                        }
                    }
                    sites.push(SiteDecision {
                        region: region.key.clone(),
                        site: site.index,
                        location: site.location,
                        suppressed: site.suppressed,
                        built,
                        under5_slots: site_under5,
                    });
                }
            }
        }

        let mut built_slots = 0u64;
        let mut built_under5 = 0u64;
        for ty in FacilityType::ALL {
            let spec = params.type_spec(ty);
            let count = counts[ty.index()];
            let v = under5[ty.index()];
            costs.new_build += count as f64 * spec.unit_cost;
            costs.equipment += params.beta * v as f64;
            built_slots += u64::from(count) * u64::from(spec.capacity_total);
            built_under5 += u64::from(v);

            builds.push(NewBuild {
                region: region.key.clone(),
                facility_type: ty,
                build_count: count,
                under5_slots: v,
                capacity_per_facility: spec.capacity_total,
                under5_capacity_per_facility: spec.capacity_under5,
                cost_per_facility: spec.unit_cost,
            });
        }

        coverage.push(RegionCoverage {
            region: region.key.clone(),
            theta: region.theta,
            population_0_12: region.population_0_12,
            population_0_5: region.population_0_5,
            existing_slots: u64::from(region.existing.total),
            existing_under5_slots: u64::from(region.existing.under5),
            expansion_slots,
            expansion_under5_slots: expansion_under5,
            built_slots,
            built_under5_slots: built_under5,
            coverage_target: region.coverage_target,
            under5_target: region.under5_target,
        });
    }

    PlanSolution {
        formulation: options.formulation,
        site_selection: options.site_selection,
        status: solved.status(),
        objective_value: solved.objective_value(),
        costs,
        expansions,
        builds,
        sites,
        coverage,
        solve_time: solved.solve_time(),
    }
}
