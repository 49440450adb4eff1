//! Pieces shared by both formulations: variable layout, new-build variables,
//! coverage constraints and the cost terms that do not depend on how existing
//! facilities are priced.

use super::model::MilpModel;
use cdp_core::{
    Capacity, Coordinates, FacilityId, FacilityType, PlanParameters, Region, RegionKey,
    SiteExclusions, SiteIndex,
};
use good_lp::{constraint, Expression, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Which cost structure prices expansion of existing facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formulation {
    /// Per-slot expansion cost plus a one-time fee behind a binary trigger
    Flat,
    /// Three capacity tiers with decreasing-with-size marginal rates
    Tiered,
}

impl fmt::Display for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Formulation::Flat => "flat",
            Formulation::Tiered => "tiered",
        })
    }
}

impl std::str::FromStr for Formulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Formulation::Flat),
            "tiered" => Ok(Formulation::Tiered),
            other => Err(format!("unknown formulation '{other}' (expected flat or tiered)")),
        }
    }
}

/// What to build and solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub formulation: Formulation,
    /// Place new facilities on specific candidate sites (tiered only)
    pub site_selection: bool,
}

impl PlanOptions {
    pub fn flat() -> Self {
        Self {
            formulation: Formulation::Flat,
            site_selection: false,
        }
    }

    pub fn tiered() -> Self {
        Self {
            formulation: Formulation::Tiered,
            site_selection: false,
        }
    }

    pub fn with_site_selection(mut self, enabled: bool) -> Self {
        self.site_selection = enabled;
        self
    }
}

/// Variables owned by one existing facility.
#[derive(Debug, Clone)]
pub(crate) struct FacilityVars {
    pub id: FacilityId,
    pub baseline: Capacity,
    pub expansion_cap: u32,
    /// x_f: total slots added
    pub expand: Variable,
    /// u_f: under-5 slots within the expansion
    pub expand_under5: Variable,
    /// z_f: baseline fee trigger (flat only)
    pub trigger: Option<Variable>,
    /// t1_f, t2_f, t3_f and their per-slot rates (tiered only)
    pub tiers: Option<([Variable; 3], [f64; 3])>,
}

/// New-build variables of one facility type in one region (or on one site).
#[derive(Debug, Clone, Copy)]
pub(crate) struct TypeVars {
    /// y: number of facilities (a 0/1 indicator on a site)
    pub count: Variable,
    /// v: under-5 slots assigned across those facilities
    pub under5: Variable,
}

#[derive(Debug, Clone)]
pub(crate) struct SiteVars {
    pub index: SiteIndex,
    pub location: Coordinates,
    pub suppressed: bool,
    /// `None` when the site is suppressed and carries no variables
    pub types: Option<[TypeVars; FacilityType::COUNT]>,
}

#[derive(Debug, Clone)]
pub(crate) enum BuildVars {
    /// y_{i,s}, v_{i,s} as free integer counts
    Aggregate([TypeVars; FacilityType::COUNT]),
    /// y_{i,s} = Σ_l y_site[i,l,s]
    Sited(Vec<SiteVars>),
}

impl BuildVars {
    /// Σ over the region of the build count for one type.
    pub fn count_expr(&self, ty: FacilityType) -> Expression {
        match self {
            BuildVars::Aggregate(types) => Expression::from(types[ty.index()].count),
            BuildVars::Sited(sites) => sites
                .iter()
                .filter_map(|s| s.types.as_ref())
                .map(|t| t[ty.index()].count)
                .sum(),
        }
    }

    pub fn under5_expr(&self, ty: FacilityType) -> Expression {
        match self {
            BuildVars::Aggregate(types) => Expression::from(types[ty.index()].under5),
            BuildVars::Sited(sites) => sites
                .iter()
                .filter_map(|s| s.types.as_ref())
                .map(|t| t[ty.index()].under5)
                .sum(),
        }
    }
}

/// Everything the interpreter needs to map values back onto one region.
#[derive(Debug, Clone)]
pub(crate) struct RegionVars {
    pub key: RegionKey,
    pub theta: f64,
    pub population_0_12: f64,
    pub population_0_5: f64,
    pub existing: Capacity,
    pub coverage_target: f64,
    pub under5_target: f64,
    pub facilities: Vec<FacilityVars>,
    pub builds: BuildVars,
}

impl RegionVars {
    pub fn new(region: &Region, params: &PlanParameters, builds: BuildVars) -> Self {
        Self {
            key: region.key.clone(),
            theta: region.theta(&params.demand),
            population_0_12: region.population_0_12,
            population_0_5: region.population_0_5,
            existing: region.existing_capacity(),
            coverage_target: region.coverage_target(&params.demand),
            under5_target: region.under5_target(params.under5_coverage),
            facilities: Vec::with_capacity(region.facilities.len()),
            builds,
        }
    }
}

/// Cost expressions kept apart so the objective can be reported by category.
pub(crate) struct CostTerms {
    pub expansion: Expression,
    pub new_build: Expression,
    pub equipment: Expression,
}

impl CostTerms {
    pub fn new() -> Self {
        Self {
            expansion: Expression::from(0.0),
            new_build: Expression::from(0.0),
            equipment: Expression::from(0.0),
        }
    }

    pub fn into_objective(self) -> Expression {
        self.expansion + self.new_build + self.equipment
    }
}

/// Free integer build counts per type with `v ≤ Cap05_s · y`.
pub(crate) fn aggregate_builds(model: &mut MilpModel, params: &PlanParameters) -> BuildVars {
    let types = FacilityType::ALL.map(|ty| {
        let cap05 = params.type_spec(ty).capacity_under5 as f64;
        let count = model.add_integer_var(0.0, None);
        let under5 = model.add_integer_var(0.0, None);
        model.add_constraint(constraint!(under5 <= cap05 * count));
        TypeVars { count, under5 }
    });
    BuildVars::Aggregate(types)
}

/// Per-site build indicators with at most one type per site, the separation
/// exclusions between sites, and no variables on sites next to an existing
/// facility.
pub(crate) fn sited_builds(
    model: &mut MilpModel,
    region: &Region,
    params: &PlanParameters,
    exclusions: &SiteExclusions,
) -> BuildVars {
    let mut sites = Vec::with_capacity(region.candidate_sites.len());

    for site in &region.candidate_sites {
        let suppressed = exclusions.is_suppressed(site.index);
        let types = if suppressed {
            None
        } else {
            let types = FacilityType::ALL.map(|ty| {
                let cap05 = params.type_spec(ty).capacity_under5 as f64;
                let count = model.add_binary_var();
                let under5 = model.add_integer_var(0.0, Some(cap05));
                model.add_constraint(constraint!(under5 <= cap05 * count));
                TypeVars { count, under5 }
            });
            let built: Expression = types.iter().map(|t| t.count).sum();
            model.add_constraint(constraint!(built <= 1.0));
            Some(types)
        };
        sites.push(SiteVars {
            index: site.index,
            location: site.location,
            suppressed,
            types,
        });
    }

    let site_built = |sites: &[SiteVars], idx: SiteIndex| -> Option<Expression> {
        sites[idx.value()]
            .types
            .as_ref()
            .map(|t| t.iter().map(|tv| tv.count).sum::<Expression>())
    };
    let mut active_pairs = 0usize;
    for (a, b) in &exclusions.pairs {
        if let (Some(ea), Some(eb)) = (site_built(&sites, *a), site_built(&sites, *b)) {
            model.add_constraint(constraint!(ea + eb <= 1.0));
            active_pairs += 1;
        }
    }

    if exclusions.suppressed_count() > 0 {
        warn!(
            region = %region.key,
            suppressed = exclusions.suppressed_count(),
            "candidate sites next to existing facilities are not eligible"
        );
    }
    debug!(
        region = %region.key,
        sites = sites.len(),
        exclusion_pairs = active_pairs,
        "site-level build variables"
    );

    BuildVars::Sited(sites)
}

/// All-ages and under-5 coverage constraints for one region.
pub(crate) fn add_coverage_constraints(
    model: &mut MilpModel,
    region: &RegionVars,
    params: &PlanParameters,
) {
    let mut total = Expression::from(region.existing.total as f64);
    let mut under5 = Expression::from(region.existing.under5 as f64);
    for f in &region.facilities {
        total += f.expand;
        under5 += f.expand_under5;
    }
    for ty in FacilityType::ALL {
        let cap = params.type_spec(ty).capacity_total as f64;
        total += cap * region.builds.count_expr(ty);
        under5 += region.builds.under5_expr(ty);
    }

    let coverage_target = region.coverage_target;
    let under5_target = region.under5_target;
    model.add_constraint(constraint!(total >= coverage_target));
    model.add_constraint(constraint!(under5 >= under5_target));
}

/// Construction and equipment costs that both formulations share.
pub(crate) fn add_shared_costs(costs: &mut CostTerms, region: &RegionVars, params: &PlanParameters) {
    for ty in FacilityType::ALL {
        let unit_cost = params.type_spec(ty).unit_cost;
        costs.new_build += unit_cost * region.builds.count_expr(ty);
        costs.equipment += params.beta * region.builds.under5_expr(ty);
    }
    for f in &region.facilities {
        costs.equipment += params.beta * f.expand_under5;
    }
}
