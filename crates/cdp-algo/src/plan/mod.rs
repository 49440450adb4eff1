//! Childcare Capacity Expansion Planning
//!
//! Mixed-integer models that decide how far to expand existing facilities and
//! how many new facilities to build so every region meets its coverage targets
//! at minimum cost.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CAPACITY EXPANSION PLANNING                                             │
//! │  ───────────────────────────                                             │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Regions with child population, income and employment               │
//! │    • Existing facilities with capacity split by age band                │
//! │    • Three new-build sizes (S/M/L) with fixed capacity and price        │
//! │    • Optionally, candidate sites with coordinates                       │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Slots added per facility (integer), and how many are under-5       │
//! │    • New facilities per region and type, or per candidate site          │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Expansion cost + construction cost + under-5 equipment cost          │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Total slots ≥ theta · population 0-12, per region                  │
//! │    • Under-5 slots ≥ 2/3 · population 0-5, per region                   │
//! │    • Expansion ≤ min(20% of baseline, 500) per facility                 │
//! │    • At most one of any two sites closer than 0.06 mi (siting)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Formulations
//!
//! ```text
//! flat:    min Σ_f [(F + p·cap_f)·z_f + α·x_f] + Σ_{i,s} c_s·y_is + β(Σ_f u_f + Σ_{i,s} v_is)
//!            x_f - cap_f ≤ M·z_f,  x_f - cap_f ≥ -M(1 - z_f)        Big-M trigger
//!
//! tiered:  min Σ_f Σ_k r_k(f)·t_kf + Σ_{i,s} c_s·y_is + β(Σ_f u_f + Σ_{i,s} v_is)
//!            x_f = t1_f + t2_f + t3_f,  t_kf ≤ frac_k · cap_f        Tier split
//!            r_k(f) = base_k + F / cap_f
//!
//! both:      u_f ≤ x_f,  v_is ≤ cap05_s · y_is                       Consistency
//! ```
//!
//! With site selection (tiered only) `y_is` becomes `Σ_l y_site[i,l,s]` over
//! binary indicators with at most one type per site.

mod builder;
mod error;
mod flat;
mod interpret;
mod model;
mod solution;
mod solver;
mod tiered;

pub use builder::{Formulation, PlanOptions};
pub use error::PlanError;
pub use flat::build_flat_model;
pub use model::{MilpBackend, MilpModel, SolveStatus, SolvedModel, SolverConfig, ValueSource};
pub use solution::{
    CostBreakdown, FacilityExpansion, NewBuild, PlanSolution, RegionCoverage, SiteDecision,
};
pub use solver::{build_plan_model, solve_formulations, solve_plan, PlanModel};
pub use tiered::build_tiered_model;
