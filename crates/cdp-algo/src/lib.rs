//! # cdp-algo: Capacity Planning Models
//!
//! Builds and solves the mixed-integer models behind childcare capacity
//! planning, then turns the solved values into facility, region and site
//! records.
//!
//! | Formulation | Expansion pricing | New builds |
//! |-------------|-------------------|------------|
//! | [`Formulation::Flat`] | `α` per slot plus a fee behind a binary trigger | counts per region and type |
//! | [`Formulation::Tiered`] | three tiers, cheaper per slot for larger facilities | counts per region, or indicators per candidate site |
//!
//! ## Solver backends
//!
//! Models go through [`good_lp`]. The `solver-microlp` feature (default) uses
//! the pure-Rust `microlp` branch and bound; `solver-highs` adds HiGHS, which
//! also honours [`SolverConfig::time_limit_seconds`].
//!
//! ## Example
//!
//! ```ignore
//! use cdp_algo::{solve_plan, PlanOptions, SolverConfig};
//! use cdp_core::{PlanParameters, RegionStore};
//!
//! let store: RegionStore = load_regions()?;
//! let solution = solve_plan(
//!     &store,
//!     &PlanParameters::default(),
//!     PlanOptions::tiered().with_site_selection(true),
//!     &SolverConfig::default(),
//! )?;
//! println!("{}", solution.summary());
//! ```

#[cfg(not(any(feature = "solver-microlp", feature = "solver-highs")))]
compile_error!("cdp-algo needs at least one MILP backend: enable `solver-microlp` or `solver-highs`");

pub mod plan;

pub use plan::{
    build_flat_model, build_plan_model, build_tiered_model, solve_formulations, solve_plan,
    CostBreakdown, FacilityExpansion, Formulation, MilpBackend, NewBuild, PlanError, PlanModel,
    PlanOptions, PlanSolution, RegionCoverage, SiteDecision, SolveStatus, SolverConfig,
};
