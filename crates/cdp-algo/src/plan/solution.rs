//! Plan solution data structures
//!
//! Records are emitted for every facility, every region×type pair and every
//! candidate site, including the ones where nothing happens.

use super::builder::Formulation;
use super::model::SolveStatus;
use cdp_core::{Coordinates, FacilityId, FacilityType, RegionKey, SiteIndex};
use serde::Serialize;
use std::time::Duration;

/// What happens to one existing facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityExpansion {
    pub region: RegionKey,
    pub facility_id: FacilityId,
    pub existing_total: u32,
    pub existing_under5: u32,
    /// Upper bound on `expand_slots`
    pub expansion_cap: u32,
    pub expand_slots: u32,
    pub expand_under5_slots: u32,
    /// Whether the baseline fee was charged (flat formulation only)
    pub triggered_baseline: Option<bool>,
    /// Slots per cost tier (tiered formulation only)
    pub tier_slots: Option<[u32; 3]>,
    pub expansion_cost: f64,
}

impl FacilityExpansion {
    pub fn is_expanded(&self) -> bool {
        self.expand_slots > 0
    }
}

/// New facilities of one type in one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBuild {
    pub region: RegionKey,
    pub facility_type: FacilityType,
    pub build_count: u32,
    pub under5_slots: u32,
    pub capacity_per_facility: u32,
    pub under5_capacity_per_facility: u32,
    pub cost_per_facility: f64,
}

impl NewBuild {
    pub fn total_slots(&self) -> u64 {
        u64::from(self.build_count) * u64::from(self.capacity_per_facility)
    }

    pub fn construction_cost(&self) -> f64 {
        self.build_count as f64 * self.cost_per_facility
    }
}

/// Outcome at one candidate site (site-level planning only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteDecision {
    pub region: RegionKey,
    pub site: SiteIndex,
    pub location: Coordinates,
    /// Next to an existing facility and never eligible
    pub suppressed: bool,
    pub built: Option<FacilityType>,
    pub under5_slots: u32,
}

/// Capacity against the two coverage targets for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCoverage {
    pub region: RegionKey,
    pub theta: f64,
    pub population_0_12: f64,
    pub population_0_5: f64,
    pub existing_slots: u64,
    pub existing_under5_slots: u64,
    pub expansion_slots: u64,
    pub expansion_under5_slots: u64,
    pub built_slots: u64,
    pub built_under5_slots: u64,
    /// `theta · population_0_12`
    pub coverage_target: f64,
    /// `under5_coverage · population_0_5`
    pub under5_target: f64,
}

impl RegionCoverage {
    pub fn total_slots(&self) -> u64 {
        self.existing_slots + self.expansion_slots + self.built_slots
    }

    pub fn total_under5_slots(&self) -> u64 {
        self.existing_under5_slots + self.expansion_under5_slots + self.built_under5_slots
    }

    /// Both targets met, allowing for solver tolerance on the right-hand side.
    pub fn meets_targets(&self) -> bool {
        const TOL: f64 = 1e-6;
        self.total_slots() as f64 + TOL >= self.coverage_target
            && self.total_under5_slots() as f64 + TOL >= self.under5_target
    }
}

/// Objective split into its three cost categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Expanding existing facilities (fees and per-slot or tier charges)
    pub expansion: f64,
    /// Building new facilities
    pub new_build: f64,
    /// Equipment for every new under-5 slot
    pub equipment: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.expansion + self.new_build + self.equipment
    }
}

/// Complete solution of one formulation
#[derive(Debug, Clone)]
pub struct PlanSolution {
    pub formulation: Formulation,
    pub site_selection: bool,
    pub status: SolveStatus,
    /// Objective as reported by the solver
    pub objective_value: f64,
    /// Costs recomputed from the rounded decisions
    pub costs: CostBreakdown,
    pub expansions: Vec<FacilityExpansion>,
    pub builds: Vec<NewBuild>,
    pub sites: Vec<SiteDecision>,
    pub coverage: Vec<RegionCoverage>,
    pub solve_time: Duration,
}

impl PlanSolution {
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn facilities_expanded(&self) -> usize {
        self.expansions.iter().filter(|e| e.is_expanded()).count()
    }

    pub fn expansion_slots(&self) -> u64 {
        self.expansions.iter().map(|e| u64::from(e.expand_slots)).sum()
    }

    pub fn facilities_built(&self) -> u64 {
        self.builds.iter().map(|b| u64::from(b.build_count)).sum()
    }

    pub fn built_slots(&self) -> u64 {
        self.builds.iter().map(NewBuild::total_slots).sum()
    }

    pub fn regions_short_of_target(&self) -> usize {
        self.coverage.iter().filter(|c| !c.meets_targets()).count()
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "Capacity Plan Summary ({}{})\n{}\n",
            self.formulation,
            if self.site_selection { ", site-level" } else { "" },
            "=".repeat(40)
        ));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Total Cost: ${:.2}\n", self.objective_value));
        s.push_str(&format!("  Expansion: ${:.2}\n", self.costs.expansion));
        s.push_str(&format!("  New Build: ${:.2}\n", self.costs.new_build));
        s.push_str(&format!("  Equipment: ${:.2}\n", self.costs.equipment));
        s.push_str(&format!("Regions: {}\n", self.coverage.len()));
        s.push_str(&format!(
            "Facilities Expanded: {} ({} slots)\n",
            self.facilities_expanded(),
            self.expansion_slots()
        ));
        s.push_str(&format!(
            "Facilities Built: {} ({} slots)\n",
            self.facilities_built(),
            self.built_slots()
        ));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        let built: Vec<&NewBuild> = self.builds.iter().filter(|b| b.build_count > 0).collect();
        if !built.is_empty() {
            s.push_str("\nNew Builds:\n");
            for b in built {
                s.push_str(&format!(
                    "  [BUILD] {} {} (x{}) - ${:.2}\n",
                    b.region,
                    b.facility_type,
                    b.build_count,
                    b.construction_cost()
                ));
            }
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(existing: u64, built: u64, target: f64) -> RegionCoverage {
        RegionCoverage {
            region: RegionKey::new("1"),
            theta: 0.5,
            population_0_12: target * 2.0,
            population_0_5: 0.0,
            existing_slots: existing,
            existing_under5_slots: 0,
            expansion_slots: 0,
            expansion_under5_slots: 0,
            built_slots: built,
            built_under5_slots: 0,
            coverage_target: target,
            under5_target: 0.0,
        }
    }

    #[test]
    fn test_coverage_targets() {
        assert!(coverage(100, 400, 333.3).meets_targets());
        assert!(!coverage(100, 0, 333.3).meets_targets());
        assert_eq!(coverage(100, 400, 0.0).total_slots(), 500);
    }

    #[test]
    fn test_slot_totals_do_not_wrap() {
        let build = NewBuild {
            region: RegionKey::new("1"),
            facility_type: FacilityType::Large,
            build_count: 20_000_000,
            under5_slots: 0,
            capacity_per_facility: 400,
            under5_capacity_per_facility: 200,
            cost_per_facility: 115_000.0,
        };
        assert_eq!(build.total_slots(), 8_000_000_000);
        assert_eq!(
            coverage(u64::from(u32::MAX), u64::from(u32::MAX), 0.0).total_slots(),
            2 * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_solution_summary() {
        let solution = PlanSolution {
            formulation: Formulation::Flat,
            site_selection: false,
            status: SolveStatus::Optimal,
            objective_value: 131_000.0,
            costs: CostBreakdown {
                expansion: 0.0,
                new_build: 115_000.0,
                equipment: 16_000.0,
            },
            expansions: Vec::new(),
            builds: vec![
                NewBuild {
                    region: RegionKey::new("10001"),
                    facility_type: FacilityType::Large,
                    build_count: 1,
                    under5_slots: 160,
                    capacity_per_facility: 400,
                    under5_capacity_per_facility: 200,
                    cost_per_facility: 115_000.0,
                },
                NewBuild {
                    region: RegionKey::new("10001"),
                    facility_type: FacilityType::Small,
                    build_count: 0,
                    under5_slots: 0,
                    capacity_per_facility: 100,
                    under5_capacity_per_facility: 50,
                    cost_per_facility: 65_000.0,
                },
            ],
            sites: Vec::new(),
            coverage: vec![coverage(100, 400, 333.3)],
            solve_time: Duration::from_millis(5),
        };

        assert!(solution.is_optimal());
        assert_eq!(solution.facilities_built(), 1);
        assert_eq!(solution.built_slots(), 400);
        assert_eq!(solution.costs.total(), 131_000.0);

        let summary = solution.summary();
        assert!(summary.contains("Status: optimal"));
        assert!(summary.contains("Facilities Built: 1 (400 slots)"));
        assert!(summary.contains("[BUILD] 10001 L (x1)"));
        assert!(!summary.contains("10001 S"));
    }
}
