//! Planning constants.
//!
//! [`PlanParameters::default`] reproduces the published policy: three build sizes,
//! a $20,000 one-time fee plus $200 per baseline slot when a facility crosses its
//! baseline, $200 per expansion slot, $100 of equipment per under-5 slot, at most
//! 20% growth (capped at 500 slots), and 2/3 under-5 coverage.

use crate::error::{CdpError, CdpResult};
use crate::facility_type::{FacilityType, FacilityTypeSpec};
use serde::{Deserialize, Serialize};

/// Per-type build table, serialized with the S/M/L codes as keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityTypeTable {
    #[serde(rename = "S")]
    pub small: FacilityTypeSpec,
    #[serde(rename = "M")]
    pub medium: FacilityTypeSpec,
    #[serde(rename = "L")]
    pub large: FacilityTypeSpec,
}

impl Default for FacilityTypeTable {
    fn default() -> Self {
        Self {
            small: FacilityTypeSpec::new(100, 50, 65_000.0),
            medium: FacilityTypeSpec::new(200, 100, 95_000.0),
            large: FacilityTypeSpec::new(400, 200, 115_000.0),
        }
    }
}

impl FacilityTypeTable {
    pub fn spec(&self, ty: FacilityType) -> &FacilityTypeSpec {
        match ty {
            FacilityType::Small => &self.small,
            FacilityType::Medium => &self.medium,
            FacilityType::Large => &self.large,
        }
    }
}

/// Thresholds that decide a region's coverage fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandThresholds {
    /// Employment rate (fraction) at or above which the high target applies
    pub employment_rate: f64,
    /// Average income ($) at or below which the high target applies
    pub average_income: f64,
}

impl Default for DemandThresholds {
    fn default() -> Self {
        Self {
            employment_rate: 0.60,
            average_income: 60_000.0,
        }
    }
}

/// Three-tier expansion pricing.
///
/// Tier `k` may hold at most `fractions[k]` of the baseline capacity and costs
/// `base_rates[k] + fixed_fee / total_capacity` per slot, so larger facilities
/// spread the fixed fee over more slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSchedule {
    pub fractions: [f64; 3],
    pub base_rates: [f64; 3],
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            fractions: [0.10, 0.05, 0.05],
            base_rates: [200.0, 400.0, 1000.0],
        }
    }
}

/// Every constant the model builders read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanParameters {
    pub facility_types: FacilityTypeTable,
    /// One-time fee charged when a facility crosses its baseline ($)
    pub fixed_fee: f64,
    /// Per-baseline-slot part of the one-time fee ($/slot)
    pub per_slot_fee: f64,
    /// Per-slot expansion cost in the flat formulation ($/slot)
    pub alpha: f64,
    /// Equipment cost per under-5 slot, existing or new ($/slot)
    pub beta: f64,
    pub tiers: TierSchedule,
    /// Maximum growth of a facility as a fraction of its baseline
    pub expansion_fraction: f64,
    /// Absolute ceiling on expansion slots per facility
    pub expansion_ceiling: f64,
    /// Fraction of the 0-5 population that must be covered
    pub under5_coverage: f64,
    /// Candidate sites closer than this (miles) exclude each other
    pub min_separation_miles: f64,
    pub demand: DemandThresholds,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            facility_types: FacilityTypeTable::default(),
            fixed_fee: 20_000.0,
            per_slot_fee: 200.0,
            alpha: 200.0,
            beta: 100.0,
            tiers: TierSchedule::default(),
            expansion_fraction: 0.2,
            expansion_ceiling: 500.0,
            under5_coverage: 2.0 / 3.0,
            min_separation_miles: 0.06,
            demand: DemandThresholds::default(),
        }
    }
}

impl PlanParameters {
    pub fn type_spec(&self, ty: FacilityType) -> &FacilityTypeSpec {
        self.facility_types.spec(ty)
    }

    /// Per-slot prices of the three expansion tiers for a facility.
    ///
    /// Fails when `total_capacity` is zero because the fixed fee is amortized
    /// over the baseline.
    pub fn tier_rates(&self, total_capacity: u32) -> CdpResult<[f64; 3]> {
        if total_capacity == 0 {
            return Err(CdpError::config(
                "tiered pricing divides by facility capacity, which is zero",
            ));
        }
        let spread = self.fixed_fee / total_capacity as f64;
        let b = self.tiers.base_rates;
        Ok([b[0] + spread, b[1] + spread, b[2] + spread])
    }

    /// Reject constants that would make the model meaningless.
    pub fn validate(&self) -> CdpResult<()> {
        let scalars = [
            ("fixed_fee", self.fixed_fee),
            ("per_slot_fee", self.per_slot_fee),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("expansion_fraction", self.expansion_fraction),
            ("expansion_ceiling", self.expansion_ceiling),
            ("under5_coverage", self.under5_coverage),
            ("demand.employment_rate", self.demand.employment_rate),
            ("demand.average_income", self.demand.average_income),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(CdpError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.expansion_fraction > 1.0 {
            return Err(CdpError::config(format!(
                "expansion_fraction is a share of baseline capacity and must not exceed 1, got {}",
                self.expansion_fraction
            )));
        }
        if self.under5_coverage > 1.0 {
            return Err(CdpError::config("under5_coverage must not exceed 1"));
        }
        if !(self.min_separation_miles.is_finite() && self.min_separation_miles > 0.0) {
            return Err(CdpError::config(format!(
                "min_separation_miles must be positive, got {}",
                self.min_separation_miles
            )));
        }

        for k in 0..3 {
            let (frac, rate) = (self.tiers.fractions[k], self.tiers.base_rates[k]);
            if !frac.is_finite() || frac < 0.0 || !rate.is_finite() || rate < 0.0 {
                return Err(CdpError::config(format!(
                    "tier {} must have non-negative fraction and rate",
                    k + 1
                )));
            }
        }
        let tier_total: f64 = self.tiers.fractions.iter().sum();
        if (tier_total - self.expansion_fraction).abs() > 1e-9 {
            return Err(CdpError::config(format!(
                "tier fractions sum to {tier_total} but expansion_fraction is {}",
                self.expansion_fraction
            )));
        }

        for ty in FacilityType::ALL {
            let spec = self.type_spec(ty);
            if spec.capacity_total == 0 {
                return Err(CdpError::config(format!("facility type {ty} has zero capacity")));
            }
            if spec.capacity_under5 > spec.capacity_total {
                return Err(CdpError::config(format!(
                    "facility type {ty} allows {} under-5 slots out of {} total",
                    spec.capacity_under5, spec.capacity_total
                )));
            }
            if !spec.unit_cost.is_finite() || spec.unit_cost < 0.0 {
                return Err(CdpError::config(format!(
                    "facility type {ty} has invalid unit cost {}",
                    spec.unit_cost
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = PlanParameters::default();
        params.validate().unwrap();
        assert_eq!(params.type_spec(FacilityType::Large).capacity_total, 400);
        assert_eq!(params.type_spec(FacilityType::Small).unit_cost, 65_000.0);
    }

    #[test]
    fn test_tier_rates_spread_fixed_fee() {
        let params = PlanParameters::default();
        let rates = params.tier_rates(100).unwrap();
        assert_eq!(rates, [400.0, 600.0, 1200.0]);

        // Larger facilities pay less per slot
        let big = params.tier_rates(1000).unwrap();
        assert!(big[0] < rates[0]);
    }

    #[test]
    fn test_tier_rates_zero_capacity_is_config_error() {
        let err = PlanParameters::default().tier_rates(0).unwrap_err();
        assert!(matches!(err, CdpError::Configuration(_)));
    }

    #[test]
    fn test_negative_constant_rejected() {
        let params = PlanParameters {
            beta: -1.0,
            ..PlanParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn test_tier_fractions_must_match_cap() {
        let mut params = PlanParameters::default();
        params.tiers.fractions = [0.1, 0.1, 0.1];
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_type_with_excess_under5_rejected() {
        let mut params = PlanParameters::default();
        params.facility_types.small = FacilityTypeSpec::new(100, 150, 65_000.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: PlanParameters = serde_json::from_str(r#"{"alpha": 250.0}"#).unwrap();
        assert_eq!(params.alpha, 250.0);
        assert_eq!(params.beta, 100.0);
        assert_eq!(params.min_separation_miles, 0.06);
    }
}
