//! Capacity model.
//!
//! Baseline capacities enter the coverage constraints as constants. The caps
//! computed here bound the integer expansion variables.

use crate::params::PlanParameters;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

// Guards floor() against products like 0.05 * 60 landing just under an integer.
const FLOOR_EPS: f64 = 1e-9;

/// Slot counts split into all ages and the under-5 subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub total: u32,
    pub under5: u32,
}

impl Capacity {
    pub const ZERO: Capacity = Capacity { total: 0, under5: 0 };

    pub fn new(total: u32, under5: u32) -> Self {
        Self { total, under5 }
    }

    /// `None` when either count overflows.
    pub fn checked_add(self, rhs: Capacity) -> Option<Capacity> {
        Some(Capacity {
            total: self.total.checked_add(rhs.total)?,
            under5: self.under5.checked_add(rhs.under5)?,
        })
    }
}

impl Add for Capacity {
    type Output = Capacity;

    fn add(self, rhs: Capacity) -> Capacity {
        Capacity {
            total: self.total + rhs.total,
            under5: self.under5 + rhs.under5,
        }
    }
}

impl AddAssign for Capacity {
    fn add_assign(&mut self, rhs: Capacity) {
        self.total += rhs.total;
        self.under5 += rhs.under5;
    }
}

impl std::iter::Sum for Capacity {
    fn sum<I: Iterator<Item = Capacity>>(iter: I) -> Capacity {
        iter.fold(Capacity::ZERO, Add::add)
    }
}

/// Largest number of slots a facility of `total_capacity` may add:
/// `floor(min(expansion_fraction * total_capacity, expansion_ceiling))`.
pub fn expansion_cap(total_capacity: u32, params: &PlanParameters) -> u32 {
    let raw = (params.expansion_fraction * total_capacity as f64).min(params.expansion_ceiling);
    (raw + FLOOR_EPS).floor().max(0.0) as u32
}

/// Per-tier slot limits for the tiered formulation.
pub fn tier_caps(total_capacity: u32, params: &PlanParameters) -> [u32; 3] {
    let n = total_capacity as f64;
    params
        .tiers
        .fractions
        .map(|frac| (frac * n + FLOOR_EPS).floor().max(0.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_cap_twenty_percent() {
        let params = PlanParameters::default();
        assert_eq!(expansion_cap(100, &params), 20);
        assert_eq!(expansion_cap(57, &params), 11);
        assert_eq!(expansion_cap(0, &params), 0);
    }

    #[test]
    fn test_expansion_cap_ceiling() {
        let params = PlanParameters::default();
        assert_eq!(expansion_cap(2_500, &params), 500);
        assert_eq!(expansion_cap(10_000, &params), 500);
    }

    #[test]
    fn test_tier_caps() {
        let params = PlanParameters::default();
        assert_eq!(tier_caps(100, &params), [10, 5, 5]);
        assert_eq!(tier_caps(60, &params), [6, 3, 3]);
        assert_eq!(tier_caps(7, &params), [0, 0, 0]);
    }

    #[test]
    fn test_tier_caps_stay_within_twenty_percent() {
        let params = PlanParameters::default();
        for n in [0u32, 1, 9, 10, 33, 100, 999, 2_500] {
            let tiers: u32 = tier_caps(n, &params).iter().sum();
            assert!(tiers as f64 <= 0.2 * n as f64 + 1e-9);
            assert!(tiers <= expansion_cap(n, &params));
        }
    }

    #[test]
    fn test_capacity_sum() {
        let total: Capacity = [Capacity::new(100, 40), Capacity::new(50, 10)]
            .into_iter()
            .sum();
        assert_eq!(total, Capacity::new(150, 50));
    }

    #[test]
    fn test_checked_add_overflow() {
        let big = Capacity::new(3_000_000_000, 0);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            Capacity::new(1, 2).checked_add(Capacity::new(3, 4)),
            Some(Capacity::new(4, 6))
        );
    }
}
