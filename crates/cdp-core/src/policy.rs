//! Demand policy.
//!
//! A region where most adults work, or where incomes are low, must cover half of
//! its 0-12 population. Every other region must cover a third.

use crate::params::DemandThresholds;

/// Coverage fraction for high-need regions.
pub const THETA_HIGH: f64 = 0.5;
/// Coverage fraction for all other regions.
pub const THETA_LOW: f64 = 1.0 / 3.0;

/// Coverage fraction for a region.
///
/// `employment_rate` is a fraction in `[0, 1]`; ingestion converts percentages.
pub fn theta(employment_rate: f64, average_income: f64, thresholds: &DemandThresholds) -> f64 {
    if employment_rate >= thresholds.employment_rate || average_income <= thresholds.average_income
    {
        THETA_HIGH
    } else {
        THETA_LOW
    }
}
