//! New-build size classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three discrete sizes a new facility can be built at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FacilityType {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl FacilityType {
    pub const ALL: [FacilityType; 3] = [FacilityType::Small, FacilityType::Medium, FacilityType::Large];
    pub const COUNT: usize = 3;

    /// Position in arrays indexed by facility type.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            FacilityType::Small => 0,
            FacilityType::Medium => 1,
            FacilityType::Large => 2,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FacilityType::Small => "S",
            FacilityType::Medium => "M",
            FacilityType::Large => "L",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Capacity and price of one size class. These are policy constants, not data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacilityTypeSpec {
    /// Total slots provided by one facility of this type
    pub capacity_total: u32,
    /// Slots that may be assigned to children under five
    pub capacity_under5: u32,
    /// Construction cost per facility ($)
    pub unit_cost: f64,
}

impl FacilityTypeSpec {
    pub const fn new(capacity_total: u32, capacity_under5: u32, unit_cost: f64) -> Self {
        Self {
            capacity_total,
            capacity_under5,
            unit_cost,
        }
    }
}
