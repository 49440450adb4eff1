//! # cdp-core: Childcare Capacity Planning Core
//!
//! Typed entities and pure derived quantities for planning childcare capacity
//! expansion across ZIP-code regions.
//!
//! ## Design Philosophy
//!
//! Input data is validated once and stored in an arena keyed by region:
//! - **Regions** own their demand figures, existing facilities and candidate sites
//! - **Facilities** own their capacity split by age band and optional coordinates
//! - **Candidate sites** are identified by their position in the region's list
//!
//! Everything derived from these entities (coverage fraction, baseline capacity,
//! site separation) is a pure function over them. Nothing is re-read from source
//! files once a [`RegionStore`] exists.
//!
//! ## Quick Start
//!
//! ```rust
//! use cdp_core::*;
//!
//! let mut region = Region::new(RegionKey::new("10001"), 1000.0, 300.0, 70_000.0, 0.5);
//! region.add_facility(Facility::new(FacilityId::new("F-1"), 100, 10, 10, 20));
//!
//! let params = PlanParameters::default();
//! assert_eq!(region.theta(&params.demand), THETA_LOW);
//! assert_eq!(region.existing_capacity().total, 100);
//! assert_eq!(region.existing_capacity().under5, 40);
//!
//! let mut store = RegionStore::new();
//! store.insert(region).unwrap();
//! assert_eq!(store.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`region`] - Region, Facility, CandidateSite and the [`RegionStore`] arena
//! - [`facility_type`] - The three new-build size classes
//! - [`params`] - Model constants and their validation
//! - [`policy`] - Demand policy (coverage fraction theta)
//! - [`capacity`] - Baseline capacity figures used as constraint coefficients
//! - [`geometry`] - Great-circle distance and site exclusion rules
//! - [`diagnostics`] - Issue collection for lenient ingestion

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod capacity;
pub mod diagnostics;
pub mod error;
pub mod facility_type;
pub mod geometry;
pub mod params;
pub mod policy;
pub mod region;

pub use capacity::{expansion_cap, tier_caps, Capacity};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CdpError, CdpResult};
pub use facility_type::{FacilityType, FacilityTypeSpec};
pub use geometry::{haversine_miles, Coordinates, SiteExclusions, EARTH_RADIUS_MILES};
pub use params::{DemandThresholds, FacilityTypeTable, PlanParameters, TierSchedule};
pub use policy::{theta, THETA_HIGH, THETA_LOW};
pub use region::{CandidateSite, Facility, Region, RegionStore};

/// Identifier of a ZIP-code-equivalent region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

/// Identifier of an existing facility, unique within its region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(String);

/// Position of a candidate site within its region's candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteIndex(usize);

impl RegionKey {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        RegionKey(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FacilityId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        FacilityId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SiteIndex {
    #[inline]
    pub fn new(value: usize) -> Self {
        SiteIndex(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SiteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site#{}", self.0)
    }
}
