//! Region data store.
//!
//! A [`RegionStore`] is built once per planning run from validated input and is
//! read-only afterwards. Regions are kept in key order so every model and report
//! built from the store is deterministic.

use crate::capacity::Capacity;
use crate::error::{CdpError, CdpResult};
use crate::geometry::Coordinates;
use crate::params::DemandThresholds;
use crate::policy;
use crate::{FacilityId, RegionKey, SiteIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An existing childcare provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub total_capacity: u32,
    pub infant_capacity: u32,
    pub toddler_capacity: u32,
    pub preschool_capacity: u32,
    /// Needed only for site-level planning
    pub location: Option<Coordinates>,
}

impl Facility {
    pub fn new(id: FacilityId, total: u32, infant: u32, toddler: u32, preschool: u32) -> Self {
        Self {
            id,
            total_capacity: total,
            infant_capacity: infant,
            toddler_capacity: toddler,
            preschool_capacity: preschool,
            location: None,
        }
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    /// Slots for children under five (infant + toddler + preschool).
    pub fn under5_capacity(&self) -> u32 {
        self.infant_capacity + self.toddler_capacity + self.preschool_capacity
    }

    pub fn capacity(&self) -> Capacity {
        Capacity::new(self.total_capacity, self.under5_capacity())
    }

    fn validate(&self, region: &RegionKey) -> CdpResult<()> {
        let under5 = self
            .infant_capacity
            .checked_add(self.toddler_capacity)
            .and_then(|v| v.checked_add(self.preschool_capacity));
        match under5 {
            Some(u5) if u5 <= self.total_capacity => {}
            _ => {
                return Err(CdpError::data(
                    format!("facility {} in region {}", self.id, region),
                    format!(
                        "age-banded capacity {}+{}+{} exceeds total capacity {}",
                        self.infant_capacity,
                        self.toddler_capacity,
                        self.preschool_capacity,
                        self.total_capacity
                    ),
                ))
            }
        }
        if let Some(loc) = &self.location {
            if !loc.is_valid() {
                return Err(CdpError::data(
                    format!("facility {} in region {}", self.id, region),
                    format!("invalid coordinates ({}, {})", loc.latitude, loc.longitude),
                ));
            }
        }
        Ok(())
    }
}

/// A location where a new facility could be built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateSite {
    pub index: SiteIndex,
    pub location: Coordinates,
}

/// A ZIP-code-equivalent demand area with its facilities and candidate sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub key: RegionKey,
    /// Children aged 0-12
    pub population_0_12: f64,
    /// Children aged 0-5, a subset of `population_0_12`
    pub population_0_5: f64,
    pub average_income: f64,
    /// Fraction in [0, 1]
    pub employment_rate: f64,
    pub facilities: BTreeMap<FacilityId, Facility>,
    pub candidate_sites: Vec<CandidateSite>,
}

impl Region {
    pub fn new(
        key: RegionKey,
        population_0_12: f64,
        population_0_5: f64,
        average_income: f64,
        employment_rate: f64,
    ) -> Self {
        Self {
            key,
            population_0_12,
            population_0_5,
            average_income,
            employment_rate,
            facilities: BTreeMap::new(),
            candidate_sites: Vec::new(),
        }
    }

    /// Add or replace a facility, keyed by its id.
    pub fn add_facility(&mut self, facility: Facility) {
        self.facilities.insert(facility.id.clone(), facility);
    }

    /// Append a candidate site; its index is its position in the list.
    pub fn add_candidate_site(&mut self, location: Coordinates) -> SiteIndex {
        let index = SiteIndex::new(self.candidate_sites.len());
        self.candidate_sites.push(CandidateSite { index, location });
        index
    }

    pub fn theta(&self, thresholds: &DemandThresholds) -> f64 {
        policy::theta(self.employment_rate, self.average_income, thresholds)
    }

    /// Sum of baseline capacity over owned facilities.
    pub fn existing_capacity(&self) -> Capacity {
        self.facilities.values().map(Facility::capacity).sum()
    }

    /// Right-hand side of the all-ages coverage constraint.
    pub fn coverage_target(&self, thresholds: &DemandThresholds) -> f64 {
        self.theta(thresholds) * self.population_0_12
    }

    /// Right-hand side of the under-5 coverage constraint.
    pub fn under5_target(&self, under5_coverage: f64) -> f64 {
        under5_coverage * self.population_0_5
    }

    /// Check the region's invariants. Nothing is coerced.
    pub fn validate(&self) -> CdpResult<()> {
        let entity = || format!("region {}", self.key);

        if self.key.as_str().trim().is_empty() {
            return Err(CdpError::data(entity(), "empty region key"));
        }
        let demand = [
            ("population0_12", self.population_0_12),
            ("population0_5", self.population_0_5),
            ("avg_individual_income", self.average_income),
            ("employment_rate", self.employment_rate),
        ];
        for (field, value) in demand {
            if !value.is_finite() {
                return Err(CdpError::data(entity(), format!("{field} is not a finite number")));
            }
            if value < 0.0 {
                return Err(CdpError::data(entity(), format!("{field} is negative ({value})")));
            }
        }
        if self.employment_rate > 1.0 {
            return Err(CdpError::data(
                entity(),
                format!(
                    "employment_rate {} is not a fraction in [0, 1]",
                    self.employment_rate
                ),
            ));
        }
        if self.population_0_5 > self.population_0_12 {
            return Err(CdpError::data(
                entity(),
                format!(
                    "population0_5 ({}) exceeds population0_12 ({})",
                    self.population_0_5, self.population_0_12
                ),
            ));
        }

        for (id, facility) in &self.facilities {
            if id != &facility.id {
                return Err(CdpError::data(
                    entity(),
                    format!("facility stored under {id} reports id {}", facility.id),
                ));
            }
            facility.validate(&self.key)?;
        }
        // existing_capacity() sums without overflow checks
        self.facilities
            .values()
            .try_fold(Capacity::ZERO, |acc, f| acc.checked_add(f.capacity()))
            .ok_or_else(|| {
                CdpError::data(entity(), "combined facility capacity exceeds the supported range")
            })?;

        for (pos, site) in self.candidate_sites.iter().enumerate() {
            if site.index.value() != pos {
                return Err(CdpError::data(
                    entity(),
                    format!("candidate site at position {pos} carries index {}", site.index),
                ));
            }
            if !site.location.is_valid() {
                return Err(CdpError::data(
                    entity(),
                    format!(
                        "candidate site {} has invalid coordinates ({}, {})",
                        pos, site.location.latitude, site.location.longitude
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Arena of validated regions keyed by region id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionStore {
    regions: BTreeMap<RegionKey, Region>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a region. Duplicate keys are rejected.
    pub fn insert(&mut self, region: Region) -> CdpResult<()> {
        region.validate()?;
        if self.regions.contains_key(&region.key) {
            return Err(CdpError::data(
                format!("region {}", region.key),
                "duplicate region key",
            ));
        }
        self.regions.insert(region.key.clone(), region);
        Ok(())
    }

    pub fn get(&self, key: &RegionKey) -> Option<&Region> {
        self.regions.get(key)
    }

    /// Regions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RegionKey> {
        self.regions.keys()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn facility_count(&self) -> usize {
        self.regions.values().map(|r| r.facilities.len()).sum()
    }

    pub fn candidate_site_count(&self) -> usize {
        self.regions.values().map(|r| r.candidate_sites.len()).sum()
    }
}
