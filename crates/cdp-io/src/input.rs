//! Region input in the per-region JSON layout.
//!
//! ```json
//! {
//!   "10001": {
//!     "population0_12": 1000, "population0_5": 300,
//!     "avg_individual_income": 70000, "employment_rate": 0.5,
//!     "childcare_dict": {
//!       "F-1": { "total_capacity": 100, "infant_capacity": 10,
//!                "toddler_capacity": 10, "preschool_capacity": 20,
//!                "latitude": 40.75, "longitude": -73.99 }
//!     },
//!     "potential_locations": [ { "latitude": 40.76, "longitude": -73.98 } ]
//!   }
//! }
//! ```
//!
//! Every field is optional on the wire so that a missing value is reported by
//! name instead of failing the whole document. Nothing is defaulted except a
//! capacity explicitly written as `null`, which counts as zero.

use anyhow::{Context, Result};
use cdp_core::{
    CdpError, CdpResult, Coordinates, Diagnostics, Facility, FacilityId, Region, RegionKey,
    RegionStore,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Value the source assembly writes for "not found in this source".
pub const MISSING_SENTINEL: f64 = -1.0;

/// Region key to raw region record.
pub type RegionMap = BTreeMap<String, RawRegion>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRegion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population0_12: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population0_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_individual_income: Option<f64>,
    /// Fraction or percentage; see [`normalize_employment_rate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub childcare_dict: Option<BTreeMap<String, RawFacility>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_locations: Option<Vec<RawLocation>>,
}

/// Capacity fields distinguish "absent" (`None`) from "null" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFacility {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub total_capacity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub infant_capacity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub toddler_capacity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub preschool_capacity: Option<Option<f64>>,
    #[serde(default, alias = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// What to do with a region that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// The first invalid region aborts the load
    #[default]
    Strict,
    /// Invalid regions are dropped and recorded in the diagnostics
    SkipIncomplete,
}

/// Validated regions plus whatever was skipped on the way.
#[derive(Debug)]
pub struct LoadedRegions {
    pub store: RegionStore,
    pub diagnostics: Diagnostics,
}

impl LoadedRegions {
    pub fn skipped(&self) -> usize {
        self.diagnostics.error_count()
    }
}

/// Employment rate as a fraction.
///
/// Values in `[0, 1]` are already fractions; values in `(1, 100]` are read as
/// percentages. Anything else is not a rate.
pub fn normalize_employment_rate(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        None
    }
}

fn demand_field(value: Option<f64>, field: &str, entity: &str) -> CdpResult<f64> {
    match value {
        None => Err(CdpError::data(entity, format!("missing {field}"))),
        Some(v) if v == MISSING_SENTINEL => Err(CdpError::data(
            entity,
            format!("{field} was not found in the source data"),
        )),
        Some(v) if !v.is_finite() || v < 0.0 => Err(CdpError::data(
            entity,
            format!("{field} must be a non-negative number, got {v}"),
        )),
        Some(v) => Ok(v),
    }
}

fn capacity_field(value: Option<Option<f64>>, field: &str, entity: &str) -> CdpResult<u32> {
    match value {
        None => Err(CdpError::data(entity, format!("missing {field}"))),
        Some(None) => Ok(0),
        Some(Some(v)) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Ok(v as u32)
        }
        Some(Some(v)) => Err(CdpError::data(
            entity,
            format!("{field} must be a non-negative whole number, got {v}"),
        )),
    }
}

fn coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
    entity: &str,
) -> CdpResult<Option<Coordinates>> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon))),
        (None, None) => Ok(None),
        _ => Err(CdpError::data(entity, "latitude and longitude must be given together")),
    }
}

/// Convert one raw record into a [`Region`]. The region's own invariants are
/// checked when it is inserted into a [`RegionStore`].
pub fn region_from_raw(key: &str, raw: &RawRegion) -> CdpResult<Region> {
    let key = key.trim();
    let entity = format!("region {key}");
    if key.is_empty() {
        return Err(CdpError::data(entity, "empty region key"));
    }

    let population_0_12 = demand_field(raw.population0_12, "population0_12", &entity)?;
    let population_0_5 = demand_field(raw.population0_5, "population0_5", &entity)?;
    let income = demand_field(raw.avg_individual_income, "avg_individual_income", &entity)?;
    let employment = demand_field(raw.employment_rate, "employment_rate", &entity)?;
    let employment = normalize_employment_rate(employment).ok_or_else(|| {
        CdpError::data(
            &entity,
            format!("employment_rate {employment} is neither a fraction nor a percentage"),
        )
    })?;

    let mut region = Region::new(
        RegionKey::new(key),
        population_0_12,
        population_0_5,
        income,
        employment,
    );

    let facilities = raw
        .childcare_dict
        .as_ref()
        .ok_or_else(|| CdpError::data(&entity, "missing childcare_dict"))?;
    for (id, f) in facilities {
        let fentity = format!("facility {id} in region {key}");
        let mut facility = Facility::new(
            FacilityId::new(id.as_str()),
            capacity_field(f.total_capacity, "total_capacity", &fentity)?,
            capacity_field(f.infant_capacity, "infant_capacity", &fentity)?,
            capacity_field(f.toddler_capacity, "toddler_capacity", &fentity)?,
            capacity_field(f.preschool_capacity, "preschool_capacity", &fentity)?,
        );
        if let Some(location) = coordinates(f.latitude, f.longitude, &fentity)? {
            facility = facility.with_location(location);
        }
        region.add_facility(facility);
    }

    let sites = raw
        .potential_locations
        .as_ref()
        .ok_or_else(|| CdpError::data(&entity, "missing potential_locations"))?;
    for (pos, site) in sites.iter().enumerate() {
        let sentity = format!("candidate site {pos} in region {key}");
        let location = coordinates(site.latitude, site.longitude, &sentity)?
            .ok_or_else(|| CdpError::data(&sentity, "missing coordinates"))?;
        region.add_candidate_site(location);
    }

    Ok(region)
}

/// Validate a region map into a store.
pub fn regions_from_map(map: &RegionMap, policy: LoadPolicy) -> CdpResult<LoadedRegions> {
    let mut store = RegionStore::new();
    let mut diagnostics = Diagnostics::new();

    for (key, raw) in map {
        let result = region_from_raw(key, raw).and_then(|region| store.insert(region));
        match result {
            Ok(()) => {}
            Err(err) if policy == LoadPolicy::SkipIncomplete && err.is_construction_error() => {
                warn!(region = %key, error = %err, "skipping invalid region");
                diagnostics.add_error_with_entity("validation", &err.to_string(), &format!("region {key}"));
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        regions = store.len(),
        facilities = store.facility_count(),
        candidate_sites = store.candidate_site_count(),
        skipped = diagnostics.error_count(),
        "regions loaded"
    );
    Ok(LoadedRegions { store, diagnostics })
}

/// Parse a JSON document into validated regions.
pub fn parse_regions(json: &str, policy: LoadPolicy) -> CdpResult<LoadedRegions> {
    let map: RegionMap = serde_json::from_str(json)?;
    regions_from_map(&map, policy)
}

/// Read and validate a region JSON file.
pub fn load_regions(path: &Path, policy: LoadPolicy) -> Result<LoadedRegions> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading region data from {}", path.display()))?;
    parse_regions(&json, policy).with_context(|| format!("loading regions from {}", path.display()))
}
