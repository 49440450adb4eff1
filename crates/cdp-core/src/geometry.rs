//! Geometry filter for candidate sites.
//!
//! Two candidate sites closer than the minimum separation may not both be built,
//! and a candidate site closer than the minimum separation to an existing
//! facility is treated as already served. Both tests use the strict `<`
//! comparison on great-circle distance.
//!
//! Small candidate lists are scanned pairwise. Longer lists go through an R-tree
//! prefilter on a latitude/longitude box that strictly contains the separation
//! circle, followed by the same exact distance test, so both paths return the
//! same pairs.

use crate::error::{CdpError, CdpResult};
use crate::region::Region;
use crate::SiteIndex;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Candidate lists longer than this use the R-tree prefilter.
pub const SPATIAL_INDEX_THRESHOLD: usize = 64;

// Relative slack on the prefilter box.
const ENVELOPE_SLACK: f64 = 1.05;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(self, other)
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

/// Exclusion structure of one region's candidate sites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteExclusions {
    /// Unordered site pairs closer than the separation, each stored with `a < b`
    pub pairs: Vec<(SiteIndex, SiteIndex)>,
    /// `suppressed[l]` is true when site `l` lies next to an existing facility
    pub suppressed: Vec<bool>,
}

impl SiteExclusions {
    /// Compute exclusions for a region.
    ///
    /// Every existing facility must carry coordinates; a facility without them
    /// cannot be checked against the candidates and is reported as a data error.
    pub fn for_region(region: &Region, threshold_miles: f64) -> CdpResult<Self> {
        let sites: Vec<Coordinates> = region.candidate_sites.iter().map(|s| s.location).collect();
        let mut facilities = Vec::with_capacity(region.facilities.len());
        for facility in region.facilities.values() {
            let location = facility.location.ok_or_else(|| {
                CdpError::data(
                    format!("facility {} in region {}", facility.id, region.key),
                    "coordinates are required for site-level planning",
                )
            })?;
            facilities.push(location);
        }

        Ok(Self {
            pairs: exclusion_pairs(&sites, threshold_miles),
            suppressed: suppressed_sites(&sites, &facilities, threshold_miles),
        })
    }

    pub fn is_suppressed(&self, site: SiteIndex) -> bool {
        self.suppressed.get(site.value()).copied().unwrap_or(false)
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.iter().filter(|s| **s).count()
    }
}

/// Site pairs closer than `threshold_miles`, sorted.
pub fn exclusion_pairs(sites: &[Coordinates], threshold_miles: f64) -> Vec<(SiteIndex, SiteIndex)> {
    if sites.len() > SPATIAL_INDEX_THRESHOLD {
        exclusion_pairs_indexed(sites, threshold_miles)
    } else {
        exclusion_pairs_scan(sites, threshold_miles)
    }
}

/// O(k²) pairwise scan.
pub fn exclusion_pairs_scan(sites: &[Coordinates], threshold_miles: f64) -> Vec<(SiteIndex, SiteIndex)> {
    let mut pairs = Vec::new();
    for (i, a) in sites.iter().enumerate() {
        for (j, b) in sites.iter().enumerate().skip(i + 1) {
            if haversine_miles(a, b) < threshold_miles {
                pairs.push((SiteIndex::new(i), SiteIndex::new(j)));
            }
        }
    }
    pairs
}

/// R-tree prefiltered search with the same result as [`exclusion_pairs_scan`].
pub fn exclusion_pairs_indexed(
    sites: &[Coordinates],
    threshold_miles: f64,
) -> Vec<(SiteIndex, SiteIndex)> {
    let tree = build_tree(sites);
    let mut pairs = Vec::new();
    for (i, a) in sites.iter().enumerate() {
        for j in neighbours(&tree, a, threshold_miles) {
            if j > i && haversine_miles(a, &sites[j]) < threshold_miles {
                pairs.push((SiteIndex::new(i), SiteIndex::new(j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Flags each site that lies closer than `threshold_miles` to any facility.
pub fn suppressed_sites(
    sites: &[Coordinates],
    facilities: &[Coordinates],
    threshold_miles: f64,
) -> Vec<bool> {
    let mut suppressed = vec![false; sites.len()];
    if sites.len() > SPATIAL_INDEX_THRESHOLD {
        let tree = build_tree(sites);
        for facility in facilities {
            for l in neighbours(&tree, facility, threshold_miles) {
                if haversine_miles(facility, &sites[l]) < threshold_miles {
                    suppressed[l] = true;
                }
            }
        }
    } else {
        for (l, site) in sites.iter().enumerate() {
            suppressed[l] = facilities
                .iter()
                .any(|f| haversine_miles(site, f) < threshold_miles);
        }
    }
    suppressed
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

fn build_tree(sites: &[Coordinates]) -> RTree<IndexedPoint> {
    RTree::bulk_load(
        sites
            .iter()
            .enumerate()
            .map(|(i, c)| GeomWithData::new([c.latitude, c.longitude], i))
            .collect(),
    )
}

/// Indices of points inside a box that contains every point within
/// `threshold_miles` of `center`, wrapping across the antimeridian.
fn neighbours(tree: &RTree<IndexedPoint>, center: &Coordinates, threshold_miles: f64) -> Vec<usize> {
    let dlat = (threshold_miles / EARTH_RADIUS_MILES).to_degrees() * ENVELOPE_SLACK;
    let lat_lo = center.latitude - dlat;
    let lat_hi = center.latitude + dlat;

    let widest = lat_lo.abs().max(lat_hi.abs());
    let mut boxes = Vec::with_capacity(2);
    if widest >= 89.0 {
        boxes.push(([lat_lo, -180.0], [lat_hi, 180.0]));
    } else {
        let dlon = dlat / widest.to_radians().cos();
        let lon_lo = center.longitude - dlon;
        let lon_hi = center.longitude + dlon;
        boxes.push(([lat_lo, lon_lo.max(-180.0)], [lat_hi, lon_hi.min(180.0)]));
        if lon_lo < -180.0 {
            boxes.push(([lat_lo, lon_lo + 360.0], [lat_hi, 180.0]));
        }
        if lon_hi > 180.0 {
            boxes.push(([lat_lo, -180.0], [lat_hi, lon_hi - 360.0]));
        }
    }

    let mut found: Vec<usize> = boxes
        .into_iter()
        .flat_map(|(lo, hi)| {
            tree.locate_in_envelope(&AABB::from_corners(lo, hi))
                .map(|p| p.data)
                .collect::<Vec<_>>()
        })
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}
