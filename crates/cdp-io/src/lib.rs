//! # cdp-io: Region Data In, Plans Out
//!
//! - [`input`] - Parse and validate the per-region JSON into a [`cdp_core::RegionStore`]
//! - [`sources`] - Assemble that JSON from the public CSV source tables
//! - [`export`] - Write a solved plan as CSV tables and a JSON summary

pub mod export;
pub mod input;
pub mod sources;

pub use export::{write_plan, PlanSummary};
pub use input::{
    load_regions, normalize_employment_rate, parse_regions, region_from_raw, regions_from_map,
    LoadPolicy, LoadedRegions, RawFacility, RawLocation, RawRegion, RegionMap, MISSING_SENTINEL,
};
pub use sources::{assemble_regions, normalize_zip, write_region_map, SourceAssembly, SourceFiles};
