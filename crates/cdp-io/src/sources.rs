//! Assemble the region JSON from the five public source tables.
//!
//! | Source | Key column | Columns read |
//! |--------|------------|--------------|
//! | average income | `ZIP code` | `average income` |
//! | employment rate | `zipcode` | `employment rate` |
//! | population by age | `zipcode` | `-5`, `5-9`, `10-14` |
//! | regulated child care | `zip_code` | `facility_id`, `total_capacity`, `infant_capacity`, `toddler_capacity`, `preschool_capacity`, optional `latitude`/`longitude` |
//! | potential locations | `zipcode` | `latitude`, `longitude` |
//!
//! Each file is read once and indexed by normalized ZIP before any region is
//! assembled. The region set is the union of ZIPs across all five files; a
//! region missing from a demand source gets [`MISSING_SENTINEL`] for that
//! field and is rejected later by validation.

use crate::input::{RawFacility, RawLocation, RawRegion, RegionMap, MISSING_SENTINEL};
use anyhow::{anyhow, Context, Result};
use cdp_core::Diagnostics;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Share of the 10-14 age band counted towards ages 0-12 (ages 10, 11, 12).
pub const TEN_TO_TWELVE_SHARE: f64 = 3.0 / 5.0;

/// Paths of the five source tables.
#[derive(Debug, Clone)]
pub struct SourceFiles {
    pub income: PathBuf,
    pub employment: PathBuf,
    pub population: PathBuf,
    pub childcare: PathBuf,
    pub locations: PathBuf,
}

/// Assembled regions and any cells that could not be read.
#[derive(Debug)]
pub struct SourceAssembly {
    pub regions: RegionMap,
    pub diagnostics: Diagnostics,
}

/// Five-digit ZIP string.
///
/// Trims whitespace, truncates ZIP+4 style keys to five characters and
/// zero-pads short numeric keys. Empty input has no ZIP.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let s: String = s.chars().take(5).collect();
    if s.len() < 5 && s.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{s:0>5}"))
    } else {
        Some(s)
    }
}

/// One CSV file held in memory with its header.
struct Table {
    name: String,
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("opening source CSV: {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("reading header of {}", path.display()))?
            .clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("reading records of {}", path.display()))?;
        debug!(file = %path.display(), rows = rows.len(), "source table read");
        Ok(Self {
            name: path.display().to_string(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("{} has no '{}' column", self.name, name))
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Rows with a usable ZIP in `key_column`, paired with that ZIP.
    fn keyed_rows(&self, key_column: usize) -> impl Iterator<Item = (String, &csv::StringRecord)> {
        self.rows
            .iter()
            .filter_map(move |row| normalize_zip(row.get(key_column).unwrap_or("")).map(|zip| (zip, row)))
    }
}

/// Numeric cell: empty is `None`, unreadable is recorded and treated as empty.
fn number(
    row: &csv::StringRecord,
    column: usize,
    table: &Table,
    zip: &str,
    diagnostics: &mut Diagnostics,
) -> Option<f64> {
    let cell = row.get(column).unwrap_or("");
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            diagnostics.add_warning_with_entity(
                "source",
                &format!("unreadable value '{}' in column {}", cell, &table.headers[column]),
                &format!("zip {zip} in {}", table.name),
            );
            None
        }
    }
}

/// One value per ZIP; the first row for a ZIP wins.
fn index_scalar(
    table: &Table,
    key: &str,
    value: &str,
    diagnostics: &mut Diagnostics,
) -> Result<HashMap<String, f64>> {
    let key_col = table.column(key)?;
    let value_col = table.column(value)?;
    let mut index = HashMap::new();
    for (zip, row) in table.keyed_rows(key_col) {
        if index.contains_key(&zip) {
            continue;
        }
        if let Some(v) = number(row, value_col, table, &zip, diagnostics) {
            index.insert(zip, v);
        }
    }
    Ok(index)
}

/// `(population0_5, population0_12)` per ZIP, truncated to whole children.
fn index_population(
    table: &Table,
    diagnostics: &mut Diagnostics,
) -> Result<HashMap<String, (f64, f64)>> {
    let key_col = table.column("zipcode")?;
    let under5_col = table.column("-5")?;
    let five_nine_col = table.column("5-9")?;
    let ten_fourteen_col = table.column("10-14")?;

    let mut index = HashMap::new();
    for (zip, row) in table.keyed_rows(key_col) {
        if index.contains_key(&zip) {
            continue;
        }
        let bands = (
            number(row, under5_col, table, &zip, diagnostics),
            number(row, five_nine_col, table, &zip, diagnostics),
            number(row, ten_fourteen_col, table, &zip, diagnostics),
        );
        if let (Some(under5), Some(five_nine), Some(ten_fourteen)) = bands {
            let p05 = under5.trunc();
            let p012 = (under5 + five_nine + TEN_TO_TWELVE_SHARE * ten_fourteen).trunc();
            index.insert(zip, (p05, p012));
        }
    }
    Ok(index)
}

fn index_facilities(
    table: &Table,
    diagnostics: &mut Diagnostics,
) -> Result<HashMap<String, BTreeMap<String, RawFacility>>> {
    let key_col = table.column("zip_code")?;
    let id_col = table.column("facility_id")?;
    let cap_cols = [
        table.column("total_capacity")?,
        table.column("infant_capacity")?,
        table.column("toddler_capacity")?,
        table.column("preschool_capacity")?,
    ];
    let lat_col = table.optional_column("latitude");
    let lon_col = table.optional_column("longitude");

    let mut index: HashMap<String, BTreeMap<String, RawFacility>> = HashMap::new();
    for (pos, (zip, row)) in table.keyed_rows(key_col).enumerate() {
        let id = match row.get(id_col).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let synthesized = format!("row-{}", pos + 1);
                diagnostics.add_warning_with_entity(
                    "source",
                    &format!("facility without id, stored as {synthesized}"),
                    &format!("zip {zip}"),
                );
                synthesized
            }
        };
        // Missing capacity cells count as zero.
        let [total, infant, toddler, preschool] =
            cap_cols.map(|col| Some(Some(number(row, col, table, &zip, diagnostics).unwrap_or(0.0))));
        let latitude = lat_col.and_then(|col| number(row, col, table, &zip, diagnostics));
        let longitude = lon_col.and_then(|col| number(row, col, table, &zip, diagnostics));

        index.entry(zip).or_default().insert(
            id,
            RawFacility {
                total_capacity: total,
                infant_capacity: infant,
                toddler_capacity: toddler,
                preschool_capacity: preschool,
                latitude,
                longitude,
            },
        );
    }
    Ok(index)
}

fn index_locations(
    table: &Table,
    diagnostics: &mut Diagnostics,
) -> Result<HashMap<String, Vec<RawLocation>>> {
    let key_col = table.column("zipcode")?;
    let lat_col = table.column("latitude")?;
    let lon_col = table.column("longitude")?;

    let mut index: HashMap<String, Vec<RawLocation>> = HashMap::new();
    for (zip, row) in table.keyed_rows(key_col) {
        let location = RawLocation {
            latitude: number(row, lat_col, table, &zip, diagnostics),
            longitude: number(row, lon_col, table, &zip, diagnostics),
        };
        index.entry(zip).or_default().push(location);
    }
    Ok(index)
}

/// Read every source table once and assemble the per-region records.
pub fn assemble_regions(files: &SourceFiles) -> Result<SourceAssembly> {
    let mut diagnostics = Diagnostics::new();

    let income_table = Table::read(&files.income)?;
    let employment_table = Table::read(&files.employment)?;
    let population_table = Table::read(&files.population)?;
    let childcare_table = Table::read(&files.childcare)?;
    let locations_table = Table::read(&files.locations)?;

    let income = index_scalar(&income_table, "ZIP code", "average income", &mut diagnostics)?;
    let employment = index_scalar(&employment_table, "zipcode", "employment rate", &mut diagnostics)?;
    let population = index_population(&population_table, &mut diagnostics)?;
    let mut facilities = index_facilities(&childcare_table, &mut diagnostics)?;
    let mut locations = index_locations(&locations_table, &mut diagnostics)?;

    let mut zips = BTreeSet::new();
    for (table, key) in [
        (&income_table, "ZIP code"),
        (&employment_table, "zipcode"),
        (&population_table, "zipcode"),
        (&childcare_table, "zip_code"),
        (&locations_table, "zipcode"),
    ] {
        let col = table.column(key)?;
        zips.extend(table.keyed_rows(col).map(|(zip, _)| zip));
    }

    let mut regions = RegionMap::new();
    for zip in zips {
        let (population0_5, population0_12) = population
            .get(&zip)
            .copied()
            .unwrap_or((MISSING_SENTINEL, MISSING_SENTINEL));
        let region = RawRegion {
            population0_12: Some(population0_12),
            population0_5: Some(population0_5),
            avg_individual_income: Some(income.get(&zip).copied().unwrap_or(MISSING_SENTINEL)),
            employment_rate: Some(employment.get(&zip).copied().unwrap_or(MISSING_SENTINEL)),
            childcare_dict: Some(facilities.remove(&zip).unwrap_or_default()),
            potential_locations: Some(locations.remove(&zip).unwrap_or_default()),
        };
        regions.insert(zip, region);
    }

    info!(
        regions = regions.len(),
        warnings = diagnostics.warning_count(),
        "source tables assembled"
    );
    Ok(SourceAssembly {
        regions,
        diagnostics,
    })
}

/// Write a region map as pretty JSON.
pub fn write_region_map(regions: &RegionMap, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(regions).context("serializing region data to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing region data to {}", path.display()))?;
    Ok(())
}
