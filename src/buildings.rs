// Buildings portfolio extract. The simplest of the five datasets: column
// names arrive already canonical, so cleaning is the schema check plus
// mapping the "NV" sentinel to missing. No identifier repair, no dedup.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::LoaderConfig;
use crate::db::{append_table, connect, AppendReport};
use crate::error::LoaderError;
use crate::reader::{read_data, Dataset};
use crate::table::Table;

pub const BUILDINGS_COLUMNS: [&str; 12] = [
    "building_name",
    "address",
    "city",
    "state",
    "zipcode",
    "year_built",
    "gross_sq_ft",
    "gr_sq_ft_location2",
    "nrel_bca_leed_analysis",
    "nrel_renewable_reopt_analysis",
    "retrocommision",
    "energy_assessment",
];

/// Portfolio sentinel for "no value".
const NOT_AVAILABLE: &str = "NV";

pub fn normalize_buildings(mut data: Table) -> Result<Table, LoaderError> {
    data.check_columns("buildings", &BUILDINGS_COLUMNS)?;
    data.replace_all(&[NOT_AVAILABLE]);
    Ok(data)
}

/// Load a buildings extract and append it to `buildings`.
pub fn buildings_data_to_db(filepath: &Path, config: &LoaderConfig) -> Result<AppendReport> {
    let data = read_data(filepath, Dataset::Buildings)?;
    let cleaned = normalize_buildings(data)?;
    let conn = connect(config)?;
    let report = append_table(&conn, &cleaned, "buildings")?;
    info!(
        rows = cleaned.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        "buildings batch appended"
    );
    Ok(report)
}
