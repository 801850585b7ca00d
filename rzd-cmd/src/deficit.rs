//! Deficit table computation from the two Earth Engine exports.

use crate::InputArgs;
use anyhow::Context;
use log::info;
use rzd_core::{observation::ColumnMap, table::GeeTable};
use rzd_data::{
    deficit::DeficitRecord,
    deficits_from_table,
    interpolation::interpolate_sites,
    merge::{left_join, rescale_composites},
};
use std::io::Write;

/// Load both exports, join them and fill every gap per site.
pub fn load_merged(clim_csv: &str, modis_csv: &str) -> anyhow::Result<GeeTable> {
    let clim = GeeTable::from_csv_path(clim_csv)
        .with_context(|| format!("reading climate export {clim_csv}"))?;
    let mut modis = GeeTable::from_csv_path(modis_csv)
        .with_context(|| format!("reading remote-sensing export {modis_csv}"))?;
    rescale_composites(&mut modis);

    let merged = left_join(&clim, &modis).context("merging exports")?;
    info!(
        "Merged table has {} sites and {} empty cells before interpolation",
        merged.sites().len(),
        merged.missing_cells()
    );
    let (interpolated, _) = interpolate_sites(&merged);
    Ok(interpolated)
}

/// Run the full pipeline up to the engine output.
pub fn compute(input: &InputArgs) -> anyhow::Result<Vec<DeficitRecord>> {
    let table = load_merged(&input.clim, &input.modis)?;
    let columns = ColumnMap {
        et_components: input.et_components.clone(),
        ..ColumnMap::default()
    };
    let records = deficits_from_table(&table, &columns, input.snow_frac)
        .context("computing deficits")?;
    Ok(records)
}

/// Write the engine output as CSV with one header row.
pub fn write_deficit_csv<W: Write>(records: &[DeficitRecord], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_deficit_csv_path(records: &[DeficitRecord], path: &str) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    write_deficit_csv(records, file)?;
    info!("Wrote {} deficit rows to {}", records.len(), path);
    Ok(())
}

/// `deficit` subcommand.
pub fn run_deficit(input: &InputArgs, output: &str) -> anyhow::Result<()> {
    let records = compute(input)?;
    write_deficit_csv_path(&records, output)
}
