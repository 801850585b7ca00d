//! Data processing for root-zone storage deficit calculations.
//!
//! This crate merges the climate and remote-sensing exports, fills gaps,
//! applies the snow mask and runs the per-site deficit recurrence.

pub mod deficit;
pub mod merge;
pub mod snow;

use deficit::DeficitRecord;
use rzd_core::{
    error::Result,
    observation::{ColumnMap, Observation},
    table::GeeTable,
};

/// Run the engine over a merged, interpolated table.
pub fn deficits_from_table(
    table: &GeeTable,
    columns: &ColumnMap,
    snow_frac: f64,
) -> Result<Vec<DeficitRecord>> {
    let observations = Observation::from_table(table, columns)?;
    deficit::compute_deficits(observations, snow_frac)
}

/// Linear interpolation for filling gaps in site columns.
pub mod interpolation {
    use rzd_core::table::GeeTable;

    /// Fill the `None` cells of one column by position.
    ///
    /// Interior gaps are interpolated linearly between the neighbouring
    /// valid cells, treating rows as equally spaced. Leading and trailing
    /// gaps take the nearest valid value. A column with no valid cell is
    /// returned unchanged.
    pub fn interpolate_column(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let valid: Vec<(usize, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.map(|v| (idx, v)))
            .collect();
        let (Some(&(first_idx, first)), Some(&(last_idx, last))) = (valid.first(), valid.last())
        else {
            return values.to_vec();
        };

        let mut result = values.to_vec();
        result[..first_idx].fill(Some(first));
        result[last_idx + 1..].fill(Some(last));
        for window in valid.windows(2) {
            let (start_idx, start) = window[0];
            let (end_idx, end) = window[1];
            let steps = (end_idx - start_idx) as f64;
            let slope = (end - start) / steps;
            for idx in start_idx + 1..end_idx {
                result[idx] = Some(start + slope * (idx - start_idx) as f64);
            }
        }
        result
    }

    /// Interpolate every numeric column of every site.
    ///
    /// Rows are first stably sorted by site then date, so the result is
    /// ordered the way the deficit engine expects. Returns the filled table
    /// and the number of cells that were filled.
    pub fn interpolate_sites(table: &GeeTable) -> (GeeTable, usize) {
        let mut result = table.clone();
        result
            .rows
            .sort_by(|a, b| a.point.cmp(&b.point).then(a.date.cmp(&b.date)));

        let mut filled = 0usize;
        let mut start = 0usize;
        while start < result.rows.len() {
            let point = result.rows[start].point.clone();
            let end = result.rows[start..]
                .iter()
                .position(|r| r.point != point)
                .map_or(result.rows.len(), |offset| start + offset);

            for column in 0..result.columns.len() {
                let values: Vec<Option<f64>> = result.rows[start..end]
                    .iter()
                    .map(|r| r.values[column])
                    .collect();
                let interpolated = interpolate_column(&values);
                for (row, value) in result.rows[start..end].iter_mut().zip(interpolated) {
                    if row.values[column].is_none() && value.is_some() {
                        filled += 1;
                    }
                    row.values[column] = value;
                }
            }
            start = end;
        }
        log::info!(
            "Interpolated {} cells across {} sites",
            filled,
            result.sites().len()
        );
        (result, filled)
    }

}
