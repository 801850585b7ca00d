//! Joining the climate and remote-sensing exports.

use chrono::NaiveDate;
use rzd_core::{
    error::{DeficitError, Result, Violation},
    table::{GeeRow, GeeTable, SiteId},
};
use std::collections::HashMap;

/// MODIS ET/PET products are 8-day sums.
pub const MODIS_COMPOSITE_DAYS: f64 = 8.0;

/// Columns holding 8-day composite totals.
pub const COMPOSITE_COLUMNS: [&str; 2] = ["modis_ET", "modis_PET"];

/// Left join `right` onto `left` by `(id, point)`.
///
/// Every left row is kept, in order. Right columns are appended; when a right
/// row is absent their cells are `None`. Column names present in both tables
/// get `_x` (left) and `_y` (right) suffixes. A key repeated in the right
/// table is a precondition violation.
pub fn left_join(left: &GeeTable, right: &GeeTable) -> Result<GeeTable> {
    let mut lookup: HashMap<(&SiteId, NaiveDate), &GeeRow> = HashMap::new();
    for row in &right.rows {
        if lookup.insert((&row.point, row.date), row).is_some() {
            return Err(DeficitError::precondition(
                &row.point,
                Violation::DuplicateDate(row.date),
            ));
        }
    }

    let suffixed = |name: &String, other: &GeeTable, suffix: &str| {
        if other.column_index(name).is_some() {
            format!("{name}{suffix}")
        } else {
            name.clone()
        }
    };
    let columns: Vec<String> = left
        .columns
        .iter()
        .map(|c| suffixed(c, right, "_x"))
        .chain(right.columns.iter().map(|c| suffixed(c, left, "_y")))
        .collect();

    let mut merged = GeeTable::new(columns);
    let mut unmatched = 0usize;
    for row in &left.rows {
        let mut values = row.values.clone();
        match lookup.get(&(&row.point, row.date)) {
            Some(right_row) => values.extend_from_slice(&right_row.values),
            None => {
                unmatched += 1;
                values.extend(std::iter::repeat(None).take(right.columns.len()));
            }
        }
        merged.rows.push(GeeRow {
            point: row.point.clone(),
            date: row.date,
            values,
        });
    }
    log::info!(
        "Merged {} rows ({} without a remote-sensing match)",
        merged.rows.len(),
        unmatched
    );
    Ok(merged)
}

/// Convert 8-day composite columns to daily rates in place.
pub fn rescale_composites(table: &mut GeeTable) {
    for column in COMPOSITE_COLUMNS {
        let Some(idx) = table.column_index(column) else {
            continue;
        };
        for row in table.rows.iter_mut() {
            if let Some(value) = row.values[idx].as_mut() {
                *value /= MODIS_COMPOSITE_DAYS;
            }
        }
        log::debug!("Rescaled {column} to daily values");
    }
}
