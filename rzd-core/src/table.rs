//! Column-named tables read from Earth Engine CSV exports.
//!
//! Every export carries an `id` (date) and `point` (site) column plus any
//! number of numeric columns. Rows are kept in file order; numeric cells are
//! `None` when the export left them empty.

use crate::error::{DeficitError, Result};
use csv::ReaderBuilder;
use rzd_utils::dates::parse_gee_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet, fmt, io::Read, path::Path};

/// Name of the date column in every export.
pub const DATE_COLUMN: &str = "id";

/// Name of the site column in every export.
pub const POINT_COLUMN: &str = "point";

/// Bookkeeping columns Earth Engine and pandas add to exports.
const IGNORED_COLUMNS: [&str; 4] = ["", "Unnamed: 0", "system:index", ".geo"];

/// Site identifier. Integer-like ids order numerically so that `"10"`
/// sorts after `"2"`, and ahead of any non-numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> SiteId {
        SiteId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SiteId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SiteId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(value: &str) -> Self {
        SiteId::new(value)
    }
}

/// One `(point, id)` row with its numeric cells, aligned with
/// [`GeeTable::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeeRow {
    pub point: SiteId,
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeeTable {
    pub columns: Vec<String>,
    pub rows: Vec<GeeRow>,
}

impl GeeTable {
    pub fn new(columns: Vec<String>) -> GeeTable {
        GeeTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Read an export from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<GeeTable> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = GeeTable::from_csv_reader(file)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    pub fn from_csv_str(csv_data: &str) -> Result<GeeTable> {
        GeeTable::from_csv_reader(csv_data.as_bytes())
    }

    /// Parse an export with a header row.
    ///
    /// Empty cells and `nan` text become `None`. Any other non-numeric cell is
    /// an [`DeficitError::InvalidFormat`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<GeeTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DeficitError::InvalidFormat(format!("missing '{name}' column")))
        };
        let date_idx = position(DATE_COLUMN)?;
        let point_idx = position(POINT_COLUMN)?;

        let value_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != date_idx && *idx != point_idx)
            .map(|(idx, h)| (idx, h.trim().to_string()))
            .filter(|(_, h)| !IGNORED_COLUMNS.contains(&h.as_str()))
            .collect();

        let mut table = GeeTable::new(value_columns.iter().map(|(_, h)| h.clone()).collect());
        for result in rdr.records() {
            let record = result?;
            let date_str = record.get(date_idx).unwrap_or("");
            let date = parse_gee_date(date_str)
                .map_err(|e| DeficitError::DateParse(e.to_string()))?;
            let point = SiteId::new(record.get(point_idx).unwrap_or(""));
            if point.as_str().is_empty() {
                return Err(DeficitError::InvalidFormat(format!(
                    "row dated {date} has no point"
                )));
            }
            let values = value_columns
                .iter()
                .map(|(idx, name)| parse_cell(record.get(*idx).unwrap_or(""), name))
                .collect::<Result<Vec<_>>>()?;
            table.rows.push(GeeRow {
                point,
                date,
                values,
            });
        }
        Ok(table)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by column name; `None` for unknown columns and empty cells.
    pub fn value(&self, row: &GeeRow, column: &str) -> Option<f64> {
        self.column_index(column).and_then(|idx| row.values[idx])
    }

    /// Distinct sites, in site order.
    pub fn sites(&self) -> BTreeSet<SiteId> {
        self.rows.iter().map(|r| r.point.clone()).collect()
    }

    /// Rows of one site in table order.
    pub fn rows_for_site<'a>(&'a self, site: &'a SiteId) -> impl Iterator<Item = &'a GeeRow> + 'a {
        self.rows.iter().filter(move |r| &r.point == site)
    }

    /// Count of empty cells across the table.
    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

fn parse_cell(raw: &str, column: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| DeficitError::InvalidFormat(format!("non-numeric '{raw}' in column '{column}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIM: &str = r#",id,point,prism_ppt,prism_tmean,system:index,.geo
0,2013-01-01,0,5.0,1.5,a,{}
1,2013-01-02,0,,2.0,b,{}
2,2013-01-01,1,0.5,nan,c,{}
"#;

    #[test]
    fn test_parse_export_drops_bookkeeping_columns() {
        let table = GeeTable::from_csv_str(CLIM).unwrap();
        assert_eq!(table.columns, vec!["prism_ppt", "prism_tmean"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].values, vec![Some(5.0), Some(1.5)]);
        assert_eq!(table.rows[1].values, vec![None, Some(2.0)]);
        assert_eq!(table.rows[2].values, vec![Some(0.5), None]);
        assert_eq!(table.missing_cells(), 2);
    }

    #[test]
    fn test_value_lookup_and_sites() {
        let table = GeeTable::from_csv_str(CLIM).unwrap();
        let row = &table.rows[0];
        assert_eq!(table.value(row, "prism_ppt"), Some(5.0));
        assert_eq!(table.value(row, "not_a_column"), None);
        let sites: Vec<SiteId> = table.sites().into_iter().collect();
        assert_eq!(sites, vec![SiteId::new("0"), SiteId::new("1")]);
        assert_eq!(table.rows_for_site(&SiteId::new("0")).count(), 2);
    }

    #[test]
    fn test_missing_point_column_is_rejected() {
        let err = GeeTable::from_csv_str("id,prism_ppt\n2013-01-01,1.0\n").unwrap_err();
        assert!(matches!(err, DeficitError::InvalidFormat(_)));
    }

    #[test]
    fn test_non_numeric_cell_is_rejected() {
        let err = GeeTable::from_csv_str("id,point,prism_ppt\n2013-01-01,0,wet\n").unwrap_err();
        assert!(err.to_string().contains("wet"));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = GeeTable::from_csv_str("id,point,prism_ppt\nyesterday,0,1\n").unwrap_err();
        assert!(matches!(err, DeficitError::DateParse(_)));
    }

    #[test]
    fn test_site_ids_order_numerically() {
        let mut ids = vec![SiteId::new("10"), SiteId::new("2"), SiteId::new("b"), SiteId::new("0")];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "10", "b"]);
    }
}
