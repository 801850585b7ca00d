use crate::{
    error::{DeficitError, Result, Violation},
    table::{GeeRow, GeeTable, SiteId},
};
use chrono::NaiveDate;

/// PRISM daily precipitation, mm/day.
pub const PRECIP_COLUMN: &str = "prism_ppt";

/// MODIS NDSI snow cover, percent of the pixel.
pub const SNOW_COVER_COLUMN: &str = "snow_cover_modis_NDSI_Snow_Cover";

/// PML transpiration and soil evaporation; their sum is the ET signal.
pub const ET_COMPONENT_COLUMNS: [&str; 2] = ["pml_Ec", "pml_Es"];

/// Which export columns feed the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub precip: String,
    pub snow_cover: String,
    /// Summed to form `ET`.
    pub et_components: Vec<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            precip: PRECIP_COLUMN.to_string(),
            snow_cover: SNOW_COVER_COLUMN.to_string(),
            et_components: ET_COMPONENT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ColumnMap {
    /// Fail on the first column the table does not have.
    pub fn check(&self, table: &GeeTable) -> Result<()> {
        if self.et_components.is_empty() {
            return Err(DeficitError::Config(
                "at least one ET component column is required".to_string(),
            ));
        }
        let required = std::iter::once(&self.precip)
            .chain(std::iter::once(&self.snow_cover))
            .chain(self.et_components.iter());
        for column in required {
            if table.column_index(column).is_none() {
                return Err(DeficitError::MissingColumn(column.clone()));
            }
        }
        Ok(())
    }
}

/// A single day at a single site, reduced to the fluxes the deficit
/// recurrence needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub point: SiteId,
    pub date: NaiveDate,
    /// Total evapotranspiration, mm/day.
    pub et: f64,
    /// Precipitation, mm/day.
    pub precip: f64,
    pub snow_cover_fraction: f64,
}

impl Observation {
    /// Pull an observation out of a merged table row.
    ///
    /// Any empty required cell is a precondition violation for the row's
    /// site; interpolation should have filled it.
    pub fn from_row(table: &GeeTable, row: &GeeRow, columns: &ColumnMap) -> Result<Observation> {
        let require = |column: &str| {
            table.value(row, column).ok_or_else(|| {
                DeficitError::precondition(
                    &row.point,
                    Violation::MissingField {
                        field: column.to_string(),
                        date: row.date,
                    },
                )
            })
        };
        let mut et = 0.0;
        for component in &columns.et_components {
            et += require(component.as_str())?;
        }
        Ok(Observation {
            point: row.point.clone(),
            date: row.date,
            et,
            precip: require(columns.precip.as_str())?,
            snow_cover_fraction: require(columns.snow_cover.as_str())?,
        })
    }

    /// Convert every row of a merged table, in table order.
    pub fn from_table(table: &GeeTable, columns: &ColumnMap) -> Result<Vec<Observation>> {
        columns.check(table)?;
        table
            .rows
            .iter()
            .map(|row| Observation::from_row(table, row, columns))
            .collect()
    }
}
