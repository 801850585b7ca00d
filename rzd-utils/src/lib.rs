//! Shared utility functions for RZD crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, NaiveDate, NaiveDateTime};

    /// Formats accepted for the `id` column of Earth Engine exports,
    /// tried in order.
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];
    const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse the `id` field of an export row.
    ///
    /// Accepts plain dates (`2013-01-01`, `20130101`) and timestamps
    /// (`2013-01-01 00:00:00`, `2013-01-01T00:00:00`); the time part is
    /// discarded.
    pub fn parse_gee_date(s: &str) -> Result<NaiveDate, DateError> {
        let s = s.trim();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Ok(date);
            }
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(date_time) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(date_time.date());
            }
        }
        Err(DateError::Unrecognized(s.to_string()))
    }

    /// True when the calendar year of `date` lies in `start_year..=end_year`.
    pub fn in_year_range(date: &NaiveDate, start_year: i32, end_year: i32) -> bool {
        (start_year..=end_year).contains(&date.year())
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum DateError {
        /// None of the export date formats matched
        #[error("Unrecognized date '{0}'")]
        Unrecognized(String),
    }
}
