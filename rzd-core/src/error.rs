/// Error types for the deficit toolkit
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for loading and deficit operations
#[derive(Error, Debug)]
pub enum DeficitError {
    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to read an input file
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A column the engine reads is absent from the merged table
    #[error("Missing column '{0}' in merged table")]
    MissingColumn(String),

    /// Input does not satisfy what the recurrence assumes
    #[error("Precondition violated for site {site}: {violation}")]
    Precondition { site: String, violation: Violation },

    /// Out-of-range or inconsistent parameters
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// The ways a site's series can be unfit for the recurrence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("series is empty")]
    EmptySeries,

    #[error("dates out of order ({previous} followed by {date})")]
    Unordered { previous: NaiveDate, date: NaiveDate },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("missing '{field}' on {date}")]
    MissingField { field: String, date: NaiveDate },
}

impl DeficitError {
    pub fn precondition(site: impl ToString, violation: Violation) -> Self {
        DeficitError::Precondition {
            site: site.to_string(),
            violation,
        }
    }
}

/// Type alias for Results using DeficitError
pub type Result<T> = std::result::Result<T, DeficitError>;
