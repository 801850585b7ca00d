use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// Figure settings that cannot be drawn
    #[error("Invalid figure configuration: {0}")]
    Config(String),

    /// A requested site has no rows in the plotted years
    #[error("No data for site {site} between {start_year} and {end_year}")]
    NoData {
        site: String,
        start_year: i32,
        end_year: i32,
    },

    /// Backend failure while drawing or saving
    #[error("Failed to draw figure: {0}")]
    Draw(String),
}

pub(crate) fn draw_err<E: std::error::Error>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}
