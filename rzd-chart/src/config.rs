//! Figure configuration.
//!
//! All styling lives here and is passed explicitly to the renderer; nothing
//! is set process-wide.

use crate::error::ChartError;
use rzd_core::table::SiteId;
use serde::Deserialize;

/// Line widths, fonts and marker shading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FigureStyle {
    pub font_family: String,
    pub font_size: u32,
    pub legend_font_size: u32,
    pub original_line_width: u32,
    pub snow_accounting_line_width: u32,
    /// Opacity of the vertical snow-day markers on ET panels.
    pub et_marker_opacity: f64,
    /// Opacity of the vertical snow-day markers on deficit panels.
    pub deficit_marker_opacity: f64,
}

impl Default for FigureStyle {
    fn default() -> Self {
        FigureStyle {
            font_family: "serif".to_string(),
            font_size: 20,
            legend_font_size: 12,
            original_line_width: 3,
            snow_accounting_line_width: 1,
            et_marker_opacity: 0.35,
            deficit_marker_opacity: 0.5,
        }
    }
}

/// What to plot: one column of panels per site, deficit on top and ET below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub sites: Vec<SiteId>,
    pub titles: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    pub et_range: (f64, f64),
    pub deficit_range: (f64, f64),
    pub width: u32,
    pub height: u32,
    pub style: FigureStyle,
}

impl Default for FigureConfig {
    fn default() -> Self {
        FigureConfig {
            sites: vec![SiteId::new("0"), SiteId::new("1")],
            titles: vec![
                "High Snow Location".to_string(),
                "Low Snow Location".to_string(),
            ],
            start_year: 2013,
            end_year: 2017,
            et_range: (-0.25, 4.75),
            deficit_range: (-50.0, 1200.0),
            width: 1200,
            height: 600,
            style: FigureStyle::default(),
        }
    }
}

impl FigureConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.sites.is_empty() {
            return Err(ChartError::Config("no sites to plot".to_string()));
        }
        if self.sites.len() != self.titles.len() {
            return Err(ChartError::Config(format!(
                "{} sites but {} titles",
                self.sites.len(),
                self.titles.len()
            )));
        }
        if self.start_year > self.end_year {
            return Err(ChartError::Config(format!(
                "start year {} after end year {}",
                self.start_year, self.end_year
            )));
        }
        for (name, (low, high)) in [("et_range", self.et_range), ("deficit_range", self.deficit_range)] {
            if !(low < high) {
                return Err(ChartError::Config(format!("{name} [{low}, {high}] is empty")));
            }
        }
        if self.width == 0 || self.height == 0 {
            return Err(ChartError::Config("figure size must be non-zero".to_string()));
        }
        Ok(())
    }
}
