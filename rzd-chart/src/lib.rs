//! Multi-panel deficit comparison figure.
//!
//! Each plotted site gets a column of two panels: the storage deficit under
//! both policies on top and the two ET signals underneath. Days the snow mask
//! zeroed ET are shaded with thin vertical lines on both panels.

pub mod config;
pub mod error;

use chrono::{Duration, NaiveDate};
use config::{FigureConfig, FigureStyle};
use error::{draw_err, ChartError};
use plotters::coord::Shift;
use plotters::prelude::*;
use rzd_core::table::SiteId;
use rzd_data::deficit::{DeficitRecord, Policy};
use rzd_utils::dates::in_year_range;
use std::path::Path;

const DIM_GRAY: RGBColor = RGBColor(105, 105, 105);
const GRAY: RGBColor = RGBColor(128, 128, 128);

const ET_AXIS_LABEL: &str = "Evapotranspiration (mm/day)";
const DEFICIT_AXIS_LABEL: &str = "Root zone storage deficit (D, mm)";

/// Records of one site restricted to the plotted years.
#[derive(Debug, Clone)]
pub struct SitePanel<'a> {
    pub site: SiteId,
    pub title: String,
    pub records: Vec<&'a DeficitRecord>,
}

impl SitePanel<'_> {
    /// Dates to mark as snow-masked.
    pub fn snow_days(&self) -> Vec<NaiveDate> {
        self.records
            .iter()
            .filter(|r| r.snow_masked)
            .map(|r| r.date)
            .collect()
    }

    /// Half-open date span covering every record.
    pub fn date_span(&self) -> std::ops::Range<NaiveDate> {
        let first = self.records[0].date;
        let last = self.records[self.records.len() - 1].date;
        first..last + Duration::days(1)
    }

    /// Finite `(date, value)` points of one field.
    pub fn points(&self, value: impl Fn(&DeficitRecord) -> f64) -> Vec<(NaiveDate, f64)> {
        self.records
            .iter()
            .map(|r| (r.date, value(r)))
            .filter(|(_, v)| v.is_finite())
            .collect()
    }
}

/// Pick the configured sites and years out of the engine output.
pub fn select_panels<'a>(
    records: &'a [DeficitRecord],
    config: &FigureConfig,
) -> Result<Vec<SitePanel<'a>>, ChartError> {
    config.validate()?;
    config
        .sites
        .iter()
        .zip(&config.titles)
        .map(|(site, title)| {
            let site_records: Vec<&DeficitRecord> = records
                .iter()
                .filter(|r| &r.point == site)
                .filter(|r| in_year_range(&r.date, config.start_year, config.end_year))
                .collect();
            if site_records.is_empty() {
                return Err(ChartError::NoData {
                    site: site.to_string(),
                    start_year: config.start_year,
                    end_year: config.end_year,
                });
            }
            Ok(SitePanel {
                site: site.clone(),
                title: title.clone(),
                records: site_records,
            })
        })
        .collect()
}

/// Render the figure to `path`; `.svg` paths get SVG, anything else PNG.
pub fn render_figure(
    records: &[DeficitRecord],
    config: &FigureConfig,
    path: &Path,
) -> Result<(), ChartError> {
    let panels = select_panels(records, config)?;
    let size = (config.width, config.height);
    let is_svg = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_figure(&root, &panels, config)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_figure(&root, &panels, config)?;
    }
    log::info!(
        "Rendered {} site panels to {}",
        panels.len(),
        path.display()
    );
    Ok(())
}

/// Draw all panels onto an existing drawing area.
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    panels: &[SitePanel<'_>],
    config: &FigureConfig,
) -> Result<(), ChartError> {
    root.fill(&WHITE).map_err(draw_err)?;
    let areas = root.split_evenly((2, panels.len()));
    let (deficit_row, et_row) = areas.split_at(panels.len());

    for (idx, panel) in panels.iter().enumerate() {
        let first_column = idx == 0;
        draw_panel(
            &deficit_row[idx],
            panel,
            PanelSpec {
                y_range: config.deficit_range,
                caption: Some(panel.title.as_str()),
                y_label: first_column.then_some(DEFICIT_AXIS_LABEL),
                legend: first_column,
                x_labels: false,
                marker_opacity: config.style.deficit_marker_opacity,
                value: DeficitRecord::deficit,
            },
            &config.style,
        )?;
        draw_panel(
            &et_row[idx],
            panel,
            PanelSpec {
                y_range: config.et_range,
                caption: None,
                y_label: first_column.then_some(ET_AXIS_LABEL),
                legend: false,
                x_labels: true,
                marker_opacity: config.style.et_marker_opacity,
                value: DeficitRecord::demand,
            },
            &config.style,
        )?;
    }
    root.present().map_err(draw_err)?;
    Ok(())
}

struct PanelSpec<'a> {
    y_range: (f64, f64),
    caption: Option<&'a str>,
    y_label: Option<&'a str>,
    legend: bool,
    x_labels: bool,
    marker_opacity: f64,
    value: fn(&DeficitRecord, Policy) -> f64,
}

fn policy_style(policy: Policy, style: &FigureStyle) -> ShapeStyle {
    match policy {
        Policy::Original => DIM_GRAY.stroke_width(style.original_line_width),
        Policy::SnowAccounting => BLACK.stroke_width(style.snow_accounting_line_width),
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &SitePanel<'_>,
    spec: PanelSpec<'_>,
    style: &FigureStyle,
) -> Result<(), ChartError> {
    let font = style.font_family.as_str();
    let (y_low, y_high) = spec.y_range;

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(if spec.x_labels { 40 } else { 10 })
        .y_label_area_size(70);
    if let Some(caption) = spec.caption {
        builder.caption(caption, (font, style.font_size));
    }
    let x_range: RangedDate<NaiveDate> = panel.date_span().into();
    let mut chart = builder
        .build_cartesian_2d(x_range, y_low..y_high)
        .map_err(draw_err)?;

    let date_label = |d: &NaiveDate| d.format("%Y-%m").to_string();
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_labels(if spec.x_labels { 5 } else { 0 })
        .x_label_formatter(&date_label)
        .label_style((font, style.legend_font_size))
        .axis_desc_style((font, style.legend_font_size));
    if let Some(y_label) = spec.y_label {
        mesh.y_desc(y_label);
    }
    mesh.draw().map_err(draw_err)?;

    let marker = GRAY.mix(spec.marker_opacity).stroke_width(1);
    chart
        .draw_series(
            panel
                .snow_days()
                .into_iter()
                .map(|d| PathElement::new(vec![(d, y_low), (d, y_high)], marker)),
        )
        .map_err(draw_err)?;

    for policy in Policy::ALL {
        let line = policy_style(policy, style);
        chart
            .draw_series(LineSeries::new(
                panel.points(|r| (spec.value)(r, policy)),
                line,
            ))
            .map_err(draw_err)?
            .label(policy.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line));
    }

    if spec.legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((font, style.legend_font_size))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
    }
    Ok(())
}
