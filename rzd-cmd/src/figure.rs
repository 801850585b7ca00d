//! Comparison figure rendering.

use crate::{deficit, InputArgs};
use anyhow::Context;
use log::info;
use rzd_chart::{config::FigureConfig, render_figure, select_panels};
use std::path::Path;

/// Read a figure configuration, falling back to defaults without a path.
pub fn load_figure_config(path: Option<&str>) -> anyhow::Result<FigureConfig> {
    let Some(path) = path else {
        return Ok(FigureConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config: FigureConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing figure config {path}"))?;
    config.validate()?;
    info!("Loaded figure config from {}", path);
    Ok(config)
}

/// `figure` subcommand.
///
/// Configuration is checked and the plotted sites are selected before any
/// file is written, so a bad config or a missing site leaves no output behind.
pub fn run_figure(
    input: &InputArgs,
    output: &str,
    config_path: Option<&str>,
    deficit_csv: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_figure_config(config_path)?;
    let records = deficit::compute(input)?;
    select_panels(&records, &config).context("selecting sites to plot")?;

    if let Some(csv_path) = deficit_csv {
        deficit::write_deficit_csv_path(&records, csv_path)?;
    }
    render_figure(&records, &config, Path::new(output))
        .with_context(|| format!("rendering {output}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deficit::tests::{input_args, scratch_dir};

    #[test]
    fn test_default_config_without_path() {
        let config = load_figure_config(None).unwrap();
        assert_eq!(config, FigureConfig::default());
    }

    #[test]
    fn test_config_from_file() {
        let dir = scratch_dir("config");
        let path = dir.join("figure.json");
        std::fs::write(&path, r#"{"sites": ["1"], "titles": ["Valley"], "start_year": 2013}"#).unwrap();
        let config = load_figure_config(path.to_str()).unwrap();
        assert_eq!(config.titles, vec!["Valley".to_string()]);
        assert_eq!(config.end_year, 2017);
    }

    #[test]
    fn test_invalid_config_file_rejected() {
        let dir = scratch_dir("bad-config");
        let path = dir.join("figure.json");
        std::fs::write(&path, r#"{"sites": ["0", "1"], "titles": ["One"]}"#).unwrap();
        assert!(load_figure_config(path.to_str()).is_err());
    }

    #[test]
    fn test_unknown_site_writes_nothing() {
        let dir = scratch_dir("unknown-site");
        let input = input_args(&dir);
        let config = dir.join("figure.json");
        std::fs::write(&config, r#"{"sites": ["9"], "titles": ["Nowhere"]}"#).unwrap();
        let image = dir.join("figure.png");
        let table = dir.join("deficit.csv");
        let _ = std::fs::remove_file(&image);
        let _ = std::fs::remove_file(&table);

        let err = run_figure(
            &input,
            image.to_str().unwrap(),
            config.to_str(),
            table.to_str(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("No data for site 9"));
        assert!(!image.exists());
        assert!(!table.exists());
    }
}
