//! Command implementations for RZD CLI.
//!
//! Provides subcommands for computing the deficit table from Earth Engine
//! exports and for rendering the site comparison figure.

use clap::{Args, Subcommand};

pub mod deficit;
pub mod figure;

/// Default snow cover (percent) above which ET is masked.
pub const DEFAULT_SNOW_FRAC: f64 = 10.0;

/// Input files and engine parameters shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the PRISM climate export CSV
    #[arg(short = 'c', long)]
    pub clim: String,

    /// Path to the PML/MODIS remote-sensing export CSV
    #[arg(short = 'm', long)]
    pub modis: String,

    /// Snow cover (percent) above which ET is treated as zero
    #[arg(short = 's', long, default_value_t = DEFAULT_SNOW_FRAC)]
    pub snow_frac: f64,

    /// Columns summed to form ET
    #[arg(long, value_delimiter = ',', default_values_t = ["pml_Ec".to_string(), "pml_Es".to_string()])]
    pub et_components: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge, interpolate and compute the deficit table
    Deficit {
        #[command(flatten)]
        input: InputArgs,

        /// Output path for the per-site deficit CSV
        #[arg(short = 'o', long)]
        output: String,
    },

    /// Compute deficits and render the two-row comparison figure
    Figure {
        #[command(flatten)]
        input: InputArgs,

        /// Output image path (.png or .svg)
        #[arg(short = 'o', long)]
        output: String,

        /// JSON file overriding the default figure settings
        #[arg(long)]
        config: Option<String>,

        /// Also write the deficit table to this CSV
        #[arg(long)]
        deficit_csv: Option<String>,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Deficit { input, output } => deficit::run_deficit(&input, &output),
        Command::Figure {
            input,
            output,
            config,
            deficit_csv,
        } => figure::run_figure(&input, &output, config.as_deref(), deficit_csv.as_deref()),
    }
}
