//! Command-line parsing for the usage-vs-stats report.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the scraping/analysis code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::{stats, typing, usage};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pku",
    version,
    about = "Competitive usage rank vs base stats (Bulbapedia + Smogon)"
)]
pub struct Cli {
    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape, merge and analyze; print summary, tables and plots, optionally export.
    Report(ReportArgs),
    /// Print the merged table only (useful for scripting).
    Dataset(ReportArgs),
    /// Re-run analysis and plots from a dataset JSON written by `--export-json`.
    Plot(PlotArgs),
}

/// Options shared by `report` and `dataset`.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Base stats page (HTML).
    #[arg(long, value_name = "URL", default_value = stats::DEFAULT_URL)]
    pub stats_url: String,

    /// Usage statistics (pipe-delimited text).
    #[arg(long, value_name = "URL", default_value = usage::DEFAULT_URL)]
    pub usage_url: String,

    /// National dex list with types (HTML).
    #[arg(long, value_name = "URL", default_value = typing::DEFAULT_URL)]
    pub types_url: String,

    /// Number of merged rows shown, most used first.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Render ASCII plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 90)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,

    /// Polynomial degree of the rank ~ total fit (1..=5).
    #[arg(long, default_value_t = 2)]
    pub degree: usize,

    /// Export the merged table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the merged dataset to JSON (readable by `pku plot`).
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Write SVG plots into this directory.
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,
}

/// Options for re-plotting a saved dataset.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Dataset JSON file produced by `pku report --export-json`.
    #[arg(long, value_name = "JSON")]
    pub dataset: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 90)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,

    /// Polynomial degree of the rank ~ total fit (1..=5).
    #[arg(long, default_value_t = 2)]
    pub degree: usize,

    /// Write SVG plots into this directory.
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,
}
