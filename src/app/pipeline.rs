//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch stats -> parse/validate -> fetch usage -> parse/validate
//! -> fetch types -> parse/validate -> merge -> analysis
//!
//! Stages run strictly in that order; the first failure aborts the run.
//! The front-end (`app`) only decides what to print.

use tracing::info;

use crate::analysis::{Analysis, analyze};
use crate::data::{Fetcher, HttpFetcher, MergedDataset, merge, stats, typing, usage};
use crate::domain::{ReportConfig, SourceUrls};
use crate::error::AppError;

/// Scraped and merged sources, before analysis.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    pub sources: SourceUrls,
    /// Battle count from the usage report preamble, when present.
    pub battles: Option<u64>,
    pub merged: MergedDataset,
}

/// All computed outputs of a single `pku report` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub scrape: ScrapeOutput,
    pub analysis: Analysis,
}

/// Execute the full pipeline over HTTP.
pub fn run_report(config: &ReportConfig) -> Result<RunOutput, AppError> {
    let fetcher = HttpFetcher::new()?;
    run_report_with(config, &fetcher)
}

/// Execute the full pipeline against any document source.
pub fn run_report_with(
    config: &ReportConfig,
    fetcher: &dyn Fetcher,
) -> Result<RunOutput, AppError> {
    let scrape = scrape_with(&config.sources, fetcher)?;
    let analysis = analyze(&scrape.merged.records, config.degree)?;
    Ok(RunOutput { scrape, analysis })
}

/// Fetch, parse, validate and merge the three sources.
pub fn scrape_with(sources: &SourceUrls, fetcher: &dyn Fetcher) -> Result<ScrapeOutput, AppError> {
    let stats_doc = fetcher.fetch_text(&sources.stats)?;
    let stat_rows = stats::parse_stats(&stats_doc)?;
    stats::validate_stats(&stat_rows)?;

    let usage_doc = fetcher.fetch_text(&sources.usage)?;
    let report = usage::parse_usage(&usage_doc)?;
    usage::validate_usage(&report.records)?;

    let types_doc = fetcher.fetch_text(&sources.types)?;
    let type_rows = typing::parse_types(&types_doc)?;
    typing::validate_types(&type_rows)?;

    let merged = merge(&stat_rows, &report.records, &type_rows);
    info!(rows = merged.records.len(), "pipeline complete");

    Ok(ScrapeOutput {
        sources: sources.clone(),
        battles: report.battles,
        merged,
    })
}
