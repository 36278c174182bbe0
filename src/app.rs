//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - runs the scrape/merge/analysis pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Command, PlotArgs, ReportArgs};
use crate::domain::{ReportConfig, SourceUrls};
use crate::error::AppError;

pub mod pipeline;

pub const MAX_DEGREE: usize = 5;
pub const MIN_WIDTH: usize = 10;
pub const MIN_HEIGHT: usize = 5;

/// Entry point for the `pku` binary.
pub fn run() -> Result<(), AppError> {
    // `pku` alone should behave like `pku report`. Clap requires a subcommand
    // name, so the argv list is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(cli.verbose)?;

    match cli.command {
        Command::Report(args) => handle_report(args, OutputMode::Full),
        Command::Dataset(args) => handle_report(args, OutputMode::DatasetOnly),
        Command::Plot(args) => handle_plot(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    DatasetOnly,
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::config(format!("Failed to install logger: {e}")))
}

fn handle_report(args: ReportArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = report_config_from_args(&args)?;

    if mode == OutputMode::DatasetOnly {
        let fetcher = crate::data::HttpFetcher::new()?;
        let scrape = pipeline::scrape_with(&config.sources, &fetcher)?;
        let rows = crate::report::top_by_rank(&scrape.merged.records, config.top_n);
        print!("{}", crate::report::format::format_merged_table(&rows));
        return write_exports(&config, &scrape);
    }

    let run = pipeline::run_report(&config)?;
    let records = &run.scrape.merged.records;

    println!(
        "{}",
        crate::report::format::format_run_summary(
            &run.scrape.sources,
            &run.scrape.merged.summary,
            run.scrape.battles
        )
    );
    println!("Top {} by usage rank:", config.top_n);
    println!(
        "{}",
        crate::report::format::format_merged_table(&crate::report::top_by_rank(
            records,
            config.top_n
        ))
    );
    println!("{}", crate::report::format::format_analysis(&run.analysis));

    if config.plot {
        println!(
            "{}",
            crate::plot::ascii::render_all(
                records,
                &run.analysis,
                config.plot_width,
                config.plot_height
            )
        );
    }
    if let Some(dir) = &config.plot_dir {
        crate::plot::svg::write_all(dir, records, &run.analysis)?;
    }

    write_exports(&config, &run.scrape)
}

fn write_exports(config: &ReportConfig, scrape: &pipeline::ScrapeOutput) -> Result<(), AppError> {
    let records = &scrape.merged.records;
    if let Some(path) = &config.export_csv {
        crate::io::write_merged_csv(path, records)?;
        info!(path = %path.display(), rows = records.len(), "wrote CSV export");
    }
    if let Some(path) = &config.export_json {
        let dataset = crate::io::build_dataset(&scrape.sources, records);
        crate::io::write_dataset_json(path, &dataset)?;
        info!(path = %path.display(), rows = records.len(), "wrote dataset JSON");
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    validate_degree(args.degree)?;
    validate_plot_size(args.width, args.height)?;

    let dataset = crate::io::read_dataset_json(&args.dataset)?;
    let analysis = crate::analysis::analyze(&dataset.records, args.degree)?;

    println!("{}", crate::report::format::format_dataset_summary(&dataset));
    println!("{}", crate::report::format::format_analysis(&analysis));
    println!(
        "{}",
        crate::plot::ascii::render_all(&dataset.records, &analysis, args.width, args.height)
    );
    if let Some(dir) = &args.plot_dir {
        crate::plot::svg::write_all(dir, &dataset.records, &analysis)?;
    }
    Ok(())
}

/// Build and validate the run configuration.
pub fn report_config_from_args(args: &ReportArgs) -> Result<ReportConfig, AppError> {
    validate_degree(args.degree)?;
    validate_plot_size(args.width, args.height)?;

    Ok(ReportConfig {
        sources: SourceUrls {
            stats: args.stats_url.clone(),
            usage: args.usage_url.clone(),
            types: args.types_url.clone(),
        },
        top_n: args.top,
        degree: args.degree,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        plot_dir: args.plot_dir.clone(),
    })
}

fn validate_degree(degree: usize) -> Result<(), AppError> {
    if !(1..=MAX_DEGREE).contains(&degree) {
        return Err(AppError::config(format!(
            "--degree must be between 1 and {MAX_DEGREE} (got {degree})"
        )));
    }
    Ok(())
}

fn validate_plot_size(width: usize, height: usize) -> Result<(), AppError> {
    if width < MIN_WIDTH {
        return Err(AppError::config(format!("--width must be at least {MIN_WIDTH} (got {width})")));
    }
    if height < MIN_HEIGHT {
        return Err(AppError::config(format!(
            "--height must be at least {MIN_HEIGHT} (got {height})"
        )));
    }
    Ok(())
}

/// Rewrite argv so `pku` defaults to `pku report`.
///
/// Rules:
/// - `pku`                      -> `pku report`
/// - `pku --top 10 ...`         -> `pku report --top 10 ...`
/// - `pku --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "dataset" | "plot");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
    }
    argv
}
