//! SVG charts rendered with Plotters.
//!
//! The five files mirror the terminal plots one-to-one. Bounds and series are
//! computed before any drawing so the draw functions only draw.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::analysis::{Analysis, BoxStats, Column, PolyFit};
use crate::domain::{MergedRecord, StatKind};
use crate::error::AppError;

pub const RANK_VS_TOTAL: &str = "rank_vs_total.svg";
pub const RANK_VS_STATS: &str = "rank_vs_stats.svg";
pub const RANK_VS_STANDARDIZED: &str = "rank_vs_standardized.svg";
pub const RANK_BY_TYPE1: &str = "rank_by_type1.svg";
pub const RANK_BY_HAS_TYPE2: &str = "rank_by_has_type2.svg";

const SINGLE_SIZE: (u32, u32) = (800, 600);
const GRID_SIZE: (u32, u32) = (1200, 800);

const POINT_COLOR: RGBColor = RGBColor(31, 119, 180);
const CURVE_COLOR: RGBColor = RGBColor(214, 39, 40);
const BOX_COLOR: RGBColor = RGBColor(158, 202, 225);

type DrawResult = Result<(), Box<dyn Error>>;

/// Write all five charts into `dir` (created if missing). Returns the written paths.
pub fn write_all(
    dir: &Path,
    records: &[MergedRecord],
    analysis: &Analysis,
) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| {
            AppError::io(format!(
                "Failed to create plot directory {}: {e}",
                dir.display()
            ))
        })?;

    let stats: Vec<Column> = StatKind::ALL.iter().map(|&k| Column::Stat(k)).collect();
    let standardized: Vec<Column> = StatKind::ALL
        .iter()
        .map(|&k| Column::Standardized(k))
        .collect();

    let path = dir.join(RANK_VS_TOTAL);
    let total = finish(draw_rank_vs_total(&path, records, &analysis.total_fit), path)?;
    let path = dir.join(RANK_VS_STATS);
    let raw = finish(draw_panels(&path, "Usage rank vs base stats", records, &stats), path)?;
    let path = dir.join(RANK_VS_STANDARDIZED);
    let ratios = finish(
        draw_panels(&path, "Usage rank vs standardized stats", records, &standardized),
        path,
    )?;
    let path = dir.join(RANK_BY_TYPE1);
    let type1 = finish(
        draw_boxplots(&path, "Usage rank by primary type", &analysis.by_type1),
        path,
    )?;
    let path = dir.join(RANK_BY_HAS_TYPE2);
    let type2 = finish(
        draw_boxplots(&path, "Usage rank by secondary type presence", &analysis.by_has_type2),
        path,
    )?;

    Ok(vec![total, raw, ratios, type1, type2])
}

fn finish(result: DrawResult, path: PathBuf) -> Result<PathBuf, AppError> {
    result.map_err(|e| AppError::io(format!("Failed to render {}: {e}", path.display())))?;
    info!(path = %path.display(), "wrote plot");
    Ok(path)
}

fn draw_rank_vs_total(path: &Path, records: &[MergedRecord], fit: &PolyFit) -> DrawResult {
    let root = SVGBackend::new(path, SINGLE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let points = points_for(records, Column::Total);
    let (x0, x1) = bounds(points.iter().map(|p| p.0));
    let curve: Vec<(f64, f64)> = (0..=200)
        .map(|i| {
            let x = x0 + (x1 - x0) * f64::from(i) / 200.0;
            (x, fit.predict(x))
        })
        .filter(|(_, y)| y.is_finite())
        .collect();
    let (y0, y1) = bounds(points.iter().map(|p| p.1).chain(curve.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Usage rank vs base stat total (degree {})", fit.degree),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart.configure_mesh().x_desc("Total").y_desc("Rank").draw()?;

    chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, POINT_COLOR.filled())))?;
    chart.draw_series(LineSeries::new(curve, CURVE_COLOR.stroke_width(2)))?;

    root.present()?;
    Ok(())
}

fn draw_panels(path: &Path, title: &str, records: &[MergedRecord], cols: &[Column]) -> DrawResult {
    let root = SVGBackend::new(path, GRID_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;

    for (area, col) in root.split_evenly((2, 3)).iter().zip(cols) {
        let points = points_for(records, *col);
        let (x0, x1) = bounds(points.iter().map(|p| p.0));
        let (y0, y1) = bounds(points.iter().map(|p| p.1));

        let mut chart = ChartBuilder::on(area)
            .caption(col.label(), ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart.configure_mesh().x_labels(5).y_labels(5).y_desc("Rank").draw()?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 2, POINT_COLOR.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Vertical boxplots, one per group, on a categorical x axis.
fn draw_boxplots(path: &Path, title: &str, groups: &[BoxStats]) -> DrawResult {
    let root = SVGBackend::new(path, SINGLE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y0, y1) = bounds(
        groups
            .iter()
            .flat_map(|g| [g.lower, g.upper].into_iter().chain(g.outliers.iter().copied())),
    );
    let n = groups.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..n - 0.5, y0..y1)?;

    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len().max(1))
        .x_label_formatter(&|v| {
            let i = v.round();
            if (v - i).abs() < 1e-6 && i >= 0.0 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("Rank")
        .draw()?;

    let half = 0.3;
    for (i, g) in groups.iter().enumerate() {
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, g.q1), (x + half, g.q3)],
            BOX_COLOR.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, g.q1), (x + half, g.q3)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series([
            PathElement::new(
                vec![(x - half, g.median), (x + half, g.median)],
                BLACK.stroke_width(2),
            ),
            PathElement::new(vec![(x, g.q3), (x, g.upper)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x, g.q1), (x, g.lower)], BLACK.stroke_width(1)),
            PathElement::new(
                vec![(x - half / 2.0, g.upper), (x + half / 2.0, g.upper)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![(x - half / 2.0, g.lower), (x + half / 2.0, g.lower)],
                BLACK.stroke_width(1),
            ),
        ])?;
        chart.draw_series(
            g.outliers
                .iter()
                .map(|&o| Circle::new((x, o), 3, BLACK.stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}

fn points_for(records: &[MergedRecord], x: Column) -> Vec<(f64, f64)> {
    records.iter().map(|r| (x.value(r), Column::Rank.value(r))).collect()
}

/// Padded `[min, max]`; a degenerate range is widened to unit span.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}
