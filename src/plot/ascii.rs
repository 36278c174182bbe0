//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observations: `o`
//! - fitted curve: `-` line
//! - boxplots: `-` whiskers, `[=|=]` box with median, `o` outliers

use crate::analysis::{Analysis, BoxStats, Column, PolyFit};
use crate::domain::{MergedRecord, StatKind};

/// Width of the label column in boxplot rows.
const BOX_LABEL_WIDTH: usize = 12;

/// All five terminal plots, separated by blank lines.
pub fn render_all(
    records: &[MergedRecord],
    analysis: &Analysis,
    width: usize,
    height: usize,
) -> String {
    [
        render_rank_vs_total(records, &analysis.total_fit, width, height),
        render_rank_vs_stats(records, width, height),
        render_rank_vs_standardized(records, width, height),
        render_boxplots("Rank by primary type", &analysis.by_type1, width),
        render_boxplots("Rank by secondary type presence", &analysis.by_has_type2, width),
    ]
    .join("\n")
}

/// Rank against base stat total, with the polynomial trend.
pub fn render_rank_vs_total(
    records: &[MergedRecord],
    fit: &PolyFit,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let xs = Column::Total.values(records);
    let ys = Column::Rank.values(records);
    let curve = range(&xs).map(|(lo, hi)| sample_curve(|x| fit.predict(x), lo, hi, width));
    let lines = scatter_lines(
        &format!("Rank vs Total (degree {})", fit.degree),
        &xs,
        &ys,
        curve.as_deref(),
        width,
        height,
    );
    lines.join("\n") + "\n"
}

/// Six-panel grid: rank against each raw stat.
pub fn render_rank_vs_stats(records: &[MergedRecord], width: usize, height: usize) -> String {
    let cols: Vec<Column> = StatKind::ALL.iter().map(|&k| Column::Stat(k)).collect();
    render_panel_grid("Rank vs base stats", records, &cols, width, height)
}

/// Six-panel grid: rank against each standardized stat.
pub fn render_rank_vs_standardized(
    records: &[MergedRecord],
    width: usize,
    height: usize,
) -> String {
    let cols: Vec<Column> = StatKind::ALL.iter().map(|&k| Column::Standardized(k)).collect();
    render_panel_grid("Rank vs standardized stats", records, &cols, width, height)
}

/// Horizontal boxplots on a shared rank axis, one row per group.
pub fn render_boxplots(title: &str, groups: &[BoxStats], width: usize) -> String {
    let width = width.max(10);
    let (lo, hi) = box_range(groups).unwrap_or((0.0, 1.0));

    let mut out = String::new();
    out.push_str(&format!("{title}: rank=[{lo:.1}, {hi:.1}]\n"));

    for g in groups {
        let mut track = vec![' '; width];
        let col = |v: f64| map_x(v, lo, hi, width);

        for c in col(g.lower)..=col(g.upper) {
            track[c] = '-';
        }
        for c in col(g.q1)..=col(g.q3) {
            track[c] = '=';
        }
        track[col(g.q1)] = '[';
        track[col(g.q3)] = ']';
        track[col(g.median)] = '|';
        for &o in &g.outliers {
            track[col(o)] = 'o';
        }

        out.push_str(&format!(
            "{:<w$} {}\n",
            truncate(&g.label, BOX_LABEL_WIDTH),
            track.into_iter().collect::<String>(),
            w = BOX_LABEL_WIDTH
        ));
    }
    out
}

/// Panels are laid out three per row, two rows, separated by ` | `.
fn render_panel_grid(
    title: &str,
    records: &[MergedRecord],
    cols: &[Column],
    width: usize,
    height: usize,
) -> String {
    let panel_w = (width.saturating_sub(6) / 3).max(10);
    let panel_h = (height / 2).max(5);
    let ys = Column::Rank.values(records);

    let panels: Vec<Vec<String>> = cols
        .iter()
        .map(|c| scatter_lines(&c.label(), &c.values(records), &ys, None, panel_w, panel_h))
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));
    for row in panels.chunks(3) {
        let n_lines = row.iter().map(|p| p.len()).max().unwrap_or(0);
        for i in 0..n_lines {
            let cells: Vec<String> = row
                .iter()
                .map(|p| pad(p.get(i).map(String::as_str).unwrap_or(""), panel_w))
                .collect();
            out.push_str(cells.join(" | ").trim_end());
            out.push('\n');
        }
    }
    out
}

/// Header line plus `height` grid rows, each exactly `width` chars.
fn scatter_lines(
    title: &str,
    xs: &[f64],
    ys: &[f64],
    curve: Option<&[(f64, f64)]>,
    width: usize,
    height: usize,
) -> Vec<String> {
    let width = width.max(2);
    let height = height.max(2);

    let (x_min, x_max) = range(xs).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(ys, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    if let Some(curve) = curve {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }
    for (&x, &y) in xs.iter().zip(ys) {
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        grid[cy][cx] = 'o';
    }

    let mut lines = Vec::with_capacity(height + 1);
    lines.push(format!(
        "{title}: x=[{}, {}] | y=[{y_min:.1}, {y_max:.1}]",
        fmt_axis(x_min),
        fmt_axis(x_max)
    ));
    lines.extend(grid.into_iter().map(|row| row.into_iter().collect::<String>()));
    lines
}

fn sample_curve(f: impl Fn(f64) -> f64, lo: f64, hi: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = lo + u * (hi - lo);
            (x, f(x))
        })
        .filter(|(_, y)| y.is_finite())
        .collect()
}

fn range(values: &[f64]) -> Option<(f64, f64)> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn y_range(ys: &[f64], curve: Option<&[(f64, f64)]>) -> Option<(f64, f64)> {
    let mut all: Vec<f64> = ys.to_vec();
    if let Some(curve) = curve {
        all.extend(curve.iter().map(|&(_, y)| y));
    }
    range(&all)
}

fn box_range(groups: &[BoxStats]) -> Option<(f64, f64)> {
    let mut all = Vec::new();
    for g in groups {
        all.push(g.lower);
        all.push(g.upper);
        all.extend(g.outliers.iter().copied());
    }
    range(&all)
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y_max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, cx, cy, '-'),
            None => grid[cy][cx] = '-',
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn fmt_axis(v: f64) -> String {
    if v.abs() < 1.0 { format!("{v:.3}") } else { format!("{v:.0}") }
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::roster;
    use pretty_assertions::assert_eq;

    #[test]
    fn scatter_golden_snapshot_small() {
        let xs = [300.0, 500.0, 700.0];
        let ys = [30.0, 20.0, 10.0];
        let curve = sample_curve(|x| 30.0 - 0.05 * (x - 300.0), 300.0, 700.0, 9);

        let txt = scatter_lines("Rank vs Total", &xs, &ys, Some(&curve), 9, 5).join("\n");
        let expected = [
            "Rank vs Total: x=[300, 700] | y=[9.0, 31.0]",
            "o        ",
            " --      ",
            "   -o-   ",
            "      -- ",
            "        o",
        ]
        .join("\n");
        assert_eq!(txt, expected);
    }

    #[test]
    fn boxplot_golden_snapshot() {
        let groups = vec![
            BoxStats {
                label: "Water".to_string(),
                n: 9,
                lower: 1.0,
                q1: 3.0,
                median: 5.0,
                q3: 7.0,
                upper: 9.0,
                outliers: vec![11.0],
            },
            BoxStats {
                label: "Fire".to_string(),
                n: 4,
                lower: 2.0,
                q1: 2.0,
                median: 3.0,
                q3: 4.0,
                upper: 6.0,
                outliers: vec![],
            },
        ];
        let expected = concat!(
            "Rank by primary type: rank=[1.0, 11.0]\n",
            "Water        --[=|=]-- o\n",
            "Fire          [|]--     \n",
        );
        assert_eq!(render_boxplots("Rank by primary type", &groups, 11), expected);
    }

    #[test]
    fn panel_grid_has_two_rows_of_three() {
        let records = roster();
        let txt = render_rank_vs_stats(&records, 66, 10);
        let lines: Vec<&str> = txt.lines().collect();

        // title + 2 * (panel header + 5 rows)
        assert_eq!(lines.len(), 1 + 2 * 6);
        assert!(lines[1].starts_with("HP: x=[55, 135]"));
        assert!(lines[1].contains(" | Atk: "));
        assert!(lines[7].starts_with("SpA: "));
        assert!(lines[7].contains(" | Speed: "));
    }

    #[test]
    fn total_plot_draws_every_point() {
        let records = roster();
        let analysis = crate::analysis::analyze(&records, 2).unwrap();
        let txt = render_rank_vs_total(&records, &analysis.total_fit, 60, 20);
        assert!(txt.starts_with("Rank vs Total (degree 2): x=["));
        assert!(txt.lines().count() == 21);
        assert!(txt.contains('o'));
    }

    #[test]
    fn total_plot_clamps_tiny_sizes() {
        let records = roster();
        let analysis = crate::analysis::analyze(&records, 2).unwrap();
        let txt = render_rank_vs_total(&records, &analysis.total_fit, 3, 1);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.chars().count() == 10));
    }
}
