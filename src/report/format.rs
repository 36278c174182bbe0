//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the parsing/analysis code stays clean and testable
//! - output changes are localized (the tests below pin the layouts)

use crate::analysis::{Analysis, BoxStats, ColumnSummary, Correlation, PolyFit, Regression};
use crate::data::MergeSummary;
use crate::domain::{DatasetFile, MergedRecord, SourceUrls};

/// Run summary for a live report: sources, stage counts, join bookkeeping.
pub fn format_run_summary(
    sources: &SourceUrls,
    merge: &MergeSummary,
    battles: Option<u64>,
) -> String {
    let mut out = String::new();

    out.push_str("=== pku - usage rank vs base stats ===\n");
    out.push_str(&format!("Stats : {}\n", sources.stats));
    out.push_str(&format!("Usage : {}\n", sources.usage));
    out.push_str(&format!("Types : {}\n", sources.types));
    if let Some(b) = battles {
        out.push_str(&format!("Battles: {b}\n"));
    }

    out.push_str(&format!(
        "Rows: stats={} | usage={} | types={} | merged={}\n",
        merge.stat_rows, merge.usage_rows, merge.type_rows, merge.merged_rows
    ));
    if !merge.unmatched_usage.is_empty() {
        out.push_str(&format!(
            "Dropped usage names ({}): {}\n",
            merge.unmatched_usage.len(),
            merge.unmatched_usage.join(", ")
        ));
    }
    if !merge.duplicate_names.is_empty() {
        out.push_str(&format!(
            "Duplicate join keys ({}): {}\n",
            merge.duplicate_names.len(),
            merge.duplicate_names.join(", ")
        ));
    }
    out.push('\n');
    out
}

/// Run summary for a re-plot from a saved dataset.
pub fn format_dataset_summary(dataset: &DatasetFile) -> String {
    let mut out = String::new();
    out.push_str("=== pku - usage rank vs base stats (saved dataset) ===\n");
    out.push_str(&format!(
        "Generated: {} by {}\n",
        dataset.generated_at.to_rfc3339(),
        dataset.tool
    ));
    out.push_str(&format!("Stats : {}\n", dataset.stats_url));
    out.push_str(&format!("Usage : {}\n", dataset.usage_url));
    out.push_str(&format!("Types : {}\n", dataset.types_url));
    out.push_str(&format!("Rows: merged={}\n\n", dataset.records.len()));
    out
}

/// Merged rows as a fixed-width table.
pub fn format_merged_table(rows: &[MergedRecord]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:>5} {:<20} {:<9} {:<9} {:>4} {:>4} {:>4} {:>4} {:>4} {:>4} {:>5} {:>8}",
            "rank",
            "name",
            "type1",
            "type2",
            "HP",
            "Atk",
            "Def",
            "SpA",
            "SpD",
            "Spe",
            "Total",
            "usage%"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<5} {:-<20} {:-<9} {:-<9} {:-<4} {:-<4} {:-<4} {:-<4} {:-<4} {:-<4} {:-<5} {:-<8}",
            "", "", "", "", "", "", "", "", "", "", "", ""
        ),
    );

    for r in rows {
        let s = &r.stats;
        push_line(
            &mut out,
            format!(
                "{:>5} {:<20} {:<9} {:<9} {:>4} {:>4} {:>4} {:>4} {:>4} {:>4} {:>5} {:>8.3}",
                r.usage.rank,
                truncate(&r.name, 20),
                r.type1.name(),
                r.type2.map(|t| t.name()).unwrap_or("-"),
                s.hp,
                s.atk,
                s.def,
                s.spa,
                s.spd,
                s.speed,
                s.total,
                r.usage.usage_percent * 100.0,
            ),
        );
    }
    out
}

/// Every analysis section, in report order.
pub fn format_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str("Descriptive statistics:\n");
    out.push_str(&format_summaries(&analysis.summaries));
    out.push('\n');

    out.push_str("Correlation with usage rank (Pearson):\n");
    out.push_str(&format_correlations(&analysis.correlations));
    out.push('\n');

    out.push_str(&format_poly_fit(&analysis.total_fit));
    out.push('\n');
    out.push_str(&format_regression(&analysis.stats_fit));
    out.push('\n');
    out.push_str(&format_regression(&analysis.standardized_fit));
    out.push('\n');

    out.push_str("Usage rank by primary type:\n");
    out.push_str(&format_groups(&analysis.by_type1));
    out.push('\n');
    out.push_str("Usage rank by secondary type presence:\n");
    out.push_str(&format_groups(&analysis.by_has_type2));
    out
}

pub fn format_summaries(rows: &[ColumnSummary]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<8} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "column", "n", "mean", "sd", "min", "q1", "median", "q3", "max"
        ),
    );
    push_line(&mut out, rule(&[8, 5, 10, 10, 10, 10, 10, 10, 10]));
    for s in rows {
        push_line(
            &mut out,
            format!(
                "{:<8} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                s.label,
                s.n,
                fmt_num(s.mean),
                fmt_num(s.sd),
                fmt_num(s.min),
                fmt_num(s.q1),
                fmt_num(s.median),
                fmt_num(s.q3),
                fmt_num(s.max),
            ),
        );
    }
    out
}

pub fn format_correlations(rows: &[Correlation]) -> String {
    let mut out = String::new();
    push_line(&mut out, format!("{:<8} {:>8}", "column", "r"));
    push_line(&mut out, rule(&[8, 8]));
    for c in rows {
        let r = c.r.map(|v| format!("{v:.4}")).unwrap_or_else(|| "n/a".to_string());
        push_line(&mut out, format!("{:<8} {:>8}", c.column, r));
    }
    out
}

/// Coefficient table plus fit statistics.
pub fn format_regression(fit: &Regression) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", fit.label));
    push_line(
        &mut out,
        format!("{:<12} {:>12} {:>12} {:>9}", "term", "estimate", "std.error", "t value"),
    );
    push_line(&mut out, rule(&[12, 12, 12, 9]));
    for c in &fit.coefficients {
        push_line(
            &mut out,
            format!(
                "{:<12} {:>12} {:>12} {:>9.3}",
                truncate(&c.term, 12),
                fmt_num(c.estimate),
                fmt_num(c.std_error),
                c.t_value
            ),
        );
    }
    out.push_str(&format!(
        "R2={:.4} adjR2={:.4} sigma={:.3} n={} df={}{}\n",
        fit.r_squared,
        fit.adj_r_squared,
        fit.sigma,
        fit.n,
        fit.df,
        if fit.intercept { "" } else { " (no intercept)" }
    ));
    out
}

pub fn format_poly_fit(fit: &PolyFit) -> String {
    let mut out = format_regression(&fit.model);
    out.push_str(&format!(
        "z = (Total - {:.3}) / {:.3}\n",
        fit.center, fit.scale
    ));
    out
}

pub fn format_groups(groups: &[BoxStats]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<12} {:>4} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "group", "n", "lower", "q1", "median", "q3", "upper", "outliers"
        ),
    );
    push_line(&mut out, rule(&[12, 4, 8, 8, 8, 8, 8, 8]));
    for g in groups {
        push_line(
            &mut out,
            format!(
                "{:<12} {:>4} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8}",
                truncate(&g.label, 12),
                g.n,
                g.lower,
                g.q1,
                g.median,
                g.q3,
                g.upper,
                g.outliers.len()
            ),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn rule(widths: &[usize]) -> String {
    let parts: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    parts.join(" ")
}

/// Fixed precision scaled to the magnitude; ratios need more digits than stats.
fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    if v.abs() >= 1000.0 {
        format!("{v:.1}")
    } else if v.abs() >= 1.0 {
        format!("{v:.3}")
    } else {
        format!("{v:.5}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
