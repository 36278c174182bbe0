//! HTML table extraction built on `lol_html`.
//!
//! The scraped pages are only ever read for their `<table>` nodes. We stream the
//! document once, collect every table in document order (nested tables get their
//! own entry, in the order their start tags appear), and then materialize each
//! one into a rectangular grid of cell texts:
//!
//! - `colspan`/`rowspan` cells repeat their text into every slot they cover
//! - HTML entities are decoded and whitespace is collapsed
//! - `<br>` inside a cell becomes a single space
//!
//! The first all-`<th>` row becomes the header; later rows with at least one
//! `<td>` are data rows.

use std::cell::RefCell;
use std::rc::Rc;

use html_escape::decode_html_entities;
use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, OutputSink, Settings, doc_text, element};
use tracing::warn;

use crate::error::AppError;

/// Upper bound on `colspan`/`rowspan` values we honour.
const MAX_SPAN: usize = 64;

/// A parsed table: header labels plus data rows of cell text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Which of several columns sharing a label to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Zero-based match in header order.
    Nth(usize),
    /// Rightmost match, however many columns the label spans.
    Last,
}

/// A column located by header label, with a fixed-offset fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header label to look for (compared trimmed, case-insensitive).
    pub label: &'static str,
    pub occurrence: Occurrence,
    /// Column index to use when the header lookup fails.
    pub fallback: usize,
}

impl ColumnSpec {
    pub const fn new(label: &'static str, occurrence: usize, fallback: usize) -> Self {
        Self {
            label,
            occurrence: Occurrence::Nth(occurrence),
            fallback,
        }
    }

    pub const fn last(label: &'static str, fallback: usize) -> Self {
        Self {
            label,
            occurrence: Occurrence::Last,
            fallback,
        }
    }
}

impl HtmlTable {
    /// Index of the `occurrence`-th column labelled `label`.
    pub fn find_column(&self, label: &str, occurrence: usize) -> Option<usize> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, h)| labels_match(h, label))
            .map(|(idx, _)| idx)
            .nth(occurrence)
    }

    /// Index of the rightmost column labelled `label`.
    pub fn find_last_column(&self, label: &str) -> Option<usize> {
        self.header.iter().rposition(|h| labels_match(h, label))
    }

    /// True when every label appears somewhere in the header.
    pub fn has_labels(&self, labels: &[&str]) -> bool {
        labels
            .iter()
            .all(|label| self.header.iter().any(|h| labels_match(h, label)))
    }

    /// Resolve a column by header, falling back to its fixed offset.
    pub fn resolve(&self, spec: &ColumnSpec) -> usize {
        let found = match spec.occurrence {
            Occurrence::Nth(n) => self.find_column(spec.label, n),
            Occurrence::Last => self.find_last_column(spec.label),
        };
        match found {
            Some(idx) => idx,
            None => {
                warn!(
                    label = spec.label,
                    occurrence = ?spec.occurrence,
                    fallback = spec.fallback,
                    "header label not found, using fixed column offset"
                );
                spec.fallback
            }
        }
    }

    /// Cell text at `(row, col)`; missing cells read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn labels_match(header: &str, label: &str) -> bool {
    header.trim().to_lowercase() == label.trim().to_lowercase()
}

/// Parse every `<table>` in `html`, in document order.
pub fn extract_tables(html: &str) -> Result<Vec<HtmlTable>, AppError> {
    let collector = Rc::new(RefCell::new(Collector::default()));

    let table_state = Rc::clone(&collector);
    let table_handler = element!("table", move |el: &mut Element<'_, '_>| {
        let mut state = table_state.borrow_mut();
        let index = state.next_index;
        state.next_index += 1;
        state.open.push((index, RawTable::default()));
        drop(state);

        let end_state = Rc::clone(&table_state);
        if let Some(handlers) = el.end_tag_handlers() {
            handlers.push(Box::new(move |end| {
                let _ = end;
                end_state.borrow_mut().close_table();
                Ok(())
            }));
        }
        Ok(())
    });

    let row_state = Rc::clone(&collector);
    let row_handler = element!("tr", move |_el: &mut Element<'_, '_>| {
        if let Some(table) = row_state.borrow_mut().current() {
            table.rows.push(Vec::new());
            table.cell_open = false;
        }
        Ok(())
    });

    let td_state = Rc::clone(&collector);
    let td_handler = element!("td", move |el: &mut Element<'_, '_>| {
        open_cell(&td_state, el, false);
        Ok(())
    });

    let th_state = Rc::clone(&collector);
    let th_handler = element!("th", move |el: &mut Element<'_, '_>| {
        open_cell(&th_state, el, true);
        Ok(())
    });

    let br_state = Rc::clone(&collector);
    let br_handler = element!("br", move |_el: &mut Element<'_, '_>| {
        br_state.borrow_mut().push_text(" ");
        Ok(())
    });

    let text_state = Rc::clone(&collector);
    let text_handler = doc_text!(move |chunk| {
        text_state.borrow_mut().push_text(chunk.as_str());
        Ok(())
    });

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                table_handler,
                row_handler,
                td_handler,
                th_handler,
                br_handler,
            ],
            document_content_handlers: vec![text_handler],
            ..Settings::default()
        },
        NoopSink,
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| AppError::integrity(format!("HTML rewrite error: {e}")))?;
    rewriter
        .end()
        .map_err(|e| AppError::integrity(format!("HTML rewrite error: {e}")))?;

    let collector = Rc::try_unwrap(collector)
        .map_err(|_| AppError::integrity("HTML table collector still in use"))?
        .into_inner();

    Ok(collector.finish())
}

fn open_cell(state: &Rc<RefCell<Collector>>, el: &mut Element<'_, '_>, header: bool) {
    let colspan = span_attr(el.get_attribute("colspan"));
    let rowspan = span_attr(el.get_attribute("rowspan"));

    {
        let mut collector = state.borrow_mut();
        let Some(table) = collector.current() else {
            return;
        };
        if table.rows.is_empty() {
            // Cells before any <tr> (sloppy markup) start an implicit row.
            table.rows.push(Vec::new());
        }
        if let Some(row) = table.rows.last_mut() {
            row.push(RawCell {
                text: String::new(),
                colspan,
                rowspan,
                header,
            });
        }
        table.cell_open = true;
    }

    let end_state = Rc::clone(state);
    if let Some(handlers) = el.end_tag_handlers() {
        handlers.push(Box::new(move |end| {
            let _ = end;
            if let Some(table) = end_state.borrow_mut().current() {
                table.cell_open = false;
            }
            Ok(())
        }));
    }
}

fn span_attr(value: Option<String>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
        .min(MAX_SPAN)
}

#[derive(Default)]
struct Collector {
    next_index: usize,
    /// Tables whose end tag has not been seen yet (innermost last).
    open: Vec<(usize, RawTable)>,
    closed: Vec<(usize, RawTable)>,
}

impl Collector {
    fn current(&mut self) -> Option<&mut RawTable> {
        self.open.last_mut().map(|(_, t)| t)
    }

    fn close_table(&mut self) {
        if let Some(entry) = self.open.pop() {
            self.closed.push(entry);
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(table) = self.current() else { return };
        if !table.cell_open {
            return;
        }
        if let Some(cell) = table.rows.last_mut().and_then(|r| r.last_mut()) {
            cell.text.push_str(text);
        }
    }

    fn finish(mut self) -> Vec<HtmlTable> {
        // Unclosed tables at EOF still count.
        while let Some(entry) = self.open.pop() {
            self.closed.push(entry);
        }
        self.closed.sort_by_key(|(idx, _)| *idx);
        self.closed
            .into_iter()
            .map(|(_, raw)| materialize(raw))
            .collect()
    }
}

#[derive(Default)]
struct RawTable {
    rows: Vec<Vec<RawCell>>,
    cell_open: bool,
}

struct RawCell {
    text: String,
    colspan: usize,
    rowspan: usize,
    header: bool,
}

struct GridCell {
    text: String,
    header: bool,
}

/// A rowspan cell still covering rows below the one it started in.
struct Span {
    text: String,
    header: bool,
    rows_left: usize,
}

fn materialize(raw: RawTable) -> HtmlTable {
    let mut grid: Vec<Vec<GridCell>> = Vec::with_capacity(raw.rows.len());
    let mut pending: Vec<Option<Span>> = Vec::new();

    for raw_row in raw.rows {
        let mut out: Vec<GridCell> = Vec::new();
        let mut cells = raw_row.into_iter();

        loop {
            let col = out.len();

            if let Some(span) = pending.get_mut(col).and_then(Option::take) {
                out.push(GridCell {
                    text: span.text.clone(),
                    header: span.header,
                });
                if span.rows_left > 1 {
                    pending[col] = Some(Span {
                        rows_left: span.rows_left - 1,
                        ..span
                    });
                }
                continue;
            }

            let Some(cell) = cells.next() else {
                if pending.iter().skip(col).any(Option::is_some) {
                    out.push(GridCell {
                        text: String::new(),
                        header: false,
                    });
                    continue;
                }
                break;
            };

            let text = clean_text(&cell.text);
            for _ in 0..cell.colspan {
                let col = out.len();
                if cell.rowspan > 1 {
                    if pending.len() <= col {
                        pending.resize_with(col + 1, || None);
                    }
                    pending[col] = Some(Span {
                        text: text.clone(),
                        header: cell.header,
                        rows_left: cell.rowspan - 1,
                    });
                }
                out.push(GridCell {
                    text: text.clone(),
                    header: cell.header,
                });
            }
        }

        if !out.is_empty() {
            grid.push(out);
        }
    }

    let header_idx = grid
        .iter()
        .position(|row| row.iter().all(|c| c.header))
        .unwrap_or(0);

    let mut table = HtmlTable::default();
    for (idx, row) in grid.into_iter().enumerate() {
        if idx == header_idx {
            table.header = row.into_iter().map(|c| c.text).collect();
        } else if idx > header_idx && row.iter().any(|c| !c.header) {
            table.rows.push(row.into_iter().map(|c| c.text).collect());
        }
    }
    table
}

fn clean_text(raw: &str) -> String {
    let decoded = decode_html_entities(raw);
    let mut out = String::with_capacity(decoded.len());
    for word in decoded.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_header_and_rows() {
        let html = r#"
        <p>intro</p>
        <table>
          <tr><th>#</th><th>Name</th></tr>
          <tr><td>1</td><td>Bulbasaur</td></tr>
          <tr><td>4</td><td>Charmander &amp; co</td></tr>
        </table>
        <p>outro</p>
        "#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].header, vec!["#", "Name"]);
        assert_eq!(
            tables[0].rows,
            vec![vec!["1", "Bulbasaur"], vec!["4", "Charmander & co"]]
        );
    }

    #[test]
    fn colspan_repeats_cell_text() {
        let html = r#"<table>
          <tr><th>Pokémon</th><th colspan="2">Type</th></tr>
          <tr><td>Ditto</td><td colspan="2">Normal</td></tr>
          <tr><td>Bulbasaur</td><td>Grass</td><td>Poison</td></tr>
        </table>"#;
        let t = &extract_tables(html).unwrap()[0];
        assert_eq!(t.header, vec!["Pokémon", "Type", "Type"]);
        assert_eq!(t.rows[0], vec!["Ditto", "Normal", "Normal"]);
        assert_eq!(t.rows[1], vec!["Bulbasaur", "Grass", "Poison"]);
        assert_eq!(t.find_column("type", 1), Some(2));
    }

    #[test]
    fn rowspan_keeps_columns_aligned() {
        let html = r#"<table>
          <tr><th>Ndex</th><th>Pokémon</th><th>Type</th></tr>
          <tr><td rowspan="2">#0052</td><td>Meowth</td><td>Normal</td></tr>
          <tr><td>Meowth Alolan Form</td><td>Dark</td></tr>
        </table>"#;
        let t = &extract_tables(html).unwrap()[0];
        assert_eq!(t.rows[1], vec!["#0052", "Meowth Alolan Form", "Dark"]);
    }

    #[test]
    fn nested_tables_are_listed_in_start_order() {
        let html = r#"<table>
          <tr><th>Outer</th></tr>
          <tr><td><table><tr><th>Inner</th></tr><tr><td>x</td></tr></table></td></tr>
        </table>
        <table><tr><th>Last</th></tr><tr><td>y</td></tr></table>"#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].header, vec!["Outer"]);
        assert_eq!(tables[1].header, vec!["Inner"]);
        assert_eq!(tables[1].rows, vec![vec!["x"]]);
        assert_eq!(tables[2].header, vec!["Last"]);
    }

    #[test]
    fn br_and_whitespace_are_normalized() {
        let html = "<table><tr><th>Name</th></tr><tr><td>\n  Meowth<br><small>Galarian\u{a0}Form</small> </td></tr></table>";
        let t = &extract_tables(html).unwrap()[0];
        assert_eq!(t.cell(0, 0), "Meowth Galarian Form");
        assert_eq!(t.cell(0, 5), "");
    }

    #[test]
    fn resolve_falls_back_to_fixed_offset() {
        let t = HtmlTable {
            header: vec!["a".to_string(), "b".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(t.resolve(&ColumnSpec::new("B", 0, 9)), 1);
        assert_eq!(t.resolve(&ColumnSpec::new("missing", 0, 9)), 9);
        assert_eq!(t.resolve(&ColumnSpec::new("b", 1, 9)), 9);
        assert_eq!(t.resolve(&ColumnSpec::last("b", 9)), 1);
        assert_eq!(t.resolve(&ColumnSpec::last("missing", 9)), 9);
        assert!(t.has_labels(&["a", "b"]));
        assert!(!t.has_labels(&["a", "c"]));
    }
}
