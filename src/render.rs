//! Plain-text rendering of the grid for the terminal.
//!
//! Column widths are stored in pixels (the unit the layout store uses);
//! the text renderer maps them to character cells.

use crate::layout::ColumnLayout;
use crate::model::SortState;
use crate::query::SortDirection;
use crate::result_set::ResultSet;

pub const PIXELS_PER_CHAR: u32 = 8;
const MIN_CHARS: usize = 4;

fn char_width(pixels: u32) -> usize {
    ((pixels / PIXELS_PER_CHAR) as usize).max(MIN_CHARS)
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{:<width$}", text, width = width)
    } else {
        let mut s: String = text.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

/// Render the visible columns of `results` as a fixed-width table.
///
/// `columns` must be the resolved layout for `results.fields()`, in the same
/// order. `sort` marks the sorted column in the header.
pub fn render_grid(results: &ResultSet, columns: &[ColumnLayout], sort: Option<SortState>) -> String {
    let visible: Vec<(usize, &ColumnLayout)> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.hidden)
        .collect();

    let mut out = String::new();
    if visible.is_empty() {
        out.push_str("(no visible columns; use --all-columns or `flubber columns set`)\n");
    } else {
        let row_width = results.row_count().to_string().len().max(1);
        let mut header = format!("{:>w$}", "#", w = row_width);
        for (idx, col) in &visible {
            let marker = match sort {
                Some(s) if s.column == *idx => match s.direction {
                    SortDirection::Ascending => " ^",
                    SortDirection::Descending => " v",
                },
                _ => "",
            };
            header.push_str("  ");
            header.push_str(&fit(&format!("{}{}", col.field, marker), char_width(col.width)));
        }
        out.push_str(header.trim_end());
        out.push('\n');

        for row in 0..results.row_count() {
            let mut line = format!("{:>w$}", row, w = row_width);
            for (idx, col) in &visible {
                let text = results.display_cell(row, *idx).unwrap_or("");
                line.push_str("  ");
                line.push_str(&fit(text, char_width(col.width)));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "{} of {} hits, {} columns ({} hidden)\n",
        results.row_count(),
        results.total(),
        columns.len(),
        columns.len() - visible.len()
    ));
    out
}

/// Render one row's full source record.
pub fn render_detail(results: &ResultSet, row: usize) -> Option<String> {
    let text = results.row_detail_text(row)?;
    Some(format!("--- Row {} ---\n{}\n", row, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_set() -> ResultSet {
        let docs = vec![
            json!({"asctime": "2024-01-01 10:00", "levelname": "INFO", "message": "started\nwith details"}),
            json!({"asctime": "2024-01-01 10:05", "levelname": "ERROR", "message": "disk full", "errno": 28}),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();
        ResultSet::new(docs, 42)
    }

    fn layout(fields: &[String], hidden: &[&str]) -> Vec<ColumnLayout> {
        fields
            .iter()
            .map(|f| ColumnLayout {
                field: f.clone(),
                width: 160,
                hidden: hidden.contains(&f.as_str()),
            })
            .collect()
    }

    #[test]
    fn test_grid_shows_visible_columns_only() {
        let rs = result_set();
        let cols = layout(rs.fields(), &["errno"]);
        let out = render_grid(&rs, &cols, None);
        let header = out.lines().next().unwrap();
        assert!(header.contains("asctime"));
        assert!(header.contains("message"));
        assert!(!header.contains("errno"));
        assert!(out.contains("started"));
        assert!(!out.contains("with details"));
        assert!(out.contains("2 of 42 hits, 4 columns (1 hidden)"));
    }

    #[test]
    fn test_sort_marker_on_header() {
        let rs = result_set();
        let cols = layout(rs.fields(), &[]);
        let sort = SortState {
            column: rs.column_of("levelname").unwrap(),
            direction: SortDirection::Descending,
        };
        let out = render_grid(&rs, &cols, Some(sort));
        assert!(out.lines().next().unwrap().contains("levelname v"));
    }

    #[test]
    fn test_long_values_truncated() {
        assert_eq!(fit("abcdefghij", 5), "abcd…");
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn test_all_hidden_note() {
        let rs = result_set();
        let cols = layout(rs.fields(), &["asctime", "errno", "levelname", "message"]);
        let out = render_grid(&rs, &cols, None);
        assert!(out.starts_with("(no visible columns"));
    }

    #[test]
    fn test_detail() {
        let rs = result_set();
        let out = render_detail(&rs, 1).unwrap();
        assert!(out.starts_with("--- Row 1 ---"));
        assert!(out.contains("\"errno\": 28"));
        assert!(render_detail(&rs, 2).is_none());
    }
}
