//! Plain-text rendering of tabular documents (CSV, XLSX).
//!
//! The layout is a row-indexed grid: the index column is left-aligned, every
//! data column is right-aligned to its widest cell, and columns are separated
//! by two spaces.

/// Placeholder for a missing or empty cell.
pub const MISSING: &str = "NaN";

/// Render `rows` under `headers`. Short rows are padded with [`MISSING`].
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return format!("Empty DataFrame\nColumns: [{}]\nIndex: []", headers.join(", "));
    }

    let cell = |row: &Vec<String>, col: usize| -> String {
        match row.get(col) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => MISSING.to_string(),
        }
    };

    let index_width = (rows.len() - 1).to_string().len();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, h)| {
            rows.iter()
                .map(|r| cell(r, col).chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = " ".repeat(index_width);
    for (h, w) in headers.iter().zip(&widths) {
        out.push_str(&format!("  {h:>w$}"));
    }

    for (i, row) in rows.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{i:<index_width$}"));
        for (col, w) in widths.iter().enumerate() {
            out.push_str(&format!("  {:>w$}", cell(row, col)));
        }
    }

    out
}
