use crate::db::{CellValue, QueryResult};
use std::io::{self, Write};

/// Render all rows of one result set as a single line, e.g. `[["18-OCT-2026"]]`.
///
/// Text cells are quoted, nulls print as `NULL`.
pub fn render_rows(rows: &[Vec<CellValue>]) -> String {
    format!("{:?}", rows)
}

/// Write one result set followed by a newline.
pub fn write_rows<W: Write>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    writeln!(out, "{}", render_rows(&result.rows))?;
    out.flush()
}
