//! Markdown export functionality

use gridcalc_engine::engine::{CellRef, Grid, column_count};
use std::io::Write;

/// Write computed values as a markdown table with column letters and row numbers.
pub fn write_markdown<W: Write>(out: &mut W, grid: &Grid) -> std::io::Result<()> {
    let cols = column_count(grid);

    writeln!(out, "# Sheet")?;
    writeln!(out)?;

    if cols == 0 {
        writeln!(out, "*Empty spreadsheet*")?;
        return Ok(());
    }

    // Header with column letters
    write!(out, "|   |")?;
    for col in 0..cols {
        write!(out, " {} |", CellRef::col_to_letters(col))?;
    }
    writeln!(out)?;

    write!(out, "|---|")?;
    for _ in 0..cols {
        write!(out, "---|")?;
    }
    writeln!(out)?;

    for (row_idx, row) in grid.iter().enumerate() {
        write!(out, "| {} |", row_idx + 1)?; // 1-based row numbers
        for col in 0..cols {
            let display = row.get(col).map(|c| c.value.display()).unwrap_or_default();
            write!(out, " {} |", escape_markdown(&display))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}
