//! CSV import/export functionality

use crate::error::{CoreError, Result};
use gridcalc_engine::engine::{Cell, Grid};
use std::io::Write;
use std::path::Path;

/// Parse a CSV file into a raw grid.
pub fn parse_csv(path: &Path) -> Result<Grid> {
    let content = std::fs::read_to_string(path)?;
    parse_csv_content(&content)
}

/// Parse CSV text into a raw grid, one row per line.
///
/// Trailing empty fields are dropped so rows only extend to their last value.
pub fn parse_csv_content(content: &str) -> Result<Grid> {
    let mut grid = Grid::new();
    for (line_idx, line) in content.lines().enumerate() {
        let fields = parse_csv_line(line).ok_or_else(|| CoreError::Parse {
            line: line_idx + 1,
            message: "unterminated quoted field".to_string(),
        })?;
        let mut row: Vec<Cell> = fields.iter().map(|f| parse_csv_field(f)).collect();
        while row.last().is_some_and(|cell| *cell == Cell::new_empty()) {
            row.pop();
        }
        grid.push(row);
    }
    Ok(grid)
}

/// Parse a single CSV line, handling quoted fields.
/// Returns None if a quoted field is not closed on the same line.
pub(crate) fn parse_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    if field_was_quoted {
                        fields.push(std::mem::take(&mut current));
                    } else {
                        fields.push(current.trim().to_string());
                        current.clear();
                    }
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return None;
    }
    if field_was_quoted {
        fields.push(current);
    } else {
        fields.push(current.trim().to_string());
    }
    Some(fields)
}

/// Parse a CSV field into an appropriate Cell type
/// - Empty string -> Empty
/// - Leading '=' -> Formula
/// - Valid number -> Number (unless it has leading zeros like "007")
/// - TRUE / FALSE -> Bool
/// - Otherwise -> Text
pub(crate) fn parse_csv_field(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::new_empty();
    }

    // Keep explicit surrounding whitespace (typically from quoted CSV fields).
    let trimmed = field.trim();
    if field != trimmed {
        return Cell::new_text(field);
    }

    if trimmed.starts_with('=') {
        return Cell::new_formula(trimmed);
    }

    // Preserve strings that look like numbers but have leading zeros (e.g., "007", "00123")
    // unless they're just "0" or start with "0."
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return Cell::new_text(trimmed);
    }

    if let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return Cell::new_number(n);
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::new_bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::new_bool(false);
    }

    Cell::new_text(trimmed)
}

/// Write the raw grid (formula text for formula cells) so it can be loaded again.
pub fn write_inputs_csv<W: Write>(out: &mut W, grid: &Grid) -> std::io::Result<()> {
    for row in grid {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| quote_csv_field(&cell.to_input_string()))
            .collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Write computed display values, guarded against formula injection.
pub fn write_values_csv<W: Write>(out: &mut W, grid: &Grid) -> std::io::Result<()> {
    for row in grid {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| escape_csv_field(&cell.value.display()))
            .collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Escape a display value for CSV output
fn escape_csv_field(field: &str) -> String {
    // Guard against CSV formula injection in spreadsheet apps.
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    let is_number = field.parse::<f64>().is_ok();
    let safe_field = if !is_number && matches!(first_non_space, Some('=' | '+' | '-' | '@')) {
        format!("'{}", field)
    } else {
        field.to_string()
    };
    quote_csv_field(&safe_field)
}

fn quote_csv_field(field: &str) -> String {
    if field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
        || field != field.trim()
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::{CellValue, recalculate_sheet};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_csv_line_simple() {
        assert_eq!(parse_csv_line("a,b,c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(
            parse_csv_line(r#"a,"hello, world",c"#).unwrap(),
            vec!["a", "hello, world", "c"]
        );
        assert_eq!(
            parse_csv_line(r#""say ""hi""",x"#).unwrap(),
            vec![r#"say "hi""#, "x"]
        );
    }

    #[test]
    fn test_parse_csv_line_unterminated_quote() {
        assert!(parse_csv_line(r#"a,"oops"#).is_none());
    }

    #[test]
    fn test_parse_csv_field_types() {
        assert_eq!(parse_csv_field("42"), Cell::new_number(42.0));
        assert_eq!(parse_csv_field("007"), Cell::new_text("007"));
        assert_eq!(parse_csv_field("0.5"), Cell::new_number(0.5));
        assert_eq!(parse_csv_field("  padded "), Cell::new_text("  padded "));
        assert_eq!(parse_csv_field("=SUM(A:A)"), Cell::new_formula("=SUM(A:A)"));
        assert_eq!(parse_csv_field("false"), Cell::new_bool(false));
        assert_eq!(parse_csv_field("NaN"), Cell::new_text("NaN"));
    }

    #[test]
    fn test_parse_csv_content_and_recalculate() {
        let grid = parse_csv_content("5,=SUM(A1:A2),,\n10\n").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].len(), 2);

        let out = recalculate_sheet(&grid);
        assert_eq!(out[0][1].value, CellValue::Number(15.0));
    }

    #[test]
    fn test_parse_csv_content_reports_line() {
        let err = parse_csv_content("1,2\n\"open,3\n").unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_inputs_round_trip() {
        let source = "1,\"a, b\",=A1*2\n,TRUE,=SUM(A1:C1)\n";
        let grid = parse_csv_content(source).unwrap();
        let mut out = Vec::new();
        write_inputs_csv(&mut out, &grid).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert_eq!(written, "1,\"a, b\",=A1*2\n,TRUE,=SUM(A1:C1)\n");
        assert_eq!(parse_csv_content(&written).unwrap(), grid);
    }

    #[test]
    fn test_values_csv_guards_injection() {
        let grid = vec![vec![
            Cell::new_text("=cmd()"),
            Cell::new_number(-3.0),
            Cell::new_text("x,y"),
        ]];
        let mut out = Vec::new();
        write_values_csv(&mut out, &grid).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "'=cmd(),-3,\"x,y\"\n");
    }
}
