//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellValue`] - The raw or computed value held by a cell
//! - [`CellKind`] - The kind tag of a value (empty, string, number, boolean)
//! - [`Cell`] - A value plus optional formula text
//! - [`Grid`] - Dense row-major storage; rows may have unequal lengths

use serde::{Deserialize, Serialize};

use super::format::format_number;

/// Marker stored in a formula cell whose evaluation failed.
pub const ERROR_MARKER: &str = "#ERROR";

/// The value held by a cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

/// Kind tag of a [`CellValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    String,
    Number,
    Boolean,
}

impl CellValue {
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Empty,
            CellValue::Text(_) => CellKind::String,
            CellValue::Number(_) => CellKind::Number,
            CellValue::Bool(_) => CellKind::Boolean,
        }
    }

    /// Numeric coercion used when a plain value takes part in arithmetic.
    ///
    /// Empty cells, non-numeric text and non-finite numbers all count as 0;
    /// booleans count as 1 and 0; text is trimmed before parsing.
    pub fn to_number(&self) -> f64 {
        let n = match self {
            CellValue::Empty => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Bool(b) => f64::from(u8::from(*b)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(0.0)
                }
            }
        };
        if n.is_finite() { n } else { 0.0 }
    }

    /// Display string for the value.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

/// A cell in the spreadsheet grid.
///
/// When `formula` is set the cell is a formula cell and `value` is an output of
/// recalculation, never an input to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text including the leading `=`.
    pub formula: Option<String>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            value: CellValue::Text(text.to_string()),
            formula: None,
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            value: CellValue::Number(n),
            formula: None,
        }
    }

    pub fn new_bool(b: bool) -> Cell {
        Cell {
            value: CellValue::Bool(b),
            formula: None,
        }
    }

    /// Create a formula cell. The leading `=` is added when missing.
    pub fn new_formula(formula: &str) -> Cell {
        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        Cell {
            value: CellValue::Empty,
            formula: Some(formula),
        }
    }

    /// Parse user input and create appropriate cell type.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula
    /// - Quoted string -> Text (without quotes)
    /// - Valid number -> Number
    /// - TRUE / FALSE (any case) -> Bool
    /// - Otherwise -> Text
    pub fn from_input(input: &str) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Cell::new_empty();
        }

        if trimmed.starts_with('=') {
            return Cell::new_formula(trimmed);
        }

        if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
            return Cell::new_text(&trimmed[1..trimmed.len() - 1]);
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

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Formula text without the leading `=`.
    pub fn formula_body(&self) -> Option<&str> {
        self.formula
            .as_deref()
            .map(|f| f.strip_prefix('=').unwrap_or(f))
    }

    pub fn kind(&self) -> CellKind {
        self.value.kind()
    }

    /// Whether recalculation marked this cell as failed.
    pub fn is_error(&self) -> bool {
        self.is_formula() && matches!(&self.value, CellValue::Text(s) if s == ERROR_MARKER)
    }

    /// Get the raw text a user would edit (formula text for formula cells).
    pub fn to_input_string(&self) -> String {
        match &self.formula {
            Some(formula) => formula.clone(),
            None => self.value.display(),
        }
    }
}

/// Row-major grid. Rows may be shorter than others; missing cells are empty.
pub type Grid = Vec<Vec<Cell>>;

/// Number of columns of the widest row.
pub fn column_count(grid: &Grid) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(CellValue::Empty.to_number(), 0.0);
        assert_eq!(CellValue::Number(2.5).to_number(), 2.5);
        assert_eq!(CellValue::Number(f64::NAN).to_number(), 0.0);
        assert_eq!(CellValue::Number(f64::INFINITY).to_number(), 0.0);
        assert_eq!(CellValue::Bool(true).to_number(), 1.0);
        assert_eq!(CellValue::Bool(false).to_number(), 0.0);
        assert_eq!(CellValue::Text(" 12 ".into()).to_number(), 12.0);
        assert_eq!(CellValue::Text("1e3".into()).to_number(), 1000.0);
        assert_eq!(CellValue::Text("".into()).to_number(), 0.0);
        assert_eq!(CellValue::Text("hello".into()).to_number(), 0.0);
        assert_eq!(CellValue::Text("inf".into()).to_number(), 0.0);
    }

    #[test]
    fn test_kind_follows_value() {
        assert_eq!(Cell::new_empty().kind(), CellKind::Empty);
        assert_eq!(Cell::new_text("x").kind(), CellKind::String);
        assert_eq!(Cell::new_number(1.0).kind(), CellKind::Number);
        assert_eq!(Cell::new_bool(true).kind(), CellKind::Boolean);
    }

    #[test]
    fn test_from_input() {
        assert_eq!(Cell::from_input("   "), Cell::new_empty());
        assert_eq!(Cell::from_input("42"), Cell::new_number(42.0));
        assert_eq!(Cell::from_input("\"42\""), Cell::new_text("42"));
        assert_eq!(Cell::from_input("True"), Cell::new_bool(true));
        assert_eq!(Cell::from_input("hello"), Cell::new_text("hello"));

        let formula = Cell::from_input(" =A1+1 ");
        assert_eq!(formula.formula.as_deref(), Some("=A1+1"));
        assert_eq!(formula.formula_body(), Some("A1+1"));
    }

    #[test]
    fn test_new_formula_adds_equals() {
        let cell = Cell::new_formula("2+3");
        assert_eq!(cell.formula.as_deref(), Some("=2+3"));
        assert_eq!(cell.to_input_string(), "=2+3");
    }

    #[test]
    fn test_column_count_uses_widest_row() {
        let grid: Grid = vec![vec![Cell::new_empty()], vec![Cell::new_empty(); 3], vec![]];
        assert_eq!(column_count(&grid), 3);
        assert_eq!(column_count(&Grid::new()), 0);
    }
}
