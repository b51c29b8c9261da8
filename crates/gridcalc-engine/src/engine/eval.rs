//! Formula evaluation.
//!
//! A formula body (the text after `=`) goes through four stages:
//!
//! 1. `SUM(...)` calls are replaced by their resolved totals
//! 2. bare cell references are replaced by their values
//! 3. the result is checked to contain nothing but arithmetic characters
//! 4. the arithmetic is tokenized, parsed into a tree and evaluated
//!
//! Cell values are pulled through a [`ValueSource`], which is where
//! memoization and cycle detection live.

use super::cell_ref::CellRef;
use super::expr::eval_arithmetic;
use super::preprocess::{substitute_cell_refs, substitute_sum_calls, validate_arithmetic};
use crate::error::{EvalError, Result};

/// Numeric view of a sheet used while evaluating formulas.
pub trait ValueSource {
    /// Resolved numeric value of a cell. Absent and out-of-bounds cells are 0.
    fn value_at(&mut self, cell: CellRef) -> Result<f64>;

    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;
}

/// Evaluate a formula body to a finite number.
pub fn evaluate(body: &str, source: &mut dyn ValueSource) -> Result<f64> {
    let with_sums = substitute_sum_calls(body, source)?;
    let arithmetic = substitute_cell_refs(&with_sums, source)?;
    validate_arithmetic(&arithmetic)?;

    let n = eval_arithmetic(&arithmetic)?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(EvalError::NonFiniteResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every cell holds `row + 1`, a 4x4 sheet.
    struct RowNumbers;

    impl ValueSource for RowNumbers {
        fn value_at(&mut self, cell: CellRef) -> Result<f64> {
            if cell.row < 4 && cell.col < 4 {
                Ok((cell.row + 1) as f64)
            } else {
                Ok(0.0)
            }
        }

        fn row_count(&self) -> usize {
            4
        }

        fn col_count(&self) -> usize {
            4
        }
    }

    #[test]
    fn test_literal_arithmetic() {
        assert_eq!(evaluate("2+3", &mut RowNumbers).unwrap(), 5.0);
        assert_eq!(evaluate("2*(3+4)", &mut RowNumbers).unwrap(), 14.0);
    }

    #[test]
    fn test_references_and_sums() {
        assert_eq!(evaluate("A2 * 10", &mut RowNumbers).unwrap(), 20.0);
        // column A: 1 + 2 + 3 + 4
        assert_eq!(evaluate("SUM(A:A) - A1", &mut RowNumbers).unwrap(), 9.0);
        // row 3 across 4 columns
        assert_eq!(evaluate("sum(3:3)", &mut RowNumbers).unwrap(), 12.0);
        assert_eq!(evaluate("SUM(A3:A)", &mut RowNumbers).unwrap(), 7.0);
    }

    #[test]
    fn test_unsupported_function_is_rejected() {
        assert!(matches!(
            evaluate("FOO(1)", &mut RowNumbers),
            Err(EvalError::InvalidFormulaCharacters(_))
        ));
        assert!(matches!(
            evaluate("AVERAGE(A1:A4)", &mut RowNumbers),
            Err(EvalError::InvalidFormulaCharacters(_))
        ));
    }

    #[test]
    fn test_non_finite_result() {
        assert_eq!(evaluate("1/0", &mut RowNumbers), Err(EvalError::NonFiniteResult));
        assert_eq!(evaluate("A9/0", &mut RowNumbers), Err(EvalError::NonFiniteResult));
    }

    #[test]
    fn test_malformed_arithmetic() {
        assert!(matches!(evaluate("", &mut RowNumbers), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("A1 +", &mut RowNumbers), Err(EvalError::Syntax(_))));
    }
}
