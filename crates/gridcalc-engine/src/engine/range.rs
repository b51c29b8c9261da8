//! Range classification and summation.
//!
//! A range expression is a comma-separated list of segments. Each segment is
//! classified into exactly one [`RangeKind`] and summed through a
//! [`ValueSource`], so formula cells inside a range are resolved with the same
//! memoization and cycle rules as a top-level evaluation.
//!
//! Handles:
//! - Single cells: `A1`
//! - Full columns: `A:C`
//! - Column segments starting at a row: `B5:B`
//! - Full rows: `2:4`
//! - Rectangles: `A1:C3` (corners in any order)

use std::ops::Range;

use super::cell_ref::CellRef;
use super::eval::ValueSource;
use crate::error::Result;

/// The shape of a single range segment, with bounds already normalized to
/// ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeKind {
    SingleCell(CellRef),
    FullColumn {
        first_col: usize,
        last_col: usize,
    },
    ColumnSegmentFromRow {
        start_row: usize,
        first_col: usize,
        last_col: usize,
    },
    FullRow {
        first_row: usize,
        last_row: usize,
    },
    Rectangle {
        top_left: CellRef,
        bottom_right: CellRef,
    },
}

fn is_letters(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Classify one segment of a range expression.
///
/// Returns None for a malformed segment; it then contributes nothing to a sum.
pub fn classify_segment(segment: &str) -> Option<RangeKind> {
    let Some((start, end)) = segment.split_once(':') else {
        return CellRef::from_str(segment).map(RangeKind::SingleCell);
    };
    let (start, end) = (start.trim(), end.trim());

    if is_letters(start) && is_letters(end) {
        let (first_col, last_col) = ordered(
            CellRef::letters_to_col(start)?,
            CellRef::letters_to_col(end)?,
        );
        return Some(RangeKind::FullColumn {
            first_col,
            last_col,
        });
    }

    if is_letters(end)
        && let Some(anchor) = CellRef::from_str(start)
    {
        let (first_col, last_col) = ordered(anchor.col, CellRef::letters_to_col(end)?);
        return Some(RangeKind::ColumnSegmentFromRow {
            start_row: anchor.row,
            first_col,
            last_col,
        });
    }

    if is_digits(start) && is_digits(end) {
        let (first_row, last_row) = ordered(
            CellRef::row_from_number(start)?,
            CellRef::row_from_number(end)?,
        );
        return Some(RangeKind::FullRow {
            first_row,
            last_row,
        });
    }

    let a = CellRef::from_str(start)?;
    let b = CellRef::from_str(end)?;
    let (top, bottom) = ordered(a.row, b.row);
    let (left, right) = ordered(a.col, b.col);
    Some(RangeKind::Rectangle {
        top_left: CellRef::new(top, left),
        bottom_right: CellRef::new(bottom, right),
    })
}

/// Sum every segment of `range_expr`.
///
/// Malformed segments count as 0. Errors from resolving a cell (for example a
/// circular reference) abort the sum.
pub fn resolve_range(range_expr: &str, source: &mut dyn ValueSource) -> Result<f64> {
    let mut total = 0.0;
    for segment in range_expr.split(',') {
        match classify_segment(segment) {
            Some(kind) => total += sum_kind(kind, source)?,
            None => log::trace!("ignoring malformed range segment {:?}", segment.trim()),
        }
    }
    Ok(total)
}

fn sum_kind(kind: RangeKind, source: &mut dyn ValueSource) -> Result<f64> {
    let (rows, cols) = (source.row_count(), source.col_count());
    match kind {
        RangeKind::SingleCell(cell) => source.value_at(cell),
        RangeKind::FullColumn {
            first_col,
            last_col,
        } => sum_block(source, 0..rows, clamp(first_col, last_col, cols)),
        RangeKind::ColumnSegmentFromRow {
            start_row,
            first_col,
            last_col,
        } => sum_block(source, start_row..rows, clamp(first_col, last_col, cols)),
        RangeKind::FullRow {
            first_row,
            last_row,
        } => sum_block(source, clamp(first_row, last_row, rows), 0..cols),
        RangeKind::Rectangle {
            top_left,
            bottom_right,
        } => sum_block(
            source,
            clamp(top_left.row, bottom_right.row, rows),
            clamp(top_left.col, bottom_right.col, cols),
        ),
    }
}

/// Inclusive `first..=last` intersected with `0..len`.
fn clamp(first: usize, last: usize, len: usize) -> Range<usize> {
    first..last.saturating_add(1).min(len)
}

fn sum_block(
    source: &mut dyn ValueSource,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Result<f64> {
    let mut total = 0.0;
    for row in rows {
        for col in cols.clone() {
            total += source.value_at(CellRef::new(row, col))?;
        }
    }
    Ok(total)
}
