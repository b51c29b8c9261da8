//! Spreadsheet formula engine.
//!
//! This module provides the computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellValue`], [`CellKind`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`classify_segment`], [`resolve_range`] - Range classification and summation
//! - [`evaluate`] - Formula body evaluation through a [`ValueSource`]
//! - [`recalculate_sheet`] - Whole-sheet recalculation with cycle detection
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod eval;
mod expr;
mod format;
mod preprocess;
mod range;
mod recalc;

pub use cell::{Cell, CellKind, CellValue, ERROR_MARKER, Grid, column_count};
pub use cell_ref::CellRef;
pub use cycle::{CycleTracker, VisitState};
pub use eval::{ValueSource, evaluate};
pub use expr::{BinOp, Expr, Token, eval_arithmetic, parse, tokenize};
pub use format::format_number;
pub use preprocess::{substitute_cell_refs, substitute_sum_calls, validate_arithmetic};
pub use range::{RangeKind, classify_segment, resolve_range};
pub use recalc::{EngineOptions, Recalculation, recalculate_sheet, recalculate_sheet_with};
