//! Error types for formula evaluation.

use thiserror::Error;

use crate::engine::CellRef;

/// Errors that can occur while evaluating a single formula cell.
///
/// None of these ever escape [`recalculate_sheet`](crate::engine::recalculate_sheet);
/// they are turned into the `#ERROR` marker on the failing cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Invalid cell reference: {0}")]
    AddressParse(String),

    #[error("Formula contains characters outside arithmetic: {0:?}")]
    InvalidFormulaCharacters(String),

    #[error("Circular reference through {0}")]
    CircularReference(CellRef),

    #[error("Formula result is not a finite number")]
    NonFiniteResult,

    #[error("Malformed arithmetic expression: {0}")]
    Syntax(String),

    #[error("Evaluation nested deeper than {0} formula cells")]
    DepthLimit(usize),
}

impl EvalError {
    /// Whether the failure depends on how deep in the call stack it was hit.
    ///
    /// Such failures must not be memoized: the same cell may resolve when it
    /// is reached from a shallower starting point.
    pub fn depends_on_stack(&self) -> bool {
        matches!(self, EvalError::DepthLimit(_))
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
