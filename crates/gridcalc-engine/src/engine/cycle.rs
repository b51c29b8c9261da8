//! Circular dependency detection for formula cells.
//!
//! Cycles are found during evaluation rather than ahead of it. Every formula
//! cell moves through `Unvisited → InProgress → Resolved` within one pass;
//! reaching a cell that is still `InProgress` means the formula depends on
//! itself (e.g., A1 references B1, B1 references C1, C1 references A1).

use std::collections::HashSet;

use super::cell_ref::CellRef;
use crate::error::{EvalError, Result};

/// Per-pass evaluation state of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitState {
    Unvisited,
    InProgress,
    Resolved,
}

/// The set of formula cells currently on the evaluation stack.
#[derive(Debug, Default)]
pub struct CycleTracker {
    visiting: HashSet<CellRef>,
    path: Vec<CellRef>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `cell` as in progress.
    ///
    /// Fails with `CircularReference` if it already is, or with `DepthLimit`
    /// if `max_depth` cells are already in progress. On failure nothing is
    /// recorded, so the caller must not call [`leave`](Self::leave).
    pub fn enter(&mut self, cell: CellRef, max_depth: usize) -> Result<()> {
        if self.visiting.contains(&cell) {
            log::debug!("circular reference: {}", self.describe_cycle(&cell));
            return Err(EvalError::CircularReference(cell));
        }
        if self.path.len() >= max_depth {
            return Err(EvalError::DepthLimit(max_depth));
        }
        self.visiting.insert(cell);
        self.path.push(cell);
        Ok(())
    }

    /// Clear the in-progress mark for `cell`, whatever the outcome of its evaluation.
    pub fn leave(&mut self, cell: &CellRef) {
        if self.visiting.remove(cell)
            && let Some(pos) = self.path.iter().rposition(|c| c == cell)
        {
            self.path.remove(pos);
        }
    }

    pub fn is_in_progress(&self, cell: &CellRef) -> bool {
        self.visiting.contains(cell)
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The cells forming the cycle that re-enters `cell`, e.g. `A1 -> B1 -> A1`.
    pub fn cycle_path(&self, cell: &CellRef) -> Option<Vec<CellRef>> {
        let start = self.path.iter().position(|c| c == cell)?;
        let mut cycle = self.path[start..].to_vec();
        cycle.push(*cell);
        Some(cycle)
    }

    fn describe_cycle(&self, cell: &CellRef) -> String {
        self.cycle_path(cell)
            .unwrap_or_default()
            .iter()
            .map(CellRef::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
