//! Whole-sheet recalculation.
//!
//! [`recalculate_sheet`] is the entry point: it copies the caller's grid,
//! evaluates every formula cell in row-major order and returns the copy with
//! each formula cell holding either its number or [`ERROR_MARKER`].
//!
//! All memoization lives in a [`Recalculation`] built for one call and dropped
//! at the end of it, so separate calls never share state.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use super::cell::{Cell, CellValue, ERROR_MARKER, Grid, column_count};
use super::cell_ref::CellRef;
use super::cycle::{CycleTracker, VisitState};
use super::eval::{ValueSource, evaluate};
use crate::error::{EvalError, Result};

/// Tunables for a recalculation pass.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Maximum number of formula cells evaluated inside one another.
    /// Values outside `1..=MAX_DEPTH_LIMIT` are clamped.
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions { max_depth: 128 }
    }
}

impl EngineOptions {
    /// Deepest evaluation nesting the engine will attempt.
    pub const MAX_DEPTH_LIMIT: usize = 256;

    /// `max_depth` clamped to `1..=MAX_DEPTH_LIMIT`.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.clamp(1, Self::MAX_DEPTH_LIMIT)
    }
}

/// Recalculate every formula cell with default options.
pub fn recalculate_sheet(grid: &Grid) -> Grid {
    recalculate_sheet_with(grid, &EngineOptions::default())
}

/// Recalculate every formula cell. The input grid is never modified.
pub fn recalculate_sheet_with(grid: &Grid, options: &EngineOptions) -> Grid {
    let mut pass = Recalculation::new(grid.clone(), options);
    pass.run();
    pass.into_grid()
}

/// State of a single recalculation pass.
pub struct Recalculation {
    sheet: Grid,
    max_depth: usize,
    row_count: usize,
    col_count: usize,
    cache: HashMap<CellRef, f64>,
    failures: HashMap<CellRef, EvalError>,
    tracker: CycleTracker,
    /// Cell refused by the most recent depth-limit failure.
    depth_frontier: Option<CellRef>,
    evaluations: usize,
    resolved: usize,
}

impl Recalculation {
    pub fn new(sheet: Grid, options: &EngineOptions) -> Self {
        let row_count = sheet.len();
        let col_count = column_count(&sheet);
        Recalculation {
            sheet,
            max_depth: options.effective_max_depth(),
            row_count,
            col_count,
            cache: HashMap::new(),
            failures: HashMap::new(),
            tracker: CycleTracker::new(),
            depth_frontier: None,
            evaluations: 0,
            resolved: 0,
        }
    }

    /// Evaluate every formula cell, row-major.
    pub fn run(&mut self) {
        let formulas = self.formula_cells();
        log::debug!(
            "recalculating {} formula cells in a {}x{} grid",
            formulas.len(),
            self.row_count,
            self.col_count
        );

        for &cell in &formulas {
            self.resolve_from_top(cell);
        }

        log::debug!(
            "recalculation finished: {} resolved, {} failed, {} evaluations",
            self.resolved,
            formulas.len() - self.resolved,
            self.evaluations
        );
    }

    /// Resolve `cell` starting from an empty evaluation stack.
    ///
    /// When evaluation runs into the depth limit, the dependency that was
    /// refused is resolved first and its caller retried afterwards. Each retry
    /// then finds that dependency cached, so a chain of any length costs a
    /// constant number of evaluations per cell.
    fn resolve_from_top(&mut self, cell: CellRef) {
        let mut work = vec![cell];
        let mut on_work = HashSet::from([cell]);
        while let Some(&current) = work.last() {
            match self.value_at(current) {
                Ok(n) => {
                    log::trace!("{} = {}", current, n);
                    on_work.remove(&current);
                    work.pop();
                }
                Err(e) if e.depends_on_stack() => match self.depth_frontier.take() {
                    Some(next) if on_work.contains(&next) => {
                        for failed in self.fail_cycle(&mut work, next) {
                            on_work.remove(&failed);
                        }
                    }
                    Some(next) => {
                        on_work.insert(next);
                        work.push(next);
                    }
                    None => {
                        self.failures.insert(current, e.clone());
                        self.mark_error(&current, &e);
                        on_work.remove(&current);
                        work.pop();
                    }
                },
                Err(e) => {
                    self.mark_error(&current, &e);
                    on_work.remove(&current);
                    work.pop();
                }
            }
        }
    }

    /// Each cell on `work` was reached from the one below it, and the top one
    /// reached `start` again, so everything from `start` upwards lies on one
    /// cycle. Fails those cells and returns them.
    fn fail_cycle(&mut self, work: &mut Vec<CellRef>, start: CellRef) -> Vec<CellRef> {
        let pos = work.iter().position(|c| *c == start).unwrap_or(0);
        let error = EvalError::CircularReference(start);
        log::debug!(
            "circular reference at {} spans {} depth-limited chains",
            start,
            work.len() - pos
        );
        let cycle: Vec<CellRef> = work.drain(pos..).collect();
        for cell in &cycle {
            self.mark_error(cell, &error);
            self.failures.insert(*cell, error.clone());
        }
        cycle
    }

    /// Number of formula evaluations started so far in this pass.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn formula_cells(&self) -> Vec<CellRef> {
        self.sheet
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.is_formula())
                    .map(move |(col, _)| CellRef::new(row, col))
            })
            .collect()
    }

    fn mark_error(&mut self, cell: &CellRef, error: &EvalError) {
        log::trace!("{} failed: {}", cell, error);
        if let Some(stored) = self.cell_mut(cell) {
            stored.value = CellValue::Text(ERROR_MARKER.to_string());
        }
    }

    fn cell_mut(&mut self, cell: &CellRef) -> Option<&mut Cell> {
        self.sheet.get_mut(cell.row)?.get_mut(cell.col)
    }

    /// Where `cell` stands in this pass.
    pub fn visit_state(&self, cell: &CellRef) -> VisitState {
        if self.tracker.is_in_progress(cell) {
            VisitState::InProgress
        } else if self.cache.contains_key(cell) {
            VisitState::Resolved
        } else {
            VisitState::Unvisited
        }
    }

    pub fn into_grid(self) -> Grid {
        self.sheet
    }
}

impl ValueSource for Recalculation {
    fn value_at(&mut self, cell: CellRef) -> Result<f64> {
        if let Some(n) = self.cache.get(&cell) {
            return Ok(*n);
        }
        if let Some(error) = self.failures.get(&cell) {
            return Err(error.clone());
        }

        let Some(stored) = self.sheet.get(cell.row).and_then(|r| r.get(cell.col)) else {
            self.cache.insert(cell, 0.0);
            return Ok(0.0);
        };
        let Some(body) = stored.formula_body().map(str::to_owned) else {
            let n = stored.value.to_number();
            self.cache.insert(cell, n);
            return Ok(n);
        };

        if let Err(e) = self.tracker.enter(cell, self.max_depth) {
            if e.depends_on_stack() {
                self.depth_frontier = Some(cell);
            }
            return Err(e);
        }
        self.evaluations += 1;
        let result = evaluate(&body, self);
        self.tracker.leave(&cell);

        match result {
            Ok(n) => {
                self.cache.insert(cell, n);
                self.resolved += 1;
                if let Some(stored) = self.cell_mut(&cell) {
                    stored.value = CellValue::Number(n);
                }
                Ok(n)
            }
            Err(e) => {
                if !e.depends_on_stack() {
                    self.failures.insert(cell, e.clone());
                }
                Err(e)
            }
        }
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn col_count(&self) -> usize {
        self.col_count
    }
}
