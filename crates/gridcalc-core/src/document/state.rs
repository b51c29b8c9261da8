use gridcalc_engine::engine::{
    Cell, CellRef, EngineOptions, Grid, column_count, recalculate_sheet_with,
};
use std::path::PathBuf;

/// UI-agnostic document state for the spreadsheet.
///
/// The raw grid holds what the user typed; the computed grid is the output of
/// the last recalculation and is replaced after every edit.
pub struct Document {
    /// Raw cells (values and formula text)
    pub(crate) grid: Grid,
    /// Result of the last recalculation of `grid`
    pub(crate) computed: Grid,
    /// Options used for every recalculation
    pub options: EngineOptions,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified since it was loaded or saved
    pub modified: bool,
}

impl Document {
    /// Create an empty document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Document {
            grid: Grid::new(),
            computed: Grid::new(),
            options,
            file_path: None,
            modified: false,
        }
    }

    /// Create a document from an existing raw grid and compute it.
    pub fn from_grid(grid: Grid, options: EngineOptions) -> Self {
        let mut doc = Self::with_options(options);
        doc.grid = grid;
        doc.recalculate();
        doc
    }

    /// Recompute every formula from the raw grid.
    pub fn recalculate(&mut self) {
        self.computed = recalculate_sheet_with(&self.grid, &self.options);
    }

    /// Raw cells as entered.
    pub fn raw(&self) -> &Grid {
        &self.grid
    }

    /// Cells after the last recalculation.
    pub fn computed(&self) -> &Grid {
        &self.computed
    }

    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    pub fn col_count(&self) -> usize {
        column_count(&self.grid)
    }

    /// Display string of a computed cell (empty for cells outside the grid).
    pub fn get_cell_display(&self, cell_ref: &CellRef) -> String {
        cell_at(&self.computed, cell_ref)
            .map(|cell| cell.value.display())
            .unwrap_or_default()
    }

    /// Text a user would edit for the cell (formula text for formula cells).
    pub fn get_cell_input(&self, cell_ref: &CellRef) -> String {
        cell_at(&self.grid, cell_ref)
            .map(Cell::to_input_string)
            .unwrap_or_default()
    }
}

pub(crate) fn cell_at<'a>(grid: &'a Grid, cell_ref: &CellRef) -> Option<&'a Cell> {
    grid.get(cell_ref.row)?.get(cell_ref.col)
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
