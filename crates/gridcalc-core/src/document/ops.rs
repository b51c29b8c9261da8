use super::Document;
use gridcalc_engine::engine::{Cell, CellRef};

/// Dimension for row/column operations
#[derive(Copy, Clone, Debug)]
enum Dimension {
    Row,
    Column,
}

impl Document {
    /// Set a cell from raw user input and recalculate.
    ///
    /// The grid grows as needed; rows are never padded beyond the edited cell.
    pub fn set_cell_from_input(&mut self, cell_ref: CellRef, input: &str) {
        let cell = Cell::from_input(input);
        if self.grid.len() <= cell_ref.row {
            self.grid.resize_with(cell_ref.row + 1, Vec::new);
        }
        let row = &mut self.grid[cell_ref.row];
        if row.len() <= cell_ref.col {
            row.resize_with(cell_ref.col + 1, Cell::new_empty);
        }
        row[cell_ref.col] = cell;
        self.modified = true;
        self.recalculate();
    }

    /// Clear the specified cell
    pub fn clear_cell(&mut self, cell_ref: &CellRef) {
        let Some(cell) = self
            .grid
            .get_mut(cell_ref.row)
            .and_then(|row| row.get_mut(cell_ref.col))
        else {
            return;
        };
        if *cell != Cell::new_empty() {
            *cell = Cell::new_empty();
            self.modified = true;
            self.recalculate();
        }
    }

    /// Generic insert operation for row or column.
    ///
    /// Formula text is kept as written; references are not shifted.
    fn insert_dimension(&mut self, dim: Dimension, at: usize) {
        let changed = match dim {
            Dimension::Row => {
                if at > self.grid.len() {
                    false
                } else {
                    self.grid.insert(at, Vec::new());
                    true
                }
            }
            Dimension::Column => {
                let mut changed = false;
                for row in self.grid.iter_mut().filter(|row| row.len() > at) {
                    row.insert(at, Cell::new_empty());
                    changed = true;
                }
                changed
            }
        };
        self.finish_structural_edit(dim, at, changed);
    }

    /// Generic delete operation for row or column
    fn delete_dimension(&mut self, dim: Dimension, at: usize) {
        let changed = match dim {
            Dimension::Row => {
                if at < self.grid.len() {
                    self.grid.remove(at);
                    true
                } else {
                    false
                }
            }
            Dimension::Column => {
                let mut changed = false;
                for row in self.grid.iter_mut().filter(|row| row.len() > at) {
                    row.remove(at);
                    changed = true;
                }
                changed
            }
        };
        self.finish_structural_edit(dim, at, changed);
    }

    fn finish_structural_edit(&mut self, dim: Dimension, at: usize, changed: bool) {
        if !changed {
            return;
        }
        log::debug!("structural edit: {:?} at {}", dim, at);
        self.modified = true;
        self.recalculate();
    }

    /// Insert a row above the specified row
    pub fn insert_row(&mut self, at_row: usize) {
        self.insert_dimension(Dimension::Row, at_row);
    }

    /// Delete the specified row
    pub fn delete_row(&mut self, at_row: usize) {
        self.delete_dimension(Dimension::Row, at_row);
    }

    /// Insert a column left of the specified column
    pub fn insert_column(&mut self, at_col: usize) {
        self.insert_dimension(Dimension::Column, at_col);
    }

    /// Delete the specified column
    pub fn delete_column(&mut self, at_col: usize) {
        self.delete_dimension(Dimension::Column, at_col);
    }
}
