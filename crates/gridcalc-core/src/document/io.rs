use super::Document;
use crate::error::{CoreError, Result};
use crate::storage::{parse_csv, write_inputs_csv, write_markdown, write_values_csv};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const MAX_SHEET_FILE_BYTES: u64 = 64 * 1_048_576; // 64 MiB

impl Document {
    /// Load a CSV file, replacing the current grid, and recalculate.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_SHEET_FILE_BYTES {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Refusing to read {}: file too large ({} bytes, max {})",
                    path.display(),
                    meta.len(),
                    MAX_SHEET_FILE_BYTES
                ),
            )));
        }

        let grid = parse_csv(path)?;
        log::debug!("loaded {} rows from {}", grid.len(), path.display());
        self.grid = grid;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        self.recalculate();
        Ok(())
    }

    /// Save raw inputs to the current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(CoreError::NoFilePath);
        };
        self.save_as(&path)?;
        Ok(path)
    }

    /// Save raw inputs (formulas as text) to `path` and make it the current file.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_inputs_csv(&mut out, &self.grid)?;
        out.flush()?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Export computed values as CSV.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_values_csv(&mut out, &self.computed)?;
        out.flush()?;
        Ok(())
    }

    /// Export computed values as a markdown table.
    pub fn export_markdown(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_markdown(&mut out, &self.computed)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellRef;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "gridcalc-core-{}-{}",
                name,
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            TempDir(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut doc = Document::new();
        assert!(matches!(doc.save_file(), Err(CoreError::NoFilePath)));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new("round-trip");
        let path = dir.0.join("sheet.csv");

        let mut doc = Document::new();
        doc.set_cell_from_input(CellRef::new(0, 0), "5");
        doc.set_cell_from_input(CellRef::new(1, 0), "10");
        doc.set_cell_from_input(CellRef::new(0, 1), "=SUM(A1:A2)");
        doc.save_as(&path).unwrap();
        assert!(!doc.modified);

        let mut loaded = Document::new();
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.get_cell_input(&CellRef::new(0, 1)), "=SUM(A1:A2)");
        assert_eq!(loaded.get_cell_display(&CellRef::new(0, 1)), "15");
        assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_exports_write_computed_values() {
        let dir = TempDir::new("exports");
        let mut doc = Document::new();
        doc.set_cell_from_input(CellRef::new(0, 0), "=2*(3+4)");

        let csv_path = dir.0.join("out.csv");
        doc.export_csv(&csv_path).unwrap();
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), "14\n");

        let md_path = dir.0.join("out.md");
        doc.export_markdown(&md_path).unwrap();
        assert!(std::fs::read_to_string(&md_path).unwrap().contains("| 1 | 14 |"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let mut doc = Document::new();
        let err = doc.load_file(Path::new("/nonexistent/gridcalc/sheet.csv")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
