//! CSV and Markdown storage.

mod csv;
mod md;

pub use csv::{parse_csv, parse_csv_content, write_inputs_csv, write_values_csv};
pub use md::write_markdown;
