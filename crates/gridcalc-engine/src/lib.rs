//! gridcalc_engine - Spreadsheet formula engine.

pub mod engine;
pub mod error;

pub use error::EvalError;
