//! gridcalc-core - UI-agnostic document model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::Document;
pub use error::{CoreError, Result};

pub use gridcalc_engine::engine::{CellRef, EngineOptions};
