//! Utility functions and types

pub mod data_loader;

pub use data_loader::{load_csv, CSV_INFER_SCHEMA_ROWS};
