//! Data loading utilities

use crate::error::{NeurocogError, Result};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Rows scanned to infer CSV column types
pub const CSV_INFER_SCHEMA_ROWS: usize = 1000;

/// Load a CSV file whose first row is the header
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(NeurocogError::DataError(format!("file not found: {}", path.display())));
    }

    let start = Instant::now();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(CSV_INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| NeurocogError::DataError(format!("failed to open {}: {}", path.display(), e)))?
        .finish()
        .map_err(|e| NeurocogError::DataError(format!("failed to parse {}: {}", path.display(), e)))?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded CSV"
    );
    Ok(df)
}
