//! One-hot encoding of integer-coded categories

use super::frame::ClinicalFrame;
use crate::error::{NeurocogError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Categories seen for one column at fit time, sorted ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCategories {
    pub column: String,
    pub categories: Vec<f64>,
}

impl ColumnCategories {
    /// Output column names, e.g. `SEX_1`, `SEX_2`
    pub fn output_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|&c| format!("{}_{}", self.column, format_category(c)))
            .collect()
    }

    fn position(&self, value: f64) -> Option<usize> {
        self.categories.iter().position(|&c| (c - value).abs() < 1e-9)
    }
}

/// One-hot encoder that maps unseen categories to an all-zero row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<ColumnCategories>,
}

impl OneHotEncoder {
    /// Record the categories of each fully populated column
    pub fn fit(frame: &ClinicalFrame, columns: &[String]) -> Result<Self> {
        let mut fitted = Vec::with_capacity(columns.len());
        for column in columns {
            let mut categories: Vec<f64> = Vec::new();
            for v in frame.values(column)? {
                let x = v.ok_or_else(|| {
                    NeurocogError::PreprocessingError(format!(
                        "cannot encode column {}: missing values remain after imputation",
                        column
                    ))
                })?;
                if !categories.iter().any(|&c| (c - x).abs() < 1e-9) {
                    categories.push(x);
                }
            }
            categories.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            fitted.push(ColumnCategories {
                column: column.clone(),
                categories,
            });
        }
        Ok(Self { columns: fitted })
    }

    /// Indicator column names in fit order
    pub fn output_names(&self) -> Vec<String> {
        self.columns.iter().flat_map(|c| c.output_names()).collect()
    }

    /// Replace each encoded column with its indicator columns.
    ///
    /// The returned frame holds only the indicator columns, in `output_names` order.
    pub fn transform(&self, frame: &ClinicalFrame) -> Result<ClinicalFrame> {
        let n = frame.height();
        let mut result = ClinicalFrame::from_columns(frame.index().to_vec(), Vec::new())?;

        for cats in &self.columns {
            let values = frame.values(&cats.column)?;
            let mut indicators = vec![vec![0.0f64; n]; cats.categories.len()];
            let mut unseen = 0usize;
            for (row, v) in values.iter().enumerate() {
                match v.and_then(|x| cats.position(x)) {
                    Some(pos) => indicators[pos][row] = 1.0,
                    None => unseen += 1,
                }
            }
            if unseen > 0 {
                warn!(column = %cats.column, unseen, "Unseen or missing categories encoded as all zeros");
            }
            for (name, column) in cats.output_names().into_iter().zip(indicators) {
                result = result.with_values(&name, column.into_iter().map(Some).collect())?;
            }
        }
        Ok(result)
    }

    pub fn columns(&self) -> &[ColumnCategories] {
        &self.columns
    }
}

fn format_category(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
