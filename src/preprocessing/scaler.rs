//! Standard (z-score) feature scaling

use super::frame::ClinicalFrame;
use crate::error::{NeurocogError, Result};
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 for constant columns
    pub scale: f64,
}

/// Standard scaling: (x - mean) / std
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
}

impl StandardScaler {
    /// Fit on fully populated columns
    pub fn fit(frame: &ClinicalFrame, columns: &[String]) -> Result<Self> {
        let mut params = Vec::with_capacity(columns.len());
        for column in columns {
            let values: Vec<f64> = frame
                .values(column)?
                .into_iter()
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| {
                    NeurocogError::PreprocessingError(format!(
                        "cannot scale column {}: missing values remain after imputation",
                        column
                    ))
                })?;
            if values.is_empty() {
                return Err(NeurocogError::PreprocessingError(format!(
                    "cannot scale empty column {}",
                    column
                )));
            }

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            params.push(ScalerParams {
                column: column.clone(),
                mean,
                scale: if std == 0.0 { 1.0 } else { std },
            });
        }
        Ok(Self { params })
    }

    /// Scale every fitted column present in the frame
    pub fn transform(&self, frame: &ClinicalFrame) -> Result<ClinicalFrame> {
        let mut result = frame.clone();
        for p in &self.params {
            if !result.has_column(&p.column) {
                continue;
            }
            let scaled = result
                .values(&p.column)?
                .into_iter()
                .map(|v| v.map(|x| (x - p.mean) / p.scale))
                .collect();
            result = result.with_values(&p.column, scaled)?;
        }
        Ok(result)
    }

    /// Map one scaled value of `column` back to its original unit
    pub fn inverse_value(&self, column: &str, value: f64) -> Option<f64> {
        self.params
            .iter()
            .find(|p| p.column == column)
            .map(|p| value * p.scale + p.mean)
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }
}
