//! Missing value imputation strategies

use super::frame::ClinicalFrame;
use crate::error::{NeurocogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Absolute skewness above which the median is preferred over the mean
pub const SKEWNESS_THRESHOLD: f64 = 0.5;

/// Strategy for imputing missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
}

/// Fitted fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFill {
    pub column: String,
    /// `None` when the column had no missing values at fit time
    pub strategy: Option<ImputeStrategy>,
    pub value: f64,
}

/// Imputer for handling missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    fills: Vec<ColumnFill>,
}

impl Imputer {
    /// Fit numeric columns, choosing mean or median from each column's skewness.
    ///
    /// Columns without missing values get no strategy; their training mean is
    /// kept as a fallback in case missing values show up later.
    pub fn fit_numeric(frame: &ClinicalFrame, columns: &[String]) -> Result<Self> {
        let mut fills = Vec::with_capacity(columns.len());
        for column in columns {
            let values = frame.values(column)?;
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                return Err(NeurocogError::PreprocessingError(format!(
                    "column {} has no values to fit an imputer on",
                    column
                )));
            }

            let strategy = choose_numeric_strategy(&values);
            let value = match strategy {
                Some(ImputeStrategy::Median) => median(&present),
                _ => mean(&present),
            };
            debug!(column = %column, ?strategy, value, "Fitted numeric imputer");
            fills.push(ColumnFill {
                column: column.clone(),
                strategy,
                value,
            });
        }
        Ok(Self { fills })
    }

    /// Fit the most frequent value for each column (ties go to the smallest value).
    pub fn fit_most_frequent(frame: &ClinicalFrame, columns: &[String]) -> Result<Self> {
        let mut fills = Vec::with_capacity(columns.len());
        for column in columns {
            let values = frame.values(column)?;
            let value = most_frequent(&values).ok_or_else(|| {
                NeurocogError::PreprocessingError(format!(
                    "column {} has no values to fit an imputer on",
                    column
                ))
            })?;
            fills.push(ColumnFill {
                column: column.clone(),
                strategy: Some(ImputeStrategy::MostFrequent),
                value,
            });
        }
        Ok(Self { fills })
    }

    /// Fill missing values. Columns absent from the frame are left absent.
    pub fn transform(&self, frame: &ClinicalFrame) -> Result<ClinicalFrame> {
        let mut result = frame.clone();
        for fill in &self.fills {
            if !result.has_column(&fill.column) {
                continue;
            }
            let values = result.values(&fill.column)?;
            let n_missing = values.iter().filter(|v| v.is_none()).count();
            if n_missing == 0 {
                continue;
            }
            if fill.strategy.is_none() {
                warn!(
                    column = %fill.column,
                    n_missing,
                    "Missing values in a column that had none at fit time, using training mean"
                );
            }
            let filled = values.into_iter().map(|v| Some(v.unwrap_or(fill.value))).collect();
            result = result.with_values(&fill.column, filled)?;
        }
        Ok(result)
    }

    /// Strategy chosen for a column at fit time
    pub fn strategy(&self, column: &str) -> Option<ImputeStrategy> {
        self.fills
            .iter()
            .find(|f| f.column == column)
            .and_then(|f| f.strategy)
    }

    pub fn fills(&self) -> &[ColumnFill] {
        &self.fills
    }
}

/// Mean for roughly symmetric columns, median for skewed ones; `None` when nothing is missing.
pub fn choose_numeric_strategy(values: &[Option<f64>]) -> Option<ImputeStrategy> {
    if values.iter().all(Option::is_some) {
        return None;
    }
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if skewness(&present).abs() > SKEWNESS_THRESHOLD {
        Some(ImputeStrategy::Median)
    } else {
        Some(ImputeStrategy::Mean)
    }
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson coefficient).
///
/// Returns 0 for fewer than three values or a constant column.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let nf = n as f64;
    let m = mean(values);
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(s2, s3), &x| {
        let d = x - m;
        (s2 + d * d, s3 + d * d * d)
    });
    let m2 = m2 / nf;
    let m3 = m3 / nf;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn most_frequent(values: &[Option<f64>]) -> Option<f64> {
    // Keyed by bit pattern; non-negative floats order the same as their bits,
    // so sort the keys by value afterwards to make ties deterministic.
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.to_bits()).or_insert(0) += 1;
    }
    let mut entries: Vec<(f64, usize)> = counts.into_iter().map(|(k, c)| (f64::from_bits(k), c)).collect();
    entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in entries {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v)
}
