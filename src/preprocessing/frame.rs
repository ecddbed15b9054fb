//! Subject-indexed tabular frame

use crate::error::{NeurocogError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde_json::{Map, Value};

/// A polars `DataFrame` of numeric clinical columns indexed by subject identifier.
///
/// Every data column is `Float64`; values that could not be read as numbers are
/// null. The subject index is held apart from the data so that no transformation
/// step ever touches it.
#[derive(Debug, Clone)]
pub struct ClinicalFrame {
    index: Vec<String>,
    data: DataFrame,
}

impl ClinicalFrame {
    /// Build from a raw frame, taking the index from `id_column`.
    ///
    /// Rows fall back to positional identifiers when the id column is absent.
    pub fn from_dataframe(df: &DataFrame, id_column: &str) -> Result<Self> {
        let height = df.height();

        let index = match df.column(id_column) {
            Ok(col) => {
                let as_text = col.cast(&DataType::String)?;
                as_text
                    .str()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.map(|s| s.trim().to_string()).unwrap_or_else(|| i.to_string()))
                    .collect()
            }
            Err(_) => {
                tracing::debug!(id_column, "Id column absent, using positional index");
                (0..height).map(|i| i.to_string()).collect()
            }
        };

        let mut columns = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            if col.name().as_str() == id_column {
                continue;
            }
            let as_f64 = col.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = as_f64.f64()?.into_iter().map(finite).collect();
            columns.push(Column::new(col.name().clone(), values));
        }

        Ok(Self {
            index,
            data: DataFrame::new(columns)?,
        })
    }

    /// Build a one-row frame from a key/value record.
    ///
    /// Numbers and numeric strings are read as values; anything else is missing.
    pub fn from_record(record: &Map<String, Value>, id_column: &str) -> Result<Self> {
        let id = match record.get(id_column) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        };

        let columns: Vec<Column> = record
            .iter()
            .filter(|(key, _)| key.as_str() != id_column)
            .map(|(key, value)| Column::new(key.as_str().into(), vec![json_to_f64(value)]))
            .collect();

        Ok(Self {
            index: vec![id],
            data: DataFrame::new(columns)?,
        })
    }

    /// Build from an index and named, fully populated columns.
    pub fn from_columns(index: Vec<String>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = index.len();
        let cols = columns
            .into_iter()
            .map(|(name, values)| {
                if values.len() != n {
                    return Err(NeurocogError::ShapeError {
                        expected: format!("{} rows in column {}", n, name),
                        actual: format!("{} rows", values.len()),
                    });
                }
                Ok(Column::new(name.as_str().into(), values))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index,
            data: DataFrame::new(cols)?,
        })
    }

    /// Subject identifiers, one per row
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Values of a column as optional floats
    pub fn values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .data
            .column(name)
            .map_err(|_| NeurocogError::FeatureNotFound(name.to_string()))?;
        let as_f64 = column.cast(&DataType::Float64)?;
        Ok(as_f64.f64()?.into_iter().map(finite).collect())
    }

    /// Return a new frame with `name` replaced (or added).
    pub fn with_values(&self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != self.height() {
            return Err(NeurocogError::ShapeError {
                expected: format!("{} rows", self.height()),
                actual: format!("{} rows", values.len()),
            });
        }
        let values: Vec<Option<f64>> = values.into_iter().map(finite).collect();
        let mut data = self.data.clone();
        data.with_column(Column::new(name.into(), values))?;
        Ok(Self {
            index: self.index.clone(),
            data,
        })
    }

    /// Keep the named columns that exist, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let present: Vec<&str> = names.iter().copied().filter(|n| self.has_column(n)).collect();
        Ok(Self {
            index: self.index.clone(),
            data: self.data.select(present)?,
        })
    }

    pub fn drop_column(&self, name: &str) -> Result<Self> {
        if !self.has_column(name) {
            return Ok(self.clone());
        }
        Ok(Self {
            index: self.index.clone(),
            data: self.data.drop(name)?,
        })
    }

    /// Rows at the given positions, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        let index = rows.iter().map(|&r| self.index[r].clone()).collect();
        let mut columns = Vec::with_capacity(self.data.width());
        for name in self.column_names() {
            let values = self.values(&name)?;
            let picked: Vec<Option<f64>> = rows.iter().map(|&r| values[r]).collect();
            columns.push(Column::new(name.as_str().into(), picked));
        }
        Ok(Self {
            index,
            data: DataFrame::new(columns)?,
        })
    }

    /// Extract named columns into a row-major matrix. Missing values are an error.
    pub fn to_array(&self, names: &[String]) -> Result<Array2<f64>> {
        let n_rows = self.height();
        let col_data: Vec<Vec<f64>> = names
            .iter()
            .map(|name| {
                self.values(name)?
                    .into_iter()
                    .enumerate()
                    .map(|(row, v)| {
                        v.ok_or_else(|| {
                            NeurocogError::PreprocessingError(format!(
                                "missing value in column {} for subject {}",
                                name, self.index[row]
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, names.len()), |(r, c)| col_refs[c][r]))
    }
}

fn json_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    finite(parsed)
}

/// NaN and infinities are missing values.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_df() -> DataFrame {
        df!(
            "NACCID" => &["A1", "A2", "A3"],
            "AGE" => &[Some(70i64), Some(81), None],
            "SEX" => &["1", "2", "x"],
        )
        .unwrap()
    }

    #[test]
    fn test_from_dataframe_uses_id_index() {
        let frame = ClinicalFrame::from_dataframe(&raw_df(), "NACCID").unwrap();
        assert_eq!(frame.index(), &["A1", "A2", "A3"]);
        assert!(!frame.has_column("NACCID"));
        assert_eq!(frame.values("AGE").unwrap(), vec![Some(70.0), Some(81.0), None]);
    }

    #[test]
    fn test_text_values_become_missing() {
        let frame = ClinicalFrame::from_dataframe(&raw_df(), "NACCID").unwrap();
        assert_eq!(frame.values("SEX").unwrap(), vec![Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn test_positional_index_without_id_column() {
        let df = df!("AGE" => &[70.0, 81.0]).unwrap();
        let frame = ClinicalFrame::from_dataframe(&df, "NACCID").unwrap();
        assert_eq!(frame.index(), &["0", "1"]);
    }

    #[test]
    fn test_from_record() {
        let record: Map<String, Value> = serde_json::from_str(
            r#"{"NACCID": "P7", "AGE": 74, "EDUC": "16", "SEX": null}"#,
        )
        .unwrap();
        let frame = ClinicalFrame::from_record(&record, "NACCID").unwrap();
        assert_eq!(frame.index(), &["P7"]);
        assert_eq!(frame.values("AGE").unwrap(), vec![Some(74.0)]);
        assert_eq!(frame.values("EDUC").unwrap(), vec![Some(16.0)]);
        assert_eq!(frame.values("SEX").unwrap(), vec![None]);
    }

    #[test]
    fn test_non_finite_values_become_missing() {
        let df = df!(
            "NACCID" => &["A1", "A2", "A3", "A4"],
            "EDUC" => &[Some(12.0), Some(f64::NAN), None, Some(f64::INFINITY)],
        )
        .unwrap();
        let frame = ClinicalFrame::from_dataframe(&df, "NACCID").unwrap();
        assert_eq!(frame.values("EDUC").unwrap(), vec![Some(12.0), None, None, None]);
        assert_eq!(frame.data().column("EDUC").unwrap().null_count(), 3);

        let record: Map<String, Value> =
            serde_json::from_str(r#"{"NACCID": "P1", "AGE": "NaN", "EDUC": "inf"}"#).unwrap();
        let frame = ClinicalFrame::from_record(&record, "NACCID").unwrap();
        assert_eq!(frame.values("AGE").unwrap(), vec![None]);
        assert_eq!(frame.values("EDUC").unwrap(), vec![None]);

        let replaced = frame.with_values("AGE", vec![Some(f64::NAN)]).unwrap();
        assert_eq!(replaced.data().column("AGE").unwrap().null_count(), 1);
    }

    #[test]
    fn test_take_rows_and_select() {
        let frame = ClinicalFrame::from_dataframe(&raw_df(), "NACCID").unwrap();
        let picked = frame.take_rows(&[2, 0]).unwrap();
        assert_eq!(picked.index(), &["A3", "A1"]);
        assert_eq!(picked.values("AGE").unwrap(), vec![None, Some(70.0)]);

        let selected = frame.select(&["SEX", "MISSING"]).unwrap();
        assert_eq!(selected.column_names(), vec!["SEX".to_string()]);
    }

    #[test]
    fn test_to_array_rejects_missing() {
        let frame = ClinicalFrame::from_dataframe(&raw_df(), "NACCID").unwrap();
        assert!(frame.to_array(&["AGE".to_string()]).is_err());

        let complete = frame.take_rows(&[0, 1]).unwrap();
        let arr = complete.to_array(&["AGE".to_string()]).unwrap();
        assert_eq!(arr.shape(), &[2, 1]);
        assert_eq!(arr[[1, 0]], 81.0);
    }
}
