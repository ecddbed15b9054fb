//! Feature set and clinical code tables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Year used to derive age from birth year. Fixed so results are reproducible.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;

/// Enumerations with more allowed values than this are treated as ranges and clipped.
pub const MAX_ENUMERATION_SIZE: usize = 10;

/// The fixed, ordered predictor columns plus the target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSet {
    /// Subject identifier column, used as the row index
    pub id_column: String,
    /// Continuous measurements
    pub numeric: Vec<String>,
    /// Small integer-coded enumerations
    pub categorical: Vec<String>,
    /// Target class column
    pub target: String,
    /// Age column; derivable from `birth_year_column`
    pub age_column: String,
    /// Alternate age source
    pub birth_year_column: String,
    /// Sex column, echoed back in prediction output
    pub sex_column: String,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            id_column: "NACCID".to_string(),
            numeric: vec!["AGE".into(), "EDUC".into(), "UDSBENTC".into()],
            categorical: vec![
                "SEX".into(),
                "MOCATRAI".into(),
                "AMNDEM".into(),
                "NACCPPAG".into(),
                "AMYLPET".into(),
                "DYSILL".into(),
                "DYSILLIF".into(),
            ],
            target: "NACCUDSD".to_string(),
            age_column: "AGE".to_string(),
            birth_year_column: "BIRTHYR".to_string(),
            sex_column: "SEX".to_string(),
        }
    }
}

impl FeatureSet {
    /// Predictor columns in their fixed order: numeric first, then categorical
    pub fn features(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
            .collect()
    }

    /// Predictor columns followed by the target
    pub fn features_with_target(&self) -> Vec<&str> {
        let mut cols = self.features();
        cols.push(self.target.as_str());
        cols
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }
}

/// Set of values a column may legitimately hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidValues {
    /// Inclusive integer range
    Range { min: i64, max: i64 },
    /// Explicit enumeration of codes
    Codes(Vec<i64>),
}

impl ValidValues {
    /// Number of allowed values
    pub fn len(&self) -> usize {
        match self {
            ValidValues::Range { min, max } => (max - min + 1).max(0) as usize,
            ValidValues::Codes(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Large sets are repaired by clipping, small ones by mode replacement
    pub fn is_continuous(&self) -> bool {
        self.len() > MAX_ENUMERATION_SIZE
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            ValidValues::Range { min, max } => (*min as f64, *max as f64),
            ValidValues::Codes(codes) => {
                let min = codes.iter().copied().min().unwrap_or(0);
                let max = codes.iter().copied().max().unwrap_or(0);
                (min as f64, max as f64)
            }
        }
    }

    /// Whether `value` is one of the allowed values
    pub fn contains(&self, value: f64) -> bool {
        match self {
            ValidValues::Range { min, max } => {
                value >= *min as f64 && value <= *max as f64 && (value - value.round()).abs() < 1e-9
            }
            ValidValues::Codes(codes) => codes.iter().any(|&c| (value - c as f64).abs() < 1e-9),
        }
    }
}

/// Sentinel codes and valid set for a single column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnCodes {
    /// Codes meaning "unknown" / "not applicable", mapped to missing
    pub sentinels: Vec<i64>,
    /// Allowed values; `None` means no range repair
    pub valid: Option<ValidValues>,
}

impl ColumnCodes {
    pub fn new(sentinels: &[i64], valid: ValidValues) -> Self {
        Self {
            sentinels: sentinels.to_vec(),
            valid: Some(valid),
        }
    }

    pub fn is_sentinel(&self, value: f64) -> bool {
        self.sentinels.iter().any(|&s| (value - s as f64).abs() < 1e-9)
    }
}

/// Column name → code table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBook {
    columns: BTreeMap<String, ColumnCodes>,
}

impl Default for CodeBook {
    fn default() -> Self {
        use ValidValues::{Codes, Range};

        let not_done = [95, 96, 97, 98, -4];
        let mut columns = BTreeMap::new();
        columns.insert("AGE".to_string(), ColumnCodes::new(&[], Range { min: 0, max: 120 }));
        columns.insert("EDUC".to_string(), ColumnCodes::new(&[99, -4], Range { min: 0, max: 36 }));
        columns.insert("UDSBENTC".to_string(), ColumnCodes::new(&not_done, Range { min: 0, max: 17 }));
        columns.insert("SEX".to_string(), ColumnCodes::new(&[99, -4], Codes(vec![1, 2])));
        columns.insert("MOCATRAI".to_string(), ColumnCodes::new(&not_done, Codes(vec![0, 1])));
        columns.insert("AMNDEM".to_string(), ColumnCodes::new(&[8, -4], Codes(vec![0, 1])));
        columns.insert("NACCPPAG".to_string(), ColumnCodes::new(&[7, 8, -4], Codes(vec![1, 2, 3, 4])));
        columns.insert("AMYLPET".to_string(), ColumnCodes::new(&[8, -4], Codes(vec![0, 1])));
        columns.insert("DYSILL".to_string(), ColumnCodes::new(&[8, -4], Codes(vec![0, 1])));
        columns.insert("DYSILLIF".to_string(), ColumnCodes::new(&[7, 8, -4], Codes(vec![1, 2, 3])));
        columns.insert("NACCUDSD".to_string(), ColumnCodes::new(&[-4], Codes(vec![1, 2, 3, 4])));

        Self { columns }
    }
}

impl CodeBook {
    /// Code book with no entries
    pub fn empty() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Builder method to add or replace a column's code table
    pub fn with_column(mut self, name: impl Into<String>, codes: ColumnCodes) -> Self {
        self.columns.insert(name.into(), codes);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnCodes> {
        self.columns.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnCodes)> {
        self.columns.iter()
    }
}
