//! Clinical data preprocessing
//!
//! Provides the validate → clean → transform path shared by training and prediction:
//! - Required-column validation
//! - Sentinel-code removal, range repair and age derivation
//! - Skewness-driven numeric imputation and standard scaling
//! - Mode imputation and one-hot encoding of categorical codes

pub mod config;
mod cleaner;
mod encoder;
mod frame;
mod imputer;
mod scaler;
mod transformer;
mod validator;

pub use cleaner::{CleanedFrame, DataCleaner};
pub use config::{CodeBook, ColumnCodes, FeatureSet, ValidValues, DEFAULT_REFERENCE_YEAR};
pub use encoder::{ColumnCategories, OneHotEncoder};
pub use frame::ClinicalFrame;
pub use imputer::{skewness, ColumnFill, ImputeStrategy, Imputer, SKEWNESS_THRESHOLD};
pub use scaler::{ScalerParams, StandardScaler};
pub use transformer::{FeatureTransformer, FittedTransform};
pub use validator::FeatureValidator;

use serde::{Deserialize, Serialize};

/// Which workflow a frame is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Target column required and kept
    Training,
    /// Target column neither required nor kept
    Inference,
}
