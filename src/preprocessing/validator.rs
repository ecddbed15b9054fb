//! Required-column validation

use super::config::FeatureSet;
use super::frame::ClinicalFrame;
use super::Mode;
use crate::error::{NeurocogError, Result};

/// Checks that a frame carries every column the workflow needs
#[derive(Debug, Clone)]
pub struct FeatureValidator {
    features: FeatureSet,
}

impl FeatureValidator {
    pub fn new(features: FeatureSet) -> Self {
        Self { features }
    }

    /// Fail with a validation error naming every absent required column.
    ///
    /// A missing age column is tolerated when the birth-year column is present.
    pub fn validate(&self, frame: &ClinicalFrame, mode: Mode) -> Result<()> {
        if frame.is_empty() {
            return Err(NeurocogError::ValidationError("input data is empty".to_string()));
        }

        let required = match mode {
            Mode::Training => self.features.features_with_target(),
            Mode::Inference => self.features.features(),
        };

        let missing: Vec<&str> = required
            .into_iter()
            .filter(|col| !frame.has_column(col))
            .filter(|col| {
                !(*col == self.features.age_column
                    && frame.has_column(&self.features.birth_year_column))
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(NeurocogError::ValidationError(format!(
                "missing required columns: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(columns: &[&str]) -> ClinicalFrame {
        let cols = columns.iter().map(|c| (c.to_string(), vec![1.0])).collect();
        ClinicalFrame::from_columns(vec!["A1".to_string()], cols).unwrap()
    }

    fn all_features() -> Vec<&'static str> {
        vec!["AGE", "EDUC", "UDSBENTC", "SEX", "MOCATRAI", "AMNDEM", "NACCPPAG", "AMYLPET", "DYSILL", "DYSILLIF"]
    }

    #[test]
    fn test_missing_target_rejected_in_training() {
        let validator = FeatureValidator::new(FeatureSet::default());
        let frame = frame_with(&all_features());

        let err = validator.validate(&frame, Mode::Training).unwrap_err();
        assert!(matches!(err, NeurocogError::ValidationError(_)));
        assert!(err.to_string().contains("NACCUDSD"));

        assert!(validator.validate(&frame, Mode::Inference).is_ok());
    }

    #[test]
    fn test_birth_year_substitutes_for_age() {
        let validator = FeatureValidator::new(FeatureSet::default());
        let mut cols: Vec<&str> = all_features().into_iter().filter(|c| *c != "AGE").collect();

        let err = validator.validate(&frame_with(&cols), Mode::Inference).unwrap_err();
        assert!(err.to_string().contains("AGE"));

        cols.push("BIRTHYR");
        assert!(validator.validate(&frame_with(&cols), Mode::Inference).is_ok());
    }

    #[test]
    fn test_names_every_missing_column() {
        let validator = FeatureValidator::new(FeatureSet::default());
        let err = validator.validate(&frame_with(&["AGE", "SEX"]), Mode::Inference).unwrap_err();
        let msg = err.to_string();
        for col in ["EDUC", "UDSBENTC", "MOCATRAI", "DYSILLIF"] {
            assert!(msg.contains(col), "{} should be named in: {}", col, msg);
        }
    }

    #[test]
    fn test_empty_frame_rejected() {
        let validator = FeatureValidator::new(FeatureSet::default());
        let frame = ClinicalFrame::from_columns(Vec::new(), vec![("AGE".to_string(), Vec::new())]).unwrap();
        assert!(matches!(
            validator.validate(&frame, Mode::Inference),
            Err(NeurocogError::ValidationError(_))
        ));
    }
}
