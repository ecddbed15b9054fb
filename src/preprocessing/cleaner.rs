//! Record cleaning: age derivation, sentinel removal, range repair, feature selection
//!
//! Each stage is a pure function from one stage type to the next, so the
//! stages can only be composed in order:
//! `ClinicalFrame → AgedFrame → SentinelFreeFrame → RepairedFrame → CleanedFrame`.

use super::config::{CodeBook, FeatureSet, ValidValues};
use super::frame::ClinicalFrame;
use super::Mode;
use crate::error::{NeurocogError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Earliest birth year accepted when deriving age
const MIN_BIRTH_YEAR: f64 = 1850.0;

/// Age column is present (given or derived)
struct AgedFrame(ClinicalFrame);

/// No sentinel code remains in any coded column
struct SentinelFreeFrame(ClinicalFrame);

/// Every present value lies in its column's valid set
struct RepairedFrame(ClinicalFrame);

/// A frame reduced to the feature set, with sentinels removed and ranges repaired
#[derive(Debug, Clone)]
pub struct CleanedFrame {
    frame: ClinicalFrame,
    mode: Mode,
}

impl CleanedFrame {
    pub fn frame(&self) -> &ClinicalFrame {
        &self.frame
    }

    pub fn into_inner(self) -> ClinicalFrame {
        self.frame
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index(&self) -> &[String] {
        self.frame.index()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Rows at the given positions, keeping the cleaned guarantees
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        Ok(Self {
            frame: self.frame.take_rows(rows)?,
            mode: self.mode,
        })
    }

    /// Split off the target column: features frame plus target values.
    pub fn split_target(&self, target: &str) -> Result<(CleanedFrame, Vec<Option<f64>>)> {
        let y = self.frame.values(target)?;
        let features = CleanedFrame {
            frame: self.frame.drop_column(target)?,
            mode: Mode::Inference,
        };
        Ok((features, y))
    }
}

/// Normalizes raw clinical records into a [`CleanedFrame`]
#[derive(Debug, Clone)]
pub struct DataCleaner {
    features: FeatureSet,
    codes: CodeBook,
    reference_year: i32,
}

impl DataCleaner {
    pub fn new(features: FeatureSet, codes: CodeBook, reference_year: i32) -> Self {
        Self {
            features,
            codes,
            reference_year,
        }
    }

    /// Run every cleaning stage in order. No partial frame is returned on failure.
    pub fn clean(&self, frame: ClinicalFrame, mode: Mode) -> Result<CleanedFrame> {
        let rows = frame.height();
        self.derive_age(frame)
            .and_then(|aged| self.map_sentinels(aged))
            .and_then(|mapped| self.repair_ranges(mapped))
            .and_then(|repaired| self.select_features(repaired, mode))
            .map(|cleaned| {
                debug!(rows, columns = cleaned.frame.data().width(), ?mode, "Cleaned frame");
                cleaned
            })
            .map_err(|e| match e {
                NeurocogError::PreprocessingError(_) => e,
                other => NeurocogError::PreprocessingError(format!("cleaning failed: {}", other)),
            })
    }

    fn derive_age(&self, frame: ClinicalFrame) -> Result<AgedFrame> {
        let age_col = self.features.age_column.as_str();
        let birth_col = self.features.birth_year_column.as_str();
        let has_age = frame.has_column(age_col);
        let has_birth = frame.has_column(birth_col);

        if !has_birth {
            if has_age {
                return Ok(AgedFrame(frame));
            }
            return Err(NeurocogError::PreprocessingError(format!(
                "cannot derive {}: neither {} nor {} is present",
                age_col, age_col, birth_col
            )));
        }

        let reference = self.reference_year as f64;
        let derived: Vec<Option<f64>> = frame
            .values(birth_col)?
            .into_iter()
            .map(|b| b.filter(|&y| (MIN_BIRTH_YEAR..=reference).contains(&y)).map(|y| reference - y))
            .collect();

        let ages = if has_age {
            frame
                .values(age_col)?
                .into_iter()
                .zip(derived)
                .map(|(age, from_birth)| age.or(from_birth))
                .collect()
        } else {
            debug!(reference_year = self.reference_year, "Deriving {} from {}", age_col, birth_col);
            derived
        };

        Ok(AgedFrame(frame.with_values(age_col, ages)?))
    }

    fn map_sentinels(&self, AgedFrame(frame): AgedFrame) -> Result<SentinelFreeFrame> {
        let mut frame = frame;
        for (name, codes) in self.codes.iter() {
            if codes.sentinels.is_empty() || !frame.has_column(name) {
                continue;
            }
            let mut replaced = 0usize;
            let values: Vec<Option<f64>> = frame
                .values(name)?
                .into_iter()
                .map(|v| match v {
                    Some(x) if codes.is_sentinel(x) => {
                        replaced += 1;
                        None
                    }
                    other => other,
                })
                .collect();
            if replaced > 0 {
                debug!(column = %name, replaced, "Mapped sentinel codes to missing");
                frame = frame.with_values(name, values)?;
            }
        }
        Ok(SentinelFreeFrame(frame))
    }

    fn repair_ranges(&self, SentinelFreeFrame(frame): SentinelFreeFrame) -> Result<RepairedFrame> {
        let mut frame = frame;
        for (name, codes) in self.codes.iter() {
            let valid = match &codes.valid {
                Some(valid) if frame.has_column(name) => valid,
                _ => continue,
            };
            let values = frame.values(name)?;
            let (repaired, changed) = if valid.is_continuous() {
                clip_to_range(values, valid)
            } else {
                replace_with_mode(values, valid)
            };
            if changed > 0 {
                debug!(column = %name, changed, "Repaired out-of-range values");
                frame = frame.with_values(name, repaired)?;
            }
        }
        Ok(RepairedFrame(frame))
    }

    fn select_features(&self, RepairedFrame(frame): RepairedFrame, mode: Mode) -> Result<CleanedFrame> {
        let columns = match mode {
            Mode::Training => self.features.features_with_target(),
            Mode::Inference => self.features.features(),
        };
        Ok(CleanedFrame {
            frame: frame.select(&columns)?,
            mode,
        })
    }
}

fn clip_to_range(values: Vec<Option<f64>>, valid: &ValidValues) -> (Vec<Option<f64>>, usize) {
    let (lo, hi) = valid.bounds();
    let mut changed = 0usize;
    let clipped = values
        .into_iter()
        .map(|v| {
            v.map(|x| {
                let c = x.clamp(lo, hi);
                if c != x {
                    changed += 1;
                }
                c
            })
        })
        .collect();
    (clipped, changed)
}

/// Replace present-but-invalid codes with the most frequent valid code.
/// Ties go to the smallest code; with no valid code at all, invalid entries become missing.
fn replace_with_mode(values: Vec<Option<f64>>, valid: &ValidValues) -> (Vec<Option<f64>>, usize) {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for x in values.iter().flatten() {
        if valid.contains(*x) {
            *counts.entry(x.round() as i64).or_insert(0) += 1;
        }
    }

    let mut mode: Option<(i64, usize)> = None;
    for (&code, &count) in &counts {
        if mode.map_or(true, |(_, best)| count > best) {
            mode = Some((code, count));
        }
    }
    let fill = mode.map(|(code, _)| code as f64);

    let mut changed = 0usize;
    let repaired = values
        .into_iter()
        .map(|v| match v {
            Some(x) if !valid.contains(x) => {
                changed += 1;
                fill
            }
            other => other,
        })
        .collect();
    (repaired, changed)
}
