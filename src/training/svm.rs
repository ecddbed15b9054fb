//! Support vector classifier
//!
//! One-vs-rest SMO (Sequential Minimal Optimization). Kernel rows are computed
//! on demand and held in a bounded LRU cache shared by every one-vs-rest
//! problem, so memory stays flat as the training set grows.

use super::config::{KernelType, SvmConfig};
use super::models::{class_labels, Classifier};
use crate::error::{NeurocogError, Result};
use lru::LruCache;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::debug;

/// Consecutive sweeps without an update before SMO stops
const MAX_PASSES: usize = 5;

/// SMO touches two rows per step
const MIN_CACHED_ROWS: usize = 2;

/// Kernel rows over the training matrix, computed when first asked for
struct KernelRows<'a> {
    x: &'a Array2<f64>,
    kind: &'a KernelType,
    diagonal: Vec<f64>,
    cache: LruCache<usize, Rc<[f64]>>,
    computed: usize,
}

impl<'a> KernelRows<'a> {
    fn new(x: &'a Array2<f64>, kind: &'a KernelType, cache_bytes: usize) -> Self {
        let n = x.nrows();
        let row_bytes = (n * std::mem::size_of::<f64>()).max(1);
        let capacity = (cache_bytes / row_bytes).clamp(MIN_CACHED_ROWS, n.max(MIN_CACHED_ROWS));
        let diagonal = (0..n)
            .into_par_iter()
            .map(|i| kernel(kind, x.row(i), x.row(i)))
            .collect();
        Self {
            x,
            kind,
            diagonal,
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            computed: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    fn diag(&self, i: usize) -> f64 {
        self.diagonal[i]
    }

    /// K(i, j), read from a cached row when one is present
    fn at(&self, i: usize, j: usize) -> f64 {
        if let Some(row) = self.cache.peek(&i) {
            return row[j];
        }
        if let Some(row) = self.cache.peek(&j) {
            return row[i];
        }
        kernel(self.kind, self.x.row(i), self.x.row(j))
    }

    /// Full row i, evicting the least recently used row when the cache is full
    fn row(&mut self, i: usize) -> Rc<[f64]> {
        if let Some(row) = self.cache.get(&i) {
            return Rc::clone(row);
        }
        let (x, kind) = (self.x, self.kind);
        let values: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|k| kernel(kind, x.row(i), x.row(k)))
            .collect();
        let row: Rc<[f64]> = values.into();
        self.cache.put(i, Rc::clone(&row));
        self.computed += 1;
        row
    }
}

/// A single binary SVM trained for one class vs rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BinarySvm {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

/// Support Vector Classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmClassifier {
    config: SvmConfig,
    seed: u64,
    classes: Vec<i64>,
    ovr: Vec<BinarySvm>,
}

impl SvmClassifier {
    pub fn new(config: SvmConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            classes: Vec::new(),
            ovr: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// SMO training for one ±1 labelling. Returns (alphas, bias, support indices).
    ///
    /// `decision[k]` tracks sum(alpha_i * y_i * K(i, k)) and is updated from the
    /// two changed rows after every step, so errors are read in constant time.
    fn smo_train(&self, kernels: &mut KernelRows, y: &Array1<f64>, rng: &mut Xoshiro256PlusPlus) -> (Array1<f64>, f64, Vec<usize>) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;
        let mut alphas = Array1::<f64>::zeros(n);
        let mut decision = vec![0.0f64; n];
        let mut bias = 0.0;

        let mut passes = 0;
        let mut total_iter = 0;

        while n > 1 && passes < MAX_PASSES && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision[i] + bias - y[i];

                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision[j] + bias - y[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let k_ij = kernels.at(i, j);
                    let (k_ii, k_jj) = (kernels.diag(i), kernels.diag(j));
                    let eta = 2.0 * k_ij - k_ii - k_jj;
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).clamp(l, h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }
                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let step_i = y[i] * (alphas[i] - alpha_i_old);
                    let step_j = y[j] * (alphas[j] - alpha_j_old);
                    let b1 = bias - e_i - step_i * k_ii - step_j * k_ij;
                    let b2 = bias - e_j - step_i * k_ij - step_j * k_jj;

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    let row_i = kernels.row(i);
                    let row_j = kernels.row(j);
                    for (f, (&ki, &kj)) in decision.iter_mut().zip(row_i.iter().zip(row_j.iter())) {
                        *f += step_i * ki + step_j * kj;
                    }
                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();
        (alphas, bias, support)
    }

    fn score(&self, clf: &BinarySvm, sample: ArrayView1<f64>) -> f64 {
        clf.support_vectors
            .rows()
            .into_iter()
            .zip(clf.alphas.iter().zip(clf.support_labels.iter()))
            .fold(clf.bias, |acc, (sv, (&a, &l))| acc + a * l * kernel(&self.config.kernel, sample, sv))
    }
}

impl Classifier for SvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let classes = class_labels(y)?;
        if classes.len() < 2 {
            return Err(NeurocogError::TrainingError(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }
        let cache_bytes = self.config.cache_size_mb.saturating_mul(1024 * 1024);
        let mut kernels = KernelRows::new(x, &self.config.kernel, cache_bytes);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut ovr = Vec::with_capacity(classes.len());

        for &cls in &classes {
            let y_binary: Array1<f64> = y.mapv(|v| if v.round() as i64 == cls { 1.0 } else { -1.0 });
            let (alphas, bias, support) = self.smo_train(&mut kernels, &y_binary, &mut rng);

            let mut support_vectors = Array2::zeros((support.len(), x.ncols()));
            let mut support_labels = Array1::zeros(support.len());
            let mut support_alphas = Array1::zeros(support.len());
            for (k, &idx) in support.iter().enumerate() {
                support_vectors.row_mut(k).assign(&x.row(idx));
                support_labels[k] = y_binary[idx];
                support_alphas[k] = alphas[idx];
            }
            ovr.push(BinarySvm {
                support_vectors,
                alphas: support_alphas,
                support_labels,
                bias,
            });
        }

        debug!(
            samples = x.nrows(),
            cached_rows = kernels.capacity(),
            computed_rows = kernels.computed,
            "Fitted SVM"
        );
        self.classes = classes;
        self.ovr = ovr;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.ovr.is_empty() {
            return Err(NeurocogError::PredictionError("SVM is not fitted".to_string()));
        }
        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = (f64::NEG_INFINITY, self.classes[0]);
                for (clf, &cls) in self.ovr.iter().zip(&self.classes) {
                    let s = self.score(clf, row);
                    if s > best.0 {
                        best = (s, cls);
                    }
                }
                best.1 as f64
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

fn kernel(kind: &KernelType, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    match kind {
        KernelType::Linear => a.dot(&b),
        KernelType::Rbf { gamma } => {
            let norm_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
            (-gamma * norm_sq).exp()
        }
    }
}
