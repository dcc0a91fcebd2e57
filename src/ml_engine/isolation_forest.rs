//! Isolation Forest outlier model
//!
//! Outliers are isolated by fewer random axis-aligned splits than inliers.
//! Each tree is grown on a random sub-sample of size ψ with a depth limit of
//! `ceil(log2(ψ))`; a point's anomaly score is derived from its mean path
//! length across trees, normalised by `c(ψ)`, the expected path length of an
//! unsuccessful BST search.
//!
//! `score_samples` follows the usual convention: values in `[-1, 0]`, lower
//! is more anomalous. The decision offset is the `contamination` quantile of
//! the training scores (statrs order statistics).

use rand::prelude::*;
use rand::seq::index;
use rayon::prelude::*;
use statrs::statistics::{Data, OrderStatistics};

use super::DetectorError;

/// Number of telemetry features: rpm, pressure, vibration, egt
pub const FEATURES: usize = 4;

pub type FeatureVector = [f64; FEATURES];

/// Euler–Mascheroni constant, used in the harmonic number approximation
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Forest construction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Upper bound on the per-tree sub-sample size
    pub max_samples: usize,
    /// Expected outlier fraction, (0, 0.5]
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            n_estimators: defaults::ML_N_ESTIMATORS,
            max_samples: defaults::ML_MAX_SAMPLES,
            contamination: defaults::ML_CONTAMINATION,
            seed: defaults::ML_SEED,
        }
    }
}

// ============================================================================
// Tree
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    External {
        size: usize,
    },
}

impl Node {
    fn build(points: Vec<FeatureVector>, depth: usize, height_limit: usize, rng: &mut StdRng) -> Self {
        if depth >= height_limit || points.len() <= 1 {
            return Node::External { size: points.len() };
        }

        // Only features that still vary can split this node
        let splittable: Vec<(usize, f64, f64)> = (0..FEATURES)
            .filter_map(|f| {
                let (min, max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p[f]), hi.max(p[f]))
                });
                (min < max).then_some((f, min, max))
            })
            .collect();

        let Some(&(feature, min, max)) = splittable.choose(rng) else {
            return Node::External { size: points.len() };
        };

        let threshold = rng.gen_range(min..max);
        let (left, right): (Vec<_>, Vec<_>) = points.into_iter().partition(|p| p[feature] < threshold);

        Node::Internal {
            feature,
            threshold,
            left: Box::new(Node::build(left, depth + 1, height_limit, rng)),
            right: Box::new(Node::build(right, depth + 1, height_limit, rng)),
        }
    }

    fn path_length(&self, x: &FeatureVector) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] < *threshold { left } else { right };
                    depth += 1.0;
                }
                Node::External { size } => return depth + average_path_length(*size),
            }
        }
    }
}

/// `c(n)`: average path length of an unsuccessful search in a BST of n nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// Forest
// ============================================================================

/// A fitted isolation forest
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit a forest on `data`.
    ///
    /// Trees are grown in parallel, each from its own RNG seeded with
    /// `seed + tree_index`, so the result does not depend on thread scheduling.
    pub fn fit(data: &[FeatureVector], params: ForestParams) -> Result<Self, DetectorError> {
        if data.len() < 2 {
            return Err(DetectorError::InsufficientData {
                needed: 2,
                got: data.len(),
            });
        }
        if !(params.contamination > 0.0 && params.contamination <= 0.5) {
            return Err(DetectorError::InvalidContamination(params.contamination));
        }
        if params.n_estimators == 0 {
            return Err(DetectorError::NoEstimators);
        }

        let sample_size = params.max_samples.clamp(2, data.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees: Vec<Node> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let subset: Vec<FeatureVector> = index::sample(&mut rng, data.len(), sample_size)
                    .into_iter()
                    .map(|idx| data[idx])
                    .collect();
                Node::build(subset, 0, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };

        let training_scores: Vec<f64> = data.par_iter().map(|x| forest.score_sample(x)).collect();
        forest.offset = Data::new(training_scores).quantile(params.contamination);

        Ok(forest)
    }

    /// Anomaly score in `[-1, 0]`; lower is more anomalous.
    pub fn score_sample(&self, x: &FeatureVector) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        -(2.0_f64).powf(-mean_path / average_path_length(self.sample_size))
    }

    /// `score_sample - offset`; negative means outlier.
    pub fn decision_function(&self, x: &FeatureVector) -> f64 {
        self.score_sample(x) - self.offset
    }

    /// `(is_outlier, raw_score)`
    pub fn predict(&self, x: &FeatureVector) -> (bool, f64) {
        let score = self.score_sample(x);
        (score < self.offset, score)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}
