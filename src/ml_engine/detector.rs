//! Anomaly Detector - isolation forest trained on a synthetic normal baseline
//!
//! Training happens exactly once, before the first pipeline cycle. After that
//! the detector is read-only and can be shared behind an `Arc`.

use rand::prelude::*;
use tracing::info;

use super::isolation_forest::{FeatureVector, ForestParams, IsolationForest};
use super::{DetectorError, OutlierModel};
use crate::acquisition::sample_normal_features;
use crate::config::{defaults, MlModelConfig};

/// Isolation-forest detector over `[rpm, pressure, vibration, egt]`
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    n_estimators: usize,
    seed: u64,
    model: Option<IsolationForest>,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyDetector {
    /// Untrained detector with default forest size and seed.
    pub fn new() -> Self {
        Self {
            n_estimators: defaults::ML_N_ESTIMATORS,
            seed: defaults::ML_SEED,
            model: None,
        }
    }

    /// Build and train a detector from the `[ml_model]` config section.
    pub fn trained_from_config(config: &MlModelConfig) -> Result<Self, DetectorError> {
        let mut detector = Self {
            n_estimators: config.n_estimators,
            ..Self::new()
        };
        detector.train(config.n_samples, config.contamination)?;
        Ok(detector)
    }

    /// Synthetic baseline: `n_samples` readings drawn uniformly from the
    /// normal operating bands with a fixed seed.
    pub fn generate_baseline(n_samples: usize, seed: u64) -> Vec<FeatureVector> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n_samples).map(|_| sample_normal_features(&mut rng)).collect()
    }

    /// Train on a freshly generated baseline. Retraining replaces the model.
    pub fn train(&mut self, n_samples: usize, contamination: f64) -> Result<(), DetectorError> {
        let baseline = Self::generate_baseline(n_samples, self.seed);
        let params = ForestParams {
            n_estimators: self.n_estimators,
            contamination,
            seed: self.seed,
            ..ForestParams::default()
        };
        let forest = IsolationForest::fit(&baseline, params)?;

        info!(
            n_samples,
            contamination,
            trees = forest.n_trees(),
            sample_size = forest.sample_size(),
            offset = format_args!("{:.4}", forest.offset()),
            "Isolation forest trained on synthetic baseline"
        );

        self.model = Some(forest);
        Ok(())
    }

    pub fn model(&self) -> Option<&IsolationForest> {
        self.model.as_ref()
    }
}

impl OutlierModel for AnomalyDetector {
    fn detect(&self, features: &FeatureVector) -> Result<(bool, f64), DetectorError> {
        let model = self.model.as_ref().ok_or(DetectorError::NotTrained)?;
        Ok(model.predict(features))
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}
