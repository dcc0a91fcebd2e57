//! Outlier Confirmer - second opinion on every reading
//!
//! Wraps the trained outlier model. The model's binary label alone decides
//! `ml_confirmed`; the normalised score rides along for prompts and logs.

use std::sync::Arc;
use tracing::info;

use crate::ml_engine::{DetectorError, OutlierModel};
use crate::types::{ConfirmationResult, ScreeningResult};

pub struct OutlierConfirmer {
    model: Arc<dyn OutlierModel>,
}

impl std::fmt::Debug for OutlierConfirmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlierConfirmer")
            .field("trained", &self.model.is_trained())
            .finish()
    }
}

impl OutlierConfirmer {
    pub fn new(model: Arc<dyn OutlierModel>) -> Self {
        Self { model }
    }

    /// Confirm or reject a screened reading.
    ///
    /// Fails only when the model has not been trained, which aborts the run.
    pub fn confirm(&self, screening: &ScreeningResult) -> Result<ConfirmationResult, DetectorError> {
        let reading = &screening.telemetry;
        let (is_anomaly, raw_score) = self.model.detect(&reading.features())?;
        let ml_score = normalize_score(raw_score);

        if is_anomaly {
            info!(cycle = reading.cycle, ml_score = format_args!("{ml_score:.2}"), "ML confirmed anomaly");
        } else {
            info!(cycle = reading.cycle, ml_score = format_args!("{ml_score:.2}"), "ML: No significant anomaly");
        }

        Ok(ConfirmationResult {
            ml_confirmed: is_anomaly,
            ml_score,
            threshold_detected: screening.anomalies_detected,
            telemetry: reading.clone(),
        })
    }
}

/// Map a raw isolation score (lower = more anomalous) onto `[0, ∞)`.
pub fn normalize_score(raw: f64) -> f64 {
    (-raw).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ThresholdScreener;
    use crate::ml_engine::{AnomalyDetector, FeatureVector};
    use crate::types::TelemetryReading;

    /// Model with a fixed answer, for exercising the wrapper alone
    struct FixedModel(bool, f64);

    impl OutlierModel for FixedModel {
        fn detect(&self, _: &FeatureVector) -> Result<(bool, f64), DetectorError> {
            Ok((self.0, self.1))
        }

        fn is_trained(&self) -> bool {
            true
        }
    }

    fn screened(rpm: f64, pressure: f64, vibration: f64, egt: f64) -> ScreeningResult {
        ThresholdScreener::new().screen(&TelemetryReading::new(1, rpm, pressure, vibration, egt))
    }

    #[test]
    fn test_score_normalisation() {
        assert_eq!(normalize_score(-0.62), 0.62);
        assert_eq!(normalize_score(0.0), 0.0);
        assert_eq!(normalize_score(0.3), 0.0);
    }

    #[test]
    fn test_label_is_authoritative_over_score() {
        // Low score but positive label: still confirmed
        let confirmer = OutlierConfirmer::new(Arc::new(FixedModel(true, -0.01)));
        let result = confirmer.confirm(&screened(9000.0, 1900.0, 0.4, 750.0)).expect("detect");
        assert!(result.ml_confirmed);
        assert!(!result.threshold_detected);

        let confirmer = OutlierConfirmer::new(Arc::new(FixedModel(false, -0.9)));
        let result = confirmer.confirm(&screened(9000.0, 950.0, 0.4, 750.0)).expect("detect");
        assert!(!result.ml_confirmed);
        assert!(result.threshold_detected);
        assert!((result.ml_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_untrained_detector_is_fatal() {
        let confirmer = OutlierConfirmer::new(Arc::new(AnomalyDetector::new()));
        let err = confirmer.confirm(&screened(9000.0, 1900.0, 0.4, 750.0)).expect_err("should fail");
        assert!(matches!(err, DetectorError::NotTrained));
    }

    #[test]
    fn test_trained_detector_confirms_extreme_reading() {
        let mut detector = AnomalyDetector::new();
        detector.train(1000, 0.1).expect("train");
        let confirmer = OutlierConfirmer::new(Arc::new(detector));

        let extreme = confirmer.confirm(&screened(12_000.0, 500.0, 5.0, 1500.0)).expect("detect");
        assert!(extreme.ml_confirmed);
        assert!(extreme.threshold_detected);

        let nominal = confirmer.confirm(&screened(9000.0, 1900.0, 0.45, 750.0)).expect("detect");
        assert!(!nominal.ml_confirmed);
        assert!(extreme.ml_score > nominal.ml_score);
        assert!(nominal.ml_score >= 0.0);
    }
}
