//! Telemetry Simulator - unbounded stream of synthetic engine readings
//!
//! Each reading draws RPM, pressure, vibration and EGT uniformly from their
//! normal operating bands. With probability `p` one of three anomaly
//! patterns then overwrites a single field.

use chrono::Utc;
use rand::prelude::*;
use rand_distr::{Distribution, Uniform};

use crate::types::{AnomalyType, Severity, TelemetryReading};

// ============================================================================
// Operating Bands
// ============================================================================

/// Closed interval a sensor value is drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorBand {
    pub min: f64,
    pub max: f64,
}

impl SensorBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        Uniform::new_inclusive(self.min, self.max).sample(rng)
    }
}

/// Normal engine speed (rpm)
pub const RPM_BAND: SensorBand = SensorBand::new(8500.0, 9500.0);
/// Normal hydraulic pressure (PSI)
pub const PRESSURE_BAND: SensorBand = SensorBand::new(1800.0, 2000.0);
/// Normal vibration (mm/s)
pub const VIBRATION_BAND: SensorBand = SensorBand::new(0.1, 0.8);
/// Normal exhaust gas temperature (°C)
pub const EGT_BAND: SensorBand = SensorBand::new(700.0, 800.0);

/// Pressure after a drop, roughly 40-60% of normal
pub const PRESSURE_DROP_BAND: SensorBand = SensorBand::new(700.0, 1200.0);
/// Vibration during a spike, 2-4x normal
pub const VIBRATION_SPIKE_BAND: SensorBand = SensorBand::new(1.5, 3.5);
/// EGT after a jump, 1.3-1.6x normal
pub const EGT_JUMP_BAND: SensorBand = SensorBand::new(950.0, 1200.0);

/// Draw one feature vector `[rpm, pressure, vibration, egt]` from the normal bands.
pub fn sample_normal_features<R: Rng + ?Sized>(rng: &mut R) -> [f64; 4] {
    [
        RPM_BAND.sample(rng),
        PRESSURE_BAND.sample(rng),
        VIBRATION_BAND.sample(rng),
        EGT_BAND.sample(rng),
    ]
}

// ============================================================================
// Simulator
// ============================================================================

/// Infinite, non-restartable telemetry source.
///
/// Implements `Iterator` and never returns `None`. The only state carried
/// between readings is the cycle counter and the RNG stream.
pub struct TelemetrySimulator {
    rng: StdRng,
    anomaly_probability: f64,
    cycle: u64,
    anomalies_injected: u64,
}

impl TelemetrySimulator {
    /// Simulator seeded from OS entropy.
    pub fn new(anomaly_probability: f64) -> Self {
        Self::with_rng(anomaly_probability, StdRng::from_entropy())
    }

    /// Reproducible simulator.
    pub fn with_seed(anomaly_probability: f64, seed: u64) -> Self {
        Self::with_rng(anomaly_probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(anomaly_probability: f64, rng: StdRng) -> Self {
        let p = if anomaly_probability.is_nan() {
            0.0
        } else {
            anomaly_probability.clamp(0.0, 1.0)
        };
        Self {
            rng,
            anomaly_probability: p,
            cycle: 0,
            anomalies_injected: 0,
        }
    }

    pub fn anomaly_probability(&self) -> f64 {
        self.anomaly_probability
    }

    /// Cycle number of the last reading produced (0 before the first).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn anomalies_injected(&self) -> u64 {
        self.anomalies_injected
    }

    /// Produce the next reading and advance the cycle counter.
    pub fn next_reading(&mut self) -> TelemetryReading {
        self.cycle += 1;

        let [rpm, pressure, vibration, egt] = sample_normal_features(&mut self.rng);
        let mut reading = TelemetryReading {
            rpm,
            pressure,
            vibration,
            egt,
            anomaly_type: None,
            anomaly_severity: None,
            timestamp: Utc::now(),
            cycle: self.cycle,
        };

        if self.rng.gen_bool(self.anomaly_probability) {
            let pattern = AnomalyType::ALL[self.rng.gen_range(0..AnomalyType::ALL.len())];
            self.inject(&mut reading, pattern);
        }

        reading
    }

    fn inject(&mut self, reading: &mut TelemetryReading, pattern: AnomalyType) {
        let severity = match pattern {
            AnomalyType::PressureDrop => {
                reading.pressure = PRESSURE_DROP_BAND.sample(&mut self.rng);
                Severity::High
            }
            AnomalyType::VibrationSpike => {
                reading.vibration = VIBRATION_SPIKE_BAND.sample(&mut self.rng);
                Severity::High
            }
            AnomalyType::EgtJump => {
                reading.egt = EGT_JUMP_BAND.sample(&mut self.rng);
                Severity::Critical
            }
        };
        reading.anomaly_type = Some(pattern);
        reading.anomaly_severity = Some(severity);
        self.anomalies_injected += 1;
    }
}

impl Iterator for TelemetrySimulator {
    type Item = TelemetryReading;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_reading())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out_of_band_fields(r: &TelemetryReading) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if !RPM_BAND.contains(r.rpm) {
            fields.push("rpm");
        }
        if !PRESSURE_BAND.contains(r.pressure) {
            fields.push("pressure");
        }
        if !VIBRATION_BAND.contains(r.vibration) {
            fields.push("vibration");
        }
        if !EGT_BAND.contains(r.egt) {
            fields.push("egt");
        }
        fields
    }

    #[test]
    fn test_cycle_counter_starts_at_one() {
        let mut sim = TelemetrySimulator::with_seed(0.15, 7);
        let cycles: Vec<u64> = sim.by_ref().take(5).map(|r| r.cycle).collect();
        assert_eq!(cycles, vec![1, 2, 3, 4, 5]);
        assert_eq!(TelemetrySimulator::cycle(&sim), 5);
    }

    #[test]
    fn test_zero_probability_never_injects() {
        let sim = TelemetrySimulator::with_seed(0.0, 11);
        for r in sim.take(500) {
            assert!(r.anomaly_type.is_none());
            assert!(r.anomaly_severity.is_none());
            assert!(out_of_band_fields(&r).is_empty(), "cycle {} out of band", r.cycle);
        }
    }

    #[test]
    fn test_injected_anomaly_moves_exactly_one_field() {
        let sim = TelemetrySimulator::with_seed(1.0, 3);
        let mut seen = std::collections::HashSet::new();
        for r in sim.take(300) {
            let pattern = r.anomaly_type.expect("p = 1.0 always injects");
            seen.insert(pattern);
            let fields = out_of_band_fields(&r);
            let expected = match pattern {
                AnomalyType::PressureDrop => "pressure",
                AnomalyType::VibrationSpike => "vibration",
                AnomalyType::EgtJump => "egt",
            };
            assert_eq!(fields, vec![expected]);
            let severity = r.anomaly_severity.expect("severity set with type");
            match pattern {
                AnomalyType::EgtJump => assert_eq!(severity, Severity::Critical),
                _ => assert_eq!(severity, Severity::High),
            }
        }
        assert_eq!(seen.len(), 3, "all three patterns should appear in 300 draws");
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a: Vec<_> = TelemetrySimulator::with_seed(0.5, 99)
            .take(20)
            .map(|r| (r.features(), r.anomaly_type))
            .collect();
        let b: Vec<_> = TelemetrySimulator::with_seed(0.5, 99)
            .take(20)
            .map(|r| (r.features(), r.anomaly_type))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(TelemetrySimulator::with_seed(4.0, 1).anomaly_probability(), 1.0);
        assert_eq!(TelemetrySimulator::with_seed(-1.0, 1).anomaly_probability(), 0.0);
    }
}
