//! Calibration/stabilization gating around the motion processor.

use crate::config::MeasurementConfig;
use crate::motion::{MotionProcessor, MotionState};
use crate::sensors::SensorSample;
use crate::types::{MeasurementStatus, ProcessedSample};

/// What became of one sensor sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Consumed by bias estimation
    Calibrating,
    /// Run through the filters but not trusted yet
    Stabilizing,
    Measured(ProcessedSample),
}

impl SampleOutcome {
    pub fn status(&self) -> MeasurementStatus {
        match self {
            SampleOutcome::Calibrating => MeasurementStatus::Calibrating,
            SampleOutcome::Stabilizing => MeasurementStatus::Stabilizing,
            SampleOutcome::Measured(_) => MeasurementStatus::Measuring,
        }
    }
}

pub struct SampleProcessor {
    motion: MotionProcessor,
    stabilization_sec: f64,
    stabilize_start: Option<f64>,
    measure_start: Option<f64>,
}

impl SampleProcessor {
    pub fn new(config: &MeasurementConfig) -> Self {
        Self::with_motion(config, MotionProcessor::new(config))
    }

    pub fn with_motion(config: &MeasurementConfig, motion: MotionProcessor) -> Self {
        Self {
            motion,
            stabilization_sec: config.stabilization_duration_sec,
            stabilize_start: None,
            measure_start: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.motion.is_calibrated()
    }

    pub fn motion(&self) -> &MotionProcessor {
        &self.motion
    }

    /// Timestamp of the first measured sample, once known.
    pub fn measure_start(&self) -> Option<f64> {
        self.measure_start
    }

    pub fn reset(&mut self) {
        self.motion.reset();
        self.stabilize_start = None;
        self.measure_start = None;
    }

    pub fn process(&mut self, sample: &SensorSample) -> SampleOutcome {
        let Some(state) = self.motion.process(sample) else {
            return SampleOutcome::Calibrating;
        };

        let timestamp = sample.timestamp;
        let start = match self.measure_start {
            Some(start) => start,
            None => {
                if self.stabilization_sec > 0.0 {
                    let begin = *self.stabilize_start.get_or_insert(timestamp);
                    if timestamp - begin < self.stabilization_sec {
                        return SampleOutcome::Stabilizing;
                    }
                }
                log::debug!("[PROCESSOR] measuring from t={:.3}", timestamp);
                self.measure_start = Some(timestamp);
                timestamp
            }
        };

        SampleOutcome::Measured(to_processed(timestamp - start, &state))
    }
}

fn to_processed(t: f64, state: &MotionState) -> ProcessedSample {
    ProcessedSample {
        t,
        ax_mm: state.ax_mm,
        ay_mm: state.ay_mm,
        vx_mm: state.vx_mm,
        vy_mm: state.vy_mm,
        sx_mm: state.sx_mm,
        sy_mm: state.sy_mm,
        sx_mm_raw: state.sx_mm_raw,
        sy_mm_raw: state.sy_mm_raw,
        magnitude: state.vx_mm.hypot(state.vy_mm),
        has_artifact: state.has_artifact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalibrationWindow, MotionModelKind};
    use approx::assert_relative_eq;

    fn sample(i: usize) -> SensorSample {
        let t = i as f64 * 0.02;
        SensorSample::new(t).with_angle((t * 6.0).sin(), 0.0, 0.0)
    }

    #[test]
    fn test_phases_in_order() {
        let config = MeasurementConfig {
            motion_model: MotionModelKind::Angle,
            calibration: CalibrationWindow::Samples { count: 3 },
            stabilization_duration_sec: 0.05,
            ..MeasurementConfig::default()
        };
        let mut sp = SampleProcessor::new(&config);
        let statuses: Vec<MeasurementStatus> =
            (0..8).map(|i| sp.process(&sample(i)).status()).collect();
        assert_eq!(
            statuses,
            vec![
                MeasurementStatus::Calibrating,
                MeasurementStatus::Calibrating,
                MeasurementStatus::Calibrating,
                // stabilization starts at t=0.06, ends at t>=0.11
                MeasurementStatus::Stabilizing,
                MeasurementStatus::Stabilizing,
                MeasurementStatus::Stabilizing,
                MeasurementStatus::Measuring,
                MeasurementStatus::Measuring,
            ]
        );
        assert_relative_eq!(sp.measure_start().unwrap(), 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_time_relative_to_first_measured_sample() {
        let config = MeasurementConfig {
            motion_model: MotionModelKind::Angle,
            calibration: CalibrationWindow::Samples { count: 5 },
            ..MeasurementConfig::default()
        };
        let mut sp = SampleProcessor::new(&config);
        let measured: Vec<ProcessedSample> = (0..10)
            .filter_map(|i| match sp.process(&sample(i)) {
                SampleOutcome::Measured(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(measured.len(), 5);
        assert_eq!(measured[0].t, 0.0);
        assert_relative_eq!(measured[4].t, 0.08, epsilon = 1e-12);
        for p in &measured {
            assert_relative_eq!(p.magnitude, p.vx_mm.hypot(p.vy_mm));
        }
    }

    #[test]
    fn test_reset_clears_timing() {
        let config = MeasurementConfig {
            calibration: CalibrationWindow::Disabled,
            ..MeasurementConfig::default()
        };
        let mut sp = SampleProcessor::new(&config);
        sp.process(&sample(0));
        sp.process(&sample(1));
        sp.reset();
        assert!(!sp.is_calibrated());
        assert_eq!(sp.measure_start(), None);
        match sp.process(&sample(7)) {
            SampleOutcome::Measured(p) => assert_eq!(p.t, 0.0),
            other => panic!("expected measured sample, got {:?}", other),
        }
    }
}
