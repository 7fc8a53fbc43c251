//! Per-sample motion estimation: calibrated sensor values in, millimetre
//! displacement out.
//!
//! The processor owns calibration and the timing/limit bookkeeping. The
//! actual signal chain is a [`MotionModel`] strategy selected by
//! [`MotionModelKind`]: double-integrated acceleration (canonical), high-passed
//! Euler angle, or integrated gyro rate.

pub mod accel;
pub mod angle;
pub mod calibration;
pub mod gyro;

pub use accel::AccelIntegrator;
pub use angle::AngleTracker;
pub use calibration::BiasEstimator;
pub use gyro::GyroTracker;

use crate::config::{MeasurementConfig, MotionModelKind};
use crate::sensors::SensorSample;
use crate::types::{clamp_radius, AccelMm, Axis2, PositionMm, VelocityMm};
use serde::{Deserialize, Serialize};

/// Output of one model step, before axis inversion and limiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelStep {
    pub accel: AccelMm,
    pub velocity: VelocityMm,
    pub position: PositionMm,
}

/// A displacement estimator fed with bias-free values.
pub trait MotionModel: Send {
    fn name(&self) -> &'static str;

    /// The channel pair this model consumes and calibrates against.
    fn reference(&self, sample: &SensorSample) -> Axis2;

    /// Advance the model by one sample. `centered` is `reference - bias`.
    fn step(&mut self, centered: Axis2, dt: f64) -> ModelStep;

    fn reset(&mut self);
}

/// Velocity and acceleration by finite differences of a position stream,
/// for models that produce position directly.
#[derive(Debug, Clone, Default)]
pub struct PositionDerivative {
    prev_position: Option<PositionMm>,
    prev_velocity: VelocityMm,
}

impl PositionDerivative {
    pub fn update(&mut self, position: PositionMm, dt: f64) -> ModelStep {
        let (velocity, accel) = match self.prev_position {
            Some(prev) if dt > 0.0 => {
                let v = (position - prev) / dt;
                (v, (v - self.prev_velocity) / dt)
            }
            _ => (VelocityMm::zeros(), AccelMm::zeros()),
        };
        self.prev_position = Some(position);
        self.prev_velocity = velocity;
        ModelStep {
            accel,
            velocity,
            position,
        }
    }

    pub fn reset(&mut self) {
        self.prev_position = None;
        self.prev_velocity = VelocityMm::zeros();
    }
}

/// Motion estimate for one calibrated sample (axis inversion applied).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub ax_mm: f64,
    pub ay_mm: f64,
    pub vx_mm: f64,
    pub vy_mm: f64,
    pub sx_mm: f64,
    pub sy_mm: f64,
    pub sx_mm_raw: f64,
    pub sy_mm_raw: f64,
    pub has_artifact: bool,
}

#[derive(Debug, Clone, Copy)]
struct ProcessorSettings {
    nominal_dt: f64,
    max_dt: f64,
    invert: Axis2,
    position_limit_mm: f64,
    artifact_jump_mm: f64,
}

pub struct MotionProcessor {
    settings: ProcessorSettings,
    model: Box<dyn MotionModel>,
    calibration: BiasEstimator,
    start_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    prev_raw_position: Option<PositionMm>,
}

impl MotionProcessor {
    pub fn new(config: &MeasurementConfig) -> Self {
        let model: Box<dyn MotionModel> = match config.motion_model {
            MotionModelKind::Acceleration => Box::new(AccelIntegrator::new(config)),
            MotionModelKind::Angle => Box::new(AngleTracker::new(config)),
            MotionModelKind::Gyro => Box::new(GyroTracker::new(config)),
        };
        Self::from_model(config, model)
    }

    /// Build around a caller-supplied model (limits and calibration still
    /// come from `config`).
    pub fn from_model(config: &MeasurementConfig, model: Box<dyn MotionModel>) -> Self {
        Self {
            settings: ProcessorSettings {
                nominal_dt: config.nominal_dt(),
                max_dt: config.max_dt_sec,
                invert: Axis2::new(config.axis_invert_x, config.axis_invert_y),
                position_limit_mm: config.position_limit_mm,
                artifact_jump_mm: config.artifact_jump_mm,
            },
            model,
            calibration: BiasEstimator::new(config.calibration),
            start_timestamp: None,
            last_timestamp: None,
            prev_raw_position: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_complete()
    }

    pub fn bias(&self) -> Option<Axis2> {
        self.calibration.bias()
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Clear calibration, filters and integrators. Called at every session start.
    pub fn reset(&mut self) {
        self.model.reset();
        self.calibration.reset();
        self.start_timestamp = None;
        self.last_timestamp = None;
        self.prev_raw_position = None;
    }

    fn step_dt(&self, timestamp: f64) -> f64 {
        match self.last_timestamp {
            Some(prev) => {
                let dt = timestamp - prev;
                if dt <= 0.0 || dt > self.settings.max_dt {
                    self.settings.nominal_dt
                } else {
                    dt
                }
            }
            None => self.settings.nominal_dt,
        }
    }

    /// Feed one sample. Returns `None` for samples consumed by calibration.
    pub fn process(&mut self, sample: &SensorSample) -> Option<MotionState> {
        let timestamp = sample.timestamp;
        let start = *self.start_timestamp.get_or_insert(timestamp);
        let dt = self.step_dt(timestamp);
        self.last_timestamp = Some(timestamp);

        let reference = self.model.reference(sample);

        if !self.calibration.is_complete() {
            let bias = self.calibration.observe(reference, timestamp - start)?;
            log::info!(
                "[CALIBRATION] {} bias ({:.4}, {:.4}) from {} samples",
                self.model.name(),
                bias.x,
                bias.y,
                self.calibration.sample_count()
            );
            if self.calibration.window().is_enabled() {
                return None;
            }
        }

        let bias = self.calibration.bias()?;
        let step = self.model.step(reference - bias, dt);

        let invert = self.settings.invert;
        let raw = step.position.component_mul(&invert);
        let display = clamp_radius(raw, self.settings.position_limit_mm);
        let velocity = step.velocity.component_mul(&invert);
        let accel = step.accel.component_mul(&invert);

        let jump = self
            .prev_raw_position
            .map(|prev| (raw - prev).norm())
            .unwrap_or(0.0);
        self.prev_raw_position = Some(raw);

        let has_artifact =
            raw.norm() > self.settings.position_limit_mm || jump > self.settings.artifact_jump_mm;
        if has_artifact {
            log::debug!(
                "[MOTION] artifact at t={:.3}: radius {:.1} mm, jump {:.1} mm",
                timestamp,
                raw.norm(),
                jump
            );
        }

        Some(MotionState {
            ax_mm: accel.x,
            ay_mm: accel.y,
            vx_mm: velocity.x,
            vy_mm: velocity.y,
            sx_mm: display.x,
            sy_mm: display.y,
            sx_mm_raw: raw.x,
            sy_mm_raw: raw.y,
            has_artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalibrationWindow;
    use approx::assert_relative_eq;

    fn angle_config() -> MeasurementConfig {
        MeasurementConfig {
            motion_model: MotionModelKind::Angle,
            calibration: CalibrationWindow::Samples { count: 5 },
            axis_invert_y: 1.0,
            ..MeasurementConfig::default()
        }
    }

    /// Model that reports the centered input as position, for exercising
    /// the processor's own bookkeeping.
    struct Passthrough;

    impl MotionModel for Passthrough {
        fn name(&self) -> &'static str {
            "passthrough"
        }
        fn reference(&self, sample: &SensorSample) -> Axis2 {
            Axis2::new(sample.angle_deg.x, sample.angle_deg.y)
        }
        fn step(&mut self, centered: Axis2, _dt: f64) -> ModelStep {
            ModelStep {
                accel: Axis2::zeros(),
                velocity: Axis2::zeros(),
                position: centered,
            }
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn test_calibration_gating() {
        let mut mp = MotionProcessor::new(&angle_config());
        for i in 0..5 {
            let sample = SensorSample::new(i as f64 * 0.02).with_angle(2.0, -1.0, 0.0);
            assert!(mp.process(&sample).is_none());
            assert_eq!(mp.is_calibrated(), i == 4);
        }
        let out = mp.process(&SensorSample::new(0.10).with_angle(2.0, -1.0, 0.0));
        assert!(out.is_some());
        assert!(mp.is_calibrated());
        let bias = mp.bias().unwrap();
        assert_relative_eq!(bias.x, 2.0);
        assert_relative_eq!(bias.y, -1.0);
    }

    #[test]
    fn test_disabled_calibration_emits_first_sample() {
        let config = MeasurementConfig {
            calibration: CalibrationWindow::Disabled,
            ..angle_config()
        };
        let mut mp = MotionProcessor::new(&config);
        let out = mp
            .process(&SensorSample::new(0.0).with_angle(3.0, 3.0, 0.0))
            .unwrap();
        assert_eq!(out.sx_mm_raw, 0.0);
        assert_eq!(out.sy_mm_raw, 0.0);
        assert!(mp.is_calibrated());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let config = MeasurementConfig {
            calibration: CalibrationWindow::Disabled,
            motion_model: MotionModelKind::Acceleration,
            ..MeasurementConfig::default()
        };
        let samples: Vec<SensorSample> = (0..20)
            .map(|i| {
                let t = i as f64 * 0.02;
                SensorSample::new(t).with_accel(0.05 * (t * 6.0).sin(), 0.01, 1.0)
            })
            .collect();

        let mut mp = MotionProcessor::new(&config);
        let first: Vec<_> = samples.iter().map(|s| mp.process(s)).collect();
        mp.reset();
        assert!(!mp.is_calibrated());
        let second: Vec<_> = samples.iter().map(|s| mp.process(s)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_artifact_on_single_frame_jump() {
        let config = MeasurementConfig {
            calibration: CalibrationWindow::Disabled,
            artifact_jump_mm: 15.0,
            axis_invert_y: 1.0,
            ..MeasurementConfig::default()
        };
        let mut mp = MotionProcessor::from_model(&config, Box::new(Passthrough));
        let inputs = [0.0, 1.0, 2.0, 22.0, 23.0];
        let flags: Vec<bool> = inputs
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let sample = SensorSample::new(i as f64 * 0.02).with_angle(*x, 0.0, 0.0);
                mp.process(&sample).unwrap().has_artifact
            })
            .collect();
        assert_eq!(flags, vec![false, false, false, true, false]);
    }

    #[test]
    fn test_display_position_clamped() {
        let config = MeasurementConfig {
            calibration: CalibrationWindow::Disabled,
            position_limit_mm: 40.0,
            axis_invert_x: -1.0,
            axis_invert_y: 1.0,
            ..MeasurementConfig::default()
        };
        let mut mp = MotionProcessor::from_model(&config, Box::new(Passthrough));
        mp.process(&SensorSample::new(0.0).with_angle(0.0, 0.0, 0.0));
        let out = mp
            .process(&SensorSample::new(0.02).with_angle(30.0, 40.0, 0.0))
            .unwrap();
        assert_relative_eq!(out.sx_mm_raw, -30.0);
        assert_relative_eq!(out.sy_mm_raw, 40.0);
        assert_relative_eq!(out.sx_mm, -24.0, epsilon = 1e-9);
        assert_relative_eq!(out.sy_mm, 32.0, epsilon = 1e-9);
        assert!(out.has_artifact);
    }

    #[test]
    fn test_position_derivative() {
        let mut d = PositionDerivative::default();
        let s0 = d.update(PositionMm::new(0.0, 0.0), 0.1);
        assert_eq!(s0.velocity, VelocityMm::zeros());
        let s1 = d.update(PositionMm::new(1.0, 0.0), 0.1);
        assert_relative_eq!(s1.velocity.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(s1.accel.x, 100.0, epsilon = 1e-9);
        let s2 = d.update(PositionMm::new(2.0, 0.0), 0.1);
        assert_relative_eq!(s2.velocity.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(s2.accel.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_model_selection() {
        for (kind, name) in [
            (MotionModelKind::Acceleration, "acceleration"),
            (MotionModelKind::Angle, "angle"),
            (MotionModelKind::Gyro, "gyro"),
        ] {
            let config = MeasurementConfig {
                motion_model: kind,
                ..MeasurementConfig::default()
            };
            assert_eq!(MotionProcessor::new(&config).model_name(), name);
        }
    }
}
