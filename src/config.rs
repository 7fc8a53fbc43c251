//! Measurement configuration.
//!
//! A single immutable struct passed into the controller at construction.
//! Every field has a default tuned for a WT901-class sensor streaming at
//! 50 Hz, so a JSON file only needs to name the values it overrides.

use crate::error::{MResult, MeasurementError};
use crate::filters::FilterResponse;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the bias/baseline estimation window is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalibrationWindow {
    /// No calibration phase; the first sample becomes the baseline.
    Disabled,
    /// Accumulate until this many seconds have elapsed since the first sample.
    Duration { seconds: f64 },
    /// Accumulate exactly this many samples.
    Samples { count: usize },
}

impl CalibrationWindow {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CalibrationWindow::Disabled)
    }
}

/// Which motion model turns calibrated sensor values into displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModelKind {
    /// Bias removal, gravity extraction, damped double integration with ZUPT.
    Acceleration,
    /// High-passed Euler angle scaled to millimetres.
    Angle,
    /// Integrated angular rate, high-passed and scaled to millimetres.
    Gyro,
}

/// Parameters for the batch metrics formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsParams {
    pub amplitude_threshold_freq_mm: f64,
    pub amplitude_threshold_coord_mm: f64,
    pub min_cycle_samples: usize,
    pub oscillation_correction: f64,
    pub coordination_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    // Session timing
    pub measurement_duration_sec: f64,
    pub expected_sample_rate_hz: f64,
    /// Intervals above this (or non-positive ones) fall back to 1/rate.
    pub max_dt_sec: f64,
    pub calibration: CalibrationWindow,
    pub stabilization_duration_sec: f64,

    // Motion model
    pub motion_model: MotionModelKind,
    pub gravity_low_pass: FilterResponse,
    pub accel_high_pass: FilterResponse,
    pub velocity_damping_per_sec: f64,
    pub zupt_threshold_mm_s2: f64,
    pub zupt_velocity_mm_s: f64,
    pub zupt_sample_count: usize,
    pub angle_high_pass: FilterResponse,
    pub angle_to_mm_scale_x: f64,
    pub angle_to_mm_scale_y: f64,
    pub gyro_low_pass: FilterResponse,
    pub axis_invert_x: f64,
    pub axis_invert_y: f64,

    // Limits and validity
    pub position_limit_mm: f64,
    pub artifact_jump_mm: f64,
    pub max_gap_sec: f64,
    pub artifact_threshold_mm: f64,

    // Metrics
    pub amplitude_threshold_freq_mm: f64,
    pub amplitude_threshold_coord_mm: f64,
    pub min_cycle_samples: usize,
    pub oscillation_correction: f64,
    pub coordination_scale: f64,

    // Auto start
    pub autostart_threshold_mm: f64,
    pub autostart_base_samples: usize,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            measurement_duration_sec: 10.0,
            expected_sample_rate_hz: 50.0,
            max_dt_sec: 0.5,
            calibration: CalibrationWindow::Duration { seconds: 0.2 },
            stabilization_duration_sec: 0.0,

            motion_model: MotionModelKind::Acceleration,
            gravity_low_pass: FilterResponse::Cutoff { hz: 0.1 },
            accel_high_pass: FilterResponse::Cutoff { hz: 0.3 },
            velocity_damping_per_sec: 0.5,
            zupt_threshold_mm_s2: 12.0,
            zupt_velocity_mm_s: 2.0,
            zupt_sample_count: 10,
            angle_high_pass: FilterResponse::FixedAlpha { alpha: 0.86 },
            angle_to_mm_scale_x: 4.3,
            angle_to_mm_scale_y: 4.3,
            gyro_low_pass: FilterResponse::Cutoff { hz: 5.0 },
            axis_invert_x: 1.0,
            axis_invert_y: -1.0,

            position_limit_mm: 40.0,
            artifact_jump_mm: 15.0,
            max_gap_sec: 0.1,
            artifact_threshold_mm: 40.0,

            amplitude_threshold_freq_mm: 3.0,
            amplitude_threshold_coord_mm: 1.5,
            min_cycle_samples: 3,
            oscillation_correction: 0.30,
            coordination_scale: 0.60,

            autostart_threshold_mm: 5.0,
            autostart_base_samples: 10,
        }
    }
}

impl MeasurementConfig {
    /// Load a (partial) configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> MResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MeasurementError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        let config: MeasurementConfig = serde_json::from_str(&text)
            .map_err(|e| MeasurementError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Nominal interval between samples.
    pub fn nominal_dt(&self) -> f64 {
        1.0 / self.expected_sample_rate_hz
    }

    pub fn metrics_params(&self) -> MetricsParams {
        MetricsParams {
            amplitude_threshold_freq_mm: self.amplitude_threshold_freq_mm,
            amplitude_threshold_coord_mm: self.amplitude_threshold_coord_mm,
            min_cycle_samples: self.min_cycle_samples,
            oscillation_correction: self.oscillation_correction,
            coordination_scale: self.coordination_scale,
        }
    }

    pub fn validate(&self) -> MResult<()> {
        validate_duration(self.measurement_duration_sec)?;
        positive("expected_sample_rate_hz", self.expected_sample_rate_hz)?;
        positive("max_dt_sec", self.max_dt_sec)?;

        match self.calibration {
            CalibrationWindow::Disabled => {}
            CalibrationWindow::Duration { seconds } => non_negative("calibration.seconds", seconds)?,
            CalibrationWindow::Samples { count } => {
                if count == 0 {
                    return Err(invalid("calibration.count must be at least 1"));
                }
            }
        }
        non_negative("stabilization_duration_sec", self.stabilization_duration_sec)?;

        for (name, response) in [
            ("gravity_low_pass", &self.gravity_low_pass),
            ("accel_high_pass", &self.accel_high_pass),
            ("angle_high_pass", &self.angle_high_pass),
            ("gyro_low_pass", &self.gyro_low_pass),
        ] {
            response
                .validate()
                .map_err(|reason| invalid(&format!("{}: {}", name, reason)))?;
        }

        non_negative("velocity_damping_per_sec", self.velocity_damping_per_sec)?;
        non_negative("zupt_threshold_mm_s2", self.zupt_threshold_mm_s2)?;
        non_negative("zupt_velocity_mm_s", self.zupt_velocity_mm_s)?;
        if self.zupt_sample_count == 0 {
            return Err(invalid("zupt_sample_count must be at least 1"));
        }
        finite("angle_to_mm_scale_x", self.angle_to_mm_scale_x)?;
        finite("angle_to_mm_scale_y", self.angle_to_mm_scale_y)?;
        finite("axis_invert_x", self.axis_invert_x)?;
        finite("axis_invert_y", self.axis_invert_y)?;

        positive("position_limit_mm", self.position_limit_mm)?;
        positive("artifact_jump_mm", self.artifact_jump_mm)?;
        positive("max_gap_sec", self.max_gap_sec)?;
        positive("artifact_threshold_mm", self.artifact_threshold_mm)?;

        non_negative("amplitude_threshold_freq_mm", self.amplitude_threshold_freq_mm)?;
        non_negative("amplitude_threshold_coord_mm", self.amplitude_threshold_coord_mm)?;
        if self.min_cycle_samples < 3 {
            return Err(invalid("min_cycle_samples must be at least 3"));
        }
        non_negative("oscillation_correction", self.oscillation_correction)?;
        non_negative("coordination_scale", self.coordination_scale)?;

        non_negative("autostart_threshold_mm", self.autostart_threshold_mm)?;
        if self.autostart_base_samples == 0 {
            return Err(invalid("autostart_base_samples must be at least 1"));
        }

        Ok(())
    }
}

/// Target durations must be finite and strictly positive.
pub fn validate_duration(duration_sec: f64) -> MResult<()> {
    if duration_sec.is_finite() && duration_sec > 0.0 {
        Ok(())
    } else {
        Err(MeasurementError::InvalidDuration(duration_sec))
    }
}

fn invalid(reason: &str) -> MeasurementError {
    MeasurementError::InvalidConfig(reason.to_string())
}

fn finite(name: &str, value: f64) -> MResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(&format!("{} must be finite, got {}", name, value)))
    }
}

fn positive(name: &str, value: f64) -> MResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{} must be > 0, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> MResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{} must be >= 0, got {}", name, value)))
    }
}
