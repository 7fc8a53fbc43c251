pub mod linalg;

pub use linalg::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One measured sample after motion processing, relative to measurement start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSample {
    /// Seconds since the first measured sample
    pub t: f64,
    pub ax_mm: f64,
    pub ay_mm: f64,
    pub vx_mm: f64,
    pub vy_mm: f64,
    /// Display position, clamped to the configured radius
    pub sx_mm: f64,
    pub sy_mm: f64,
    /// Unclamped position, used by the metrics
    pub sx_mm_raw: f64,
    pub sy_mm_raw: f64,
    /// Velocity norm in mm/s
    pub magnitude: f64,
    pub has_artifact: bool,
}

impl ProcessedSample {
    pub fn position(&self) -> PositionMm {
        PositionMm::new(self.sx_mm, self.sy_mm)
    }

    pub fn raw_position(&self) -> PositionMm {
        PositionMm::new(self.sx_mm_raw, self.sy_mm_raw)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementMetrics {
    /// 0..100, higher is steadier
    pub stability: f64,
    /// Hz
    pub oscillation_frequency: f64,
    /// Lower is more regular
    pub coordination_factor: f64,
}

/// Outcome of one completed session. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub session_id: String,
    pub recorded_at: DateTime<Utc>,
    pub metrics: MeasurementMetrics,
    pub duration_sec: f64,
    pub is_valid: bool,
    pub validation_message: Option<String>,
    pub samples: Vec<ProcessedSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementStatus {
    Idle,
    Calibrating,
    Stabilizing,
    Measuring,
    Complete,
}

impl MeasurementStatus {
    /// True while samples are being consumed.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            MeasurementStatus::Calibrating
                | MeasurementStatus::Stabilizing
                | MeasurementStatus::Measuring
        )
    }
}

/// Live snapshot published on every accepted sample and status transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementState {
    pub status: MeasurementStatus,
    pub elapsed_sec: f64,
    pub target_duration_sec: f64,
    pub processed_samples: Vec<ProcessedSample>,
    pub metrics: MeasurementMetrics,
    pub result: Option<MeasurementResult>,
    pub is_valid: bool,
    pub validation_message: Option<String>,
}

impl Default for MeasurementState {
    fn default() -> Self {
        Self {
            status: MeasurementStatus::Idle,
            elapsed_sec: 0.0,
            target_duration_sec: 0.0,
            processed_samples: Vec::new(),
            metrics: MeasurementMetrics::default(),
            result: None,
            is_valid: true,
            validation_message: None,
        }
    }
}
