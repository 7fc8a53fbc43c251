// Micro-swing balance measurement core
// Raw inertial samples in, millimetre sway traces and balance metrics out

pub mod autostart;
pub mod config;
pub mod controller;
pub mod error;
pub mod filters;
pub mod ingest;
pub mod metrics;
pub mod motion;
pub mod processor;
pub mod sensors;
pub mod synth;
pub mod types;
pub mod validity;

pub use autostart::AutoStartTrigger;
pub use config::{CalibrationWindow, MeasurementConfig, MetricsParams, MotionModelKind};
pub use controller::MeasurementController;
pub use error::{MResult, MeasurementError};
pub use filters::{FilterResponse, HighPassFilter, LowPassFilter};
pub use ingest::{Command, IngestHandle};
pub use motion::{MotionModel, MotionProcessor, MotionState};
pub use processor::{SampleOutcome, SampleProcessor};
pub use sensors::{Axes3, SensorSample};
pub use types::{
    MeasurementMetrics, MeasurementResult, MeasurementState, MeasurementStatus, ProcessedSample,
};
