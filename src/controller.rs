//! Measurement session state machine.
//!
//! `Idle -> Calibrating -> Stabilizing -> Measuring -> Complete`, driven
//! entirely by `on_sample`. Every call republishes a full
//! [`MeasurementState`] snapshot on a `watch` channel, so any number of
//! observers can read the latest state without ever blocking the producer.

use crate::config::{validate_duration, MeasurementConfig, MetricsParams};
use crate::error::{MResult, MeasurementError};
use crate::metrics::build_metrics;
use crate::processor::{SampleOutcome, SampleProcessor};
use crate::sensors::SensorSample;
use crate::types::{
    MeasurementMetrics, MeasurementResult, MeasurementState, MeasurementStatus, ProcessedSample,
};
use crate::validity::{ValidityIssue, ValidityTracker};
use chrono::Utc;
use tokio::sync::watch;

pub struct MeasurementController {
    config: MeasurementConfig,
    params: MetricsParams,
    processor: SampleProcessor,
    validity: ValidityTracker,
    samples: Vec<ProcessedSample>,
    status: MeasurementStatus,
    session_id: String,
    target_duration_sec: f64,
    elapsed_sec: f64,
    metrics: MeasurementMetrics,
    result: Option<MeasurementResult>,
    publisher: watch::Sender<MeasurementState>,
}

impl MeasurementController {
    pub fn new(config: MeasurementConfig) -> MResult<Self> {
        config.validate()?;
        let (publisher, _) = watch::channel(MeasurementState::default());

        Ok(Self {
            params: config.metrics_params(),
            processor: SampleProcessor::new(&config),
            validity: ValidityTracker::new(config.max_gap_sec, config.artifact_threshold_mm),
            samples: Vec::new(),
            status: MeasurementStatus::Idle,
            session_id: String::new(),
            target_duration_sec: 0.0,
            elapsed_sec: 0.0,
            metrics: MeasurementMetrics::default(),
            result: None,
            publisher,
            config,
        })
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    pub fn status(&self) -> MeasurementStatus {
        self.status
    }

    pub fn is_calibrated(&self) -> bool {
        self.processor.is_calibrated()
    }

    /// Samples collected so far in the current session.
    pub fn samples(&self) -> &[ProcessedSample] {
        &self.samples
    }

    /// Latest published snapshot.
    pub fn state(&self) -> MeasurementState {
        self.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MeasurementState> {
        self.publisher.subscribe()
    }

    fn initial_status(&self) -> MeasurementStatus {
        if self.config.calibration.is_enabled() {
            MeasurementStatus::Calibrating
        } else if self.config.stabilization_duration_sec > 0.0 {
            MeasurementStatus::Stabilizing
        } else {
            MeasurementStatus::Measuring
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(MeasurementState {
            status: self.status,
            elapsed_sec: self.elapsed_sec,
            target_duration_sec: self.target_duration_sec,
            processed_samples: self.samples.clone(),
            metrics: self.metrics,
            result: self.result.clone(),
            is_valid: self.validity.is_valid(),
            validation_message: self.validity.message().map(str::to_string),
        });
    }

    fn clear_session(&mut self) {
        self.processor.reset();
        self.validity.reset();
        self.samples.clear();
        self.elapsed_sec = 0.0;
        self.metrics = MeasurementMetrics::default();
        self.result = None;
    }

    /// Begin a new session. Restarts cleanly if one is already running.
    pub fn start_measurement(&mut self, duration_sec: f64) -> MResult<()> {
        validate_duration(duration_sec)?;

        if self.status.is_active() {
            log::info!("[SESSION] {} restarted", self.session_id);
        }

        self.clear_session();
        self.session_id = format!("session_{}", Utc::now().timestamp_millis());
        self.target_duration_sec = duration_sec;
        self.status = self.initial_status();
        log::info!(
            "[SESSION] {} started: {:.1}s, {} model, {:?}",
            self.session_id,
            duration_sec,
            self.processor.motion().model_name(),
            self.status
        );
        self.publish();
        Ok(())
    }

    /// End the session. With `reset_to_idle` (or nothing collected yet) the
    /// session is discarded; otherwise the samples so far are finalized.
    pub fn stop_measurement(&mut self, reset_to_idle: bool) -> Option<MeasurementResult> {
        match self.status {
            MeasurementStatus::Idle => None,
            MeasurementStatus::Complete if !reset_to_idle => self.result.clone(),
            _ if reset_to_idle || self.samples.is_empty() => {
                log::info!("[SESSION] {} stopped without result", self.session_id);
                self.clear_session();
                self.status = MeasurementStatus::Idle;
                self.publish();
                None
            }
            _ => {
                let result = self.finalize();
                self.publish();
                Some(result)
            }
        }
    }

    fn finalize(&mut self) -> MeasurementResult {
        let duration_sec = self.samples.last().map(|s| s.t).unwrap_or(0.0);
        let metrics = build_metrics(&self.samples, duration_sec, &self.params);

        let result = MeasurementResult {
            session_id: self.session_id.clone(),
            recorded_at: Utc::now(),
            metrics,
            duration_sec,
            is_valid: self.validity.is_valid(),
            validation_message: self.validity.message().map(str::to_string),
            samples: self.samples.clone(),
        };

        log::info!(
            "[SESSION] {} complete: {} samples, {:.2}s, stability {:.2}, freq {:.3} Hz, coord {:.3}, valid={}",
            result.session_id,
            result.samples.len(),
            duration_sec,
            metrics.stability,
            metrics.oscillation_frequency,
            metrics.coordination_factor,
            result.is_valid
        );

        self.metrics = metrics;
        self.status = MeasurementStatus::Complete;
        self.result = Some(result.clone());
        result
    }

    /// Sole ingestion point. Must be called from one logical stream.
    pub fn on_sample(&mut self, sample: &SensorSample) -> MResult<MeasurementStatus> {
        if !self.status.is_active() {
            return Err(MeasurementError::NotRunning);
        }

        if !sample.is_well_formed() {
            let issue = ValidityIssue::Malformed {
                timestamp: sample.timestamp,
            };
            log::warn!("[SESSION] skipping {}", issue);
            self.validity.flag(issue);
            self.publish();
            return Ok(self.status);
        }

        if self.validity.check_timestamp(sample.timestamp).is_err() {
            self.publish();
            return Ok(self.status);
        }

        match self.processor.process(sample) {
            SampleOutcome::Measured(processed) => {
                self.validity.check_sample(&processed);
                self.samples.push(processed);
                self.status = MeasurementStatus::Measuring;
                self.elapsed_sec = processed.t;

                if processed.t >= self.target_duration_sec {
                    self.finalize();
                } else {
                    self.metrics = build_metrics(&self.samples, processed.t, &self.params);
                }
            }
            outcome => {
                if outcome.status() != self.status {
                    log::debug!("[SESSION] {:?} -> {:?}", self.status, outcome.status());
                }
                self.status = outcome.status();
            }
        }

        self.publish();
        Ok(self.status)
    }
}
