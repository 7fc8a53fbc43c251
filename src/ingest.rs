//! Channel between a sensor transport and the controller.
//!
//! One worker thread owns the [`MeasurementController`] and drains a bounded
//! command queue in arrival order, so samples, starts and stops are
//! serialized without any locking around the pipeline state. Observers read
//! `watch` snapshots and never touch the worker.

use crate::config::validate_duration;
use crate::controller::MeasurementController;
use crate::error::{MResult, MeasurementError};
use crate::sensors::SensorSample;
use crate::types::MeasurementState;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub enum Command {
    Start { duration_sec: f64 },
    Sample(SensorSample),
    Stop { reset_to_idle: bool },
    Shutdown,
}

pub struct IngestHandle {
    tx: Sender<Command>,
    state_rx: watch::Receiver<MeasurementState>,
    worker: Option<JoinHandle<MeasurementController>>,
}

/// Move `controller` onto a worker thread fed by a queue of `capacity` commands.
pub fn spawn(controller: MeasurementController, capacity: usize) -> MResult<IngestHandle> {
    let (tx, rx) = channel::bounded(capacity);
    let state_rx = controller.subscribe();

    let worker = thread::Builder::new()
        .name("measurement-ingest".to_string())
        .spawn(move || run_worker(controller, rx))
        .map_err(|e| MeasurementError::Internal(format!("failed to spawn worker: {}", e)))?;

    Ok(IngestHandle {
        tx,
        state_rx,
        worker: Some(worker),
    })
}

fn run_worker(mut controller: MeasurementController, rx: Receiver<Command>) -> MeasurementController {
    let mut rejected = 0u64;

    for command in rx.iter() {
        match command {
            Command::Start { duration_sec } => {
                if let Err(e) = controller.start_measurement(duration_sec) {
                    log::warn!("[INGEST] start rejected: {}", e);
                }
            }
            Command::Sample(sample) => {
                if controller.on_sample(&sample).is_err() {
                    rejected += 1;
                    if rejected % 100 == 1 {
                        log::debug!("[INGEST] {} samples arrived with no session running", rejected);
                    }
                }
            }
            Command::Stop { reset_to_idle } => {
                controller.stop_measurement(reset_to_idle);
            }
            Command::Shutdown => break,
        }
    }

    log::info!("[INGEST] worker stopped ({} samples rejected)", rejected);
    controller
}

fn map_send_error(err: TrySendError<Command>) -> MeasurementError {
    match err {
        TrySendError::Full(_) => MeasurementError::QueueFull,
        TrySendError::Disconnected(_) => MeasurementError::Disconnected,
    }
}

impl IngestHandle {
    /// Queue a session start. The duration is checked here so a bad value
    /// is reported to the caller rather than only logged by the worker.
    pub fn start(&self, duration_sec: f64) -> MResult<()> {
        validate_duration(duration_sec)?;
        self.tx
            .send(Command::Start { duration_sec })
            .map_err(|_| MeasurementError::Disconnected)
    }

    /// Never blocks: a full queue drops the sample and reports `QueueFull`.
    pub fn push_sample(&self, sample: SensorSample) -> MResult<()> {
        self.tx
            .try_send(Command::Sample(sample))
            .map_err(map_send_error)
    }

    /// Takes effect once the worker reaches this command.
    pub fn stop(&self, reset_to_idle: bool) -> MResult<()> {
        self.tx
            .send(Command::Stop { reset_to_idle })
            .map_err(|_| MeasurementError::Disconnected)
    }

    pub fn subscribe(&self) -> watch::Receiver<MeasurementState> {
        self.state_rx.clone()
    }

    /// Latest published snapshot.
    pub fn state(&self) -> MeasurementState {
        self.state_rx.borrow().clone()
    }

    /// Commands queued but not yet handled.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Drain the queue, stop the worker and hand back the controller.
    pub fn shutdown(mut self) -> MResult<MeasurementController> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| MeasurementError::Internal("worker already joined".to_string()))?;
        self.tx
            .send(Command::Shutdown)
            .map_err(|_| MeasurementError::Disconnected)?;
        worker
            .join()
            .map_err(|_| MeasurementError::Internal("ingest worker panicked".to_string()))
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Command::Shutdown);
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalibrationWindow, MeasurementConfig, MotionModelKind};
    use crate::synth::{self, SampleClock, SwingAxis};
    use crate::types::MeasurementStatus;

    fn controller() -> MeasurementController {
        MeasurementController::new(MeasurementConfig {
            motion_model: MotionModelKind::Angle,
            calibration: CalibrationWindow::Disabled,
            ..MeasurementConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_commands_processed_in_order() {
        let handle = spawn(controller(), 1024).unwrap();
        handle.start(10.0).unwrap();
        for sample in synth::sine_angle(SampleClock::new(50.0, 100), SwingAxis::X, 5.0, 1.0) {
            handle.push_sample(sample).unwrap();
        }
        handle.stop(false).unwrap();

        let controller = handle.shutdown().unwrap();
        assert_eq!(controller.status(), MeasurementStatus::Complete);
        let result = controller.state().result.unwrap();
        assert_eq!(result.samples.len(), 100);
    }

    #[test]
    fn test_samples_before_start_are_dropped() {
        let handle = spawn(controller(), 64).unwrap();
        handle.push_sample(SensorSample::new(0.0)).unwrap();
        handle.start(10.0).unwrap();
        handle.push_sample(SensorSample::new(0.02)).unwrap();

        let controller = handle.shutdown().unwrap();
        assert_eq!(controller.samples().len(), 1);
        assert_eq!(controller.status(), MeasurementStatus::Measuring);
    }

    #[test]
    fn test_invalid_start_reported_synchronously() {
        let handle = spawn(controller(), 8).unwrap();
        assert_eq!(handle.start(0.0), Err(MeasurementError::InvalidDuration(0.0)));
        let controller = handle.shutdown().unwrap();
        assert_eq!(controller.status(), MeasurementStatus::Idle);
    }

    #[test]
    fn test_observer_sees_worker_updates() {
        let handle = spawn(controller(), 8).unwrap();
        let mut rx = handle.subscribe();
        handle.start(10.0).unwrap();
        let controller = handle.shutdown().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, MeasurementStatus::Measuring);
        assert_eq!(controller.state().status, MeasurementStatus::Measuring);
    }

    #[test]
    fn test_send_error_mapping() {
        let full = map_send_error(TrySendError::Full(Command::Shutdown));
        assert_eq!(full, MeasurementError::QueueFull);
        let gone = map_send_error(TrySendError::Disconnected(Command::Shutdown));
        assert_eq!(gone, MeasurementError::Disconnected);
    }
}
