//! Deterministic sample streams for tests and dry runs of the replay tool.

use crate::sensors::SensorSample;
use crate::types::GRAVITY_MM_S2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingAxis {
    X,
    Y,
}

/// Sample clock: `count` samples at `rate_hz` starting at `start_sec`.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    pub rate_hz: f64,
    pub start_sec: f64,
    pub count: usize,
}

impl SampleClock {
    pub fn new(rate_hz: f64, count: usize) -> Self {
        Self {
            rate_hz,
            start_sec: 0.0,
            count,
        }
    }

    pub fn starting_at(mut self, start_sec: f64) -> Self {
        self.start_sec = start_sec;
        self
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> {
        let Self {
            rate_hz,
            start_sec,
            count,
        } = *self;
        (0..count).map(move |i| start_sec + i as f64 / rate_hz)
    }
}

/// Euler-angle swing on one axis: `amplitude * sin(2π f t)` degrees, with
/// the gyro channel carrying the matching angular rate.
pub fn sine_angle(
    clock: SampleClock,
    axis: SwingAxis,
    amplitude_deg: f64,
    freq_hz: f64,
) -> Vec<SensorSample> {
    let omega = 2.0 * PI * freq_hz;
    clock
        .timestamps()
        .map(|t| {
            let phase = omega * (t - clock.start_sec);
            let angle = amplitude_deg * phase.sin();
            let rate = amplitude_deg * omega * phase.cos();
            let sample = SensorSample::new(t);
            match axis {
                SwingAxis::X => sample.with_angle(angle, 0.0, 0.0).with_gyro(rate, 0.0, 0.0),
                SwingAxis::Y => sample.with_angle(0.0, angle, 0.0).with_gyro(0.0, rate, 0.0),
            }
        })
        .collect()
}

/// Sensor at rest, optionally tilted by a fixed angle.
pub fn stationary(clock: SampleClock, tilt_deg: (f64, f64)) -> Vec<SensorSample> {
    clock
        .timestamps()
        .map(|t| SensorSample::new(t).with_angle(tilt_deg.0, tilt_deg.1, 0.0))
        .collect()
}

/// Constant linear acceleration on top of 1 g, in g.
pub fn constant_accel(clock: SampleClock, ax_g: f64, ay_g: f64) -> Vec<SensorSample> {
    clock
        .timestamps()
        .map(|t| SensorSample::new(t).with_accel(ax_g, ay_g, 1.0))
        .collect()
}

/// Accelerometer view of a platform translating `amplitude * sin(2π f t)`
/// millimetres along one axis: `-amplitude·ω²·sin(ωt)` converted to g,
/// with gravity on z.
pub fn sine_accel(
    clock: SampleClock,
    axis: SwingAxis,
    amplitude_mm: f64,
    freq_hz: f64,
) -> Vec<SensorSample> {
    let omega = 2.0 * PI * freq_hz;
    clock
        .timestamps()
        .map(|t| {
            let phase = omega * (t - clock.start_sec);
            let accel_g = -amplitude_mm * omega * omega * phase.sin() / GRAVITY_MM_S2;
            let sample = SensorSample::new(t);
            match axis {
                SwingAxis::X => sample.with_accel(accel_g, 0.0, 1.0),
                SwingAxis::Y => sample.with_accel(0.0, accel_g, 1.0),
            }
        })
        .collect()
}
