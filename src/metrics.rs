//! Balance metrics over a finished (or in-progress) session.
//!
//! Pure functions over the processed-sample sequence. All positions are
//! the unclamped ones, so a clipped display never hides real sway.
//! Degenerate input returns a sentinel rather than an error:
//!   - stability: 100 for zero or one sample
//!   - frequency: 0 for a non-positive duration or fewer than 3 samples
//!   - coordination: 0 for an axis with fewer than 2 cycles

use crate::config::MetricsParams;
use crate::types::{MeasurementMetrics, ProcessedSample};

const STABILITY_OFFSET: f64 = 4000.0;
const STABILITY_DIVISOR: f64 = 40.0;
const STABILITY_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtremumKind {
    Peak,
    Trough,
}

#[derive(Debug, Clone, Copy)]
struct Extremum {
    index: usize,
    value: f64,
    kind: ExtremumKind,
}

impl Extremum {
    fn exceeds(&self, other: &Extremum) -> bool {
        match self.kind {
            ExtremumKind::Peak => self.value > other.value,
            ExtremumKind::Trough => self.value < other.value,
        }
    }
}

/// Alternating peak/trough sequence with hysteresis.
///
/// Turning points are taken where the sign of the last non-zero slope
/// flips, so plateaus do not split an extremum. A turning point of the same
/// kind as the last accepted one replaces it when more extreme; one of the
/// opposite kind is accepted only when it lies at least `min_samples` away
/// and differs by at least `threshold`.
fn find_extrema(values: &[f64], threshold: f64, min_samples: usize) -> Vec<Extremum> {
    let mut accepted: Vec<Extremum> = Vec::new();
    let mut last_slope = 0.0_f64;

    for i in 1..values.len() {
        let slope = values[i] - values[i - 1];
        if slope == 0.0 {
            continue;
        }

        if last_slope != 0.0 && slope.signum() != last_slope.signum() {
            let kind = if last_slope > 0.0 {
                ExtremumKind::Peak
            } else {
                ExtremumKind::Trough
            };
            let candidate = Extremum {
                index: i - 1,
                value: values[i - 1],
                kind,
            };

            match accepted.last_mut() {
                None => accepted.push(candidate),
                Some(last) if last.kind == kind => {
                    if candidate.exceeds(last) {
                        *last = candidate;
                    }
                }
                Some(last) => {
                    let far_enough = candidate.index - last.index >= min_samples;
                    let big_enough = (candidate.value - last.value).abs() >= threshold;
                    if far_enough && big_enough {
                        accepted.push(candidate);
                    }
                }
            }
        }

        last_slope = slope;
    }

    accepted
}

/// Peak-to-trough spans between consecutive accepted extrema. Each entry is
/// one cycle.
pub fn extract_cycle_amplitudes(values: &[f64], threshold: f64, min_samples: usize) -> Vec<f64> {
    find_extrema(values, threshold, min_samples)
        .windows(2)
        .map(|w| (w[1].value - w[0].value).abs())
        .collect()
}

fn axis_values(samples: &[ProcessedSample]) -> (Vec<f64>, Vec<f64>) {
    samples.iter().map(|s| (s.sx_mm_raw, s.sy_mm_raw)).unzip()
}

/// `(4000 - pathLength/n) / 40`, clamped to [0, 100].
pub fn calc_stability(samples: &[ProcessedSample]) -> f64 {
    if samples.len() <= 1 {
        return STABILITY_MAX;
    }

    let path_length: f64 = samples
        .windows(2)
        .map(|w| (w[1].raw_position() - w[0].raw_position()).norm())
        .sum();
    let mean_step = path_length / samples.len() as f64;

    ((STABILITY_OFFSET - mean_step) / STABILITY_DIVISOR).clamp(0.0, STABILITY_MAX)
}

/// Cycles on X plus cycles on Y, per second, times `correction`.
pub fn calc_oscillation_frequency(
    samples: &[ProcessedSample],
    duration_sec: f64,
    amplitude_threshold_mm: f64,
    min_samples: usize,
    correction: f64,
) -> f64 {
    if duration_sec <= 0.0 || samples.len() < 3 {
        return 0.0;
    }

    let (xs, ys) = axis_values(samples);
    let cycles_x = extract_cycle_amplitudes(&xs, amplitude_threshold_mm, min_samples).len();
    let cycles_y = extract_cycle_amplitudes(&ys, amplitude_threshold_mm, min_samples).len();

    (cycles_x + cycles_y) as f64 / duration_sec * correction
}

/// Mean absolute change between consecutive cycle amplitudes.
fn amplitude_irregularity(amplitudes: &[f64]) -> f64 {
    if amplitudes.len() < 2 {
        return 0.0;
    }
    let total: f64 = amplitudes.windows(2).map(|w| (w[0] - w[1]).abs()).sum();
    total / amplitudes.len() as f64
}

/// Lower is more regular. Zero for perfectly periodic swings.
pub fn calc_coordination_factor(
    samples: &[ProcessedSample],
    amplitude_threshold_mm: f64,
    min_samples: usize,
    scale: f64,
) -> f64 {
    let (xs, ys) = axis_values(samples);
    let x = amplitude_irregularity(&extract_cycle_amplitudes(
        &xs,
        amplitude_threshold_mm,
        min_samples,
    ));
    let y = amplitude_irregularity(&extract_cycle_amplitudes(
        &ys,
        amplitude_threshold_mm,
        min_samples,
    ));
    (x + y) * scale
}

pub fn build_metrics(
    samples: &[ProcessedSample],
    duration_sec: f64,
    params: &MetricsParams,
) -> MeasurementMetrics {
    if samples.is_empty() {
        return MeasurementMetrics::default();
    }

    MeasurementMetrics {
        stability: calc_stability(samples),
        oscillation_frequency: calc_oscillation_frequency(
            samples,
            duration_sec,
            params.amplitude_threshold_freq_mm,
            params.min_cycle_samples,
            params.oscillation_correction,
        ),
        coordination_factor: calc_coordination_factor(
            samples,
            params.amplitude_threshold_coord_mm,
            params.min_cycle_samples,
            params.coordination_scale,
        ),
    }
}
