use crate::config::MeasurementConfig;
use crate::sensors::SensorSample;
use crate::types::Axis2;

const BASE_KEEP: f64 = 0.9;
const BASE_NEW: f64 = 0.1;

/// Starts a measurement when the platform first moves.
///
/// While armed, the trigger learns a resting base angle over the first
/// `autostart_base_samples` samples (exponential average), then fires once
/// when the deviation from that base, converted to millimetres, exceeds
/// `autostart_threshold_mm`. Firing disarms it.
#[derive(Debug, Clone)]
pub struct AutoStartTrigger {
    threshold_mm: f64,
    base_samples: usize,
    scale: Axis2,
    base: Option<Axis2>,
    seen: usize,
    armed: bool,
}

impl AutoStartTrigger {
    pub fn new(config: &MeasurementConfig) -> Self {
        Self {
            threshold_mm: config.autostart_threshold_mm,
            base_samples: config.autostart_base_samples,
            scale: Axis2::new(config.angle_to_mm_scale_x, config.angle_to_mm_scale_y),
            base: None,
            seen: 0,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Arm and relearn the base angle.
    pub fn arm(&mut self) {
        self.reset();
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn reset(&mut self) {
        self.base = None;
        self.seen = 0;
        self.armed = false;
    }

    /// Returns true exactly once, on the sample that trips the threshold.
    pub fn update(&mut self, sample: &SensorSample) -> bool {
        if !self.armed {
            return false;
        }

        let angle = Axis2::new(sample.angle_deg.x, sample.angle_deg.y);
        let base = match self.base {
            Some(base) if self.seen >= self.base_samples => base,
            Some(base) => {
                self.base = Some(base * BASE_KEEP + angle * BASE_NEW);
                self.seen += 1;
                return false;
            }
            None => {
                self.base = Some(angle);
                self.seen += 1;
                return false;
            }
        };

        let deviation_mm = (angle - base).component_mul(&self.scale).norm();
        if deviation_mm > self.threshold_mm {
            log::info!(
                "[AUTOSTART] triggered at t={:.3}: {:.1} mm from base",
                sample.timestamp,
                deviation_mm
            );
            self.armed = false;
            true
        } else {
            false
        }
    }
}
