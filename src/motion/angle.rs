use super::{ModelStep, MotionModel, PositionDerivative};
use crate::config::MeasurementConfig;
use crate::filters::HighPassFilter;
use crate::sensors::SensorSample;
use crate::types::{Axis2, PositionMm};

/// Position straight from the fused tilt angle: baseline removed,
/// high-passed for drift, scaled deg -> mm per axis. Bounded by
/// construction, unlike double-integrated acceleration.
pub struct AngleTracker {
    hpf: [HighPassFilter; 2],
    scale: Axis2,
    derivative: PositionDerivative,
}

impl AngleTracker {
    pub fn new(config: &MeasurementConfig) -> Self {
        let hpf = HighPassFilter::new(config.angle_high_pass);
        Self {
            hpf: [hpf.clone(), hpf],
            scale: Axis2::new(config.angle_to_mm_scale_x, config.angle_to_mm_scale_y),
            derivative: PositionDerivative::default(),
        }
    }
}

impl MotionModel for AngleTracker {
    fn name(&self) -> &'static str {
        "angle"
    }

    fn reference(&self, sample: &SensorSample) -> Axis2 {
        Axis2::new(sample.angle_deg.x, sample.angle_deg.y)
    }

    fn step(&mut self, centered: Axis2, dt: f64) -> ModelStep {
        let filtered = Axis2::new(
            self.hpf[0].apply(centered.x, dt),
            self.hpf[1].apply(centered.y, dt),
        );
        let position: PositionMm = filtered.component_mul(&self.scale);
        self.derivative.update(position, dt)
    }

    fn reset(&mut self) {
        for f in self.hpf.iter_mut() {
            f.reset();
        }
        self.derivative.reset();
    }
}
