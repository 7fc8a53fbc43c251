use super::{ModelStep, MotionModel, PositionDerivative};
use crate::config::MeasurementConfig;
use crate::filters::{HighPassFilter, LowPassFilter};
use crate::sensors::SensorSample;
use crate::types::Axis2;

/// Angular rate (bias removed) -> LPF -> integrated angle -> HPF -> mm.
pub struct GyroTracker {
    rate_lpf: [LowPassFilter; 2],
    angle_hpf: [HighPassFilter; 2],
    scale: Axis2,
    angle_deg: Axis2,
    derivative: PositionDerivative,
}

impl GyroTracker {
    pub fn new(config: &MeasurementConfig) -> Self {
        let lpf = LowPassFilter::new(config.gyro_low_pass);
        let hpf = HighPassFilter::new(config.angle_high_pass);
        Self {
            rate_lpf: [lpf.clone(), lpf],
            angle_hpf: [hpf.clone(), hpf],
            scale: Axis2::new(config.angle_to_mm_scale_x, config.angle_to_mm_scale_y),
            angle_deg: Axis2::zeros(),
            derivative: PositionDerivative::default(),
        }
    }

    /// Integrated angle before high-pass, in degrees.
    pub fn integrated_angle(&self) -> Axis2 {
        self.angle_deg
    }
}

impl MotionModel for GyroTracker {
    fn name(&self) -> &'static str {
        "gyro"
    }

    fn reference(&self, sample: &SensorSample) -> Axis2 {
        Axis2::new(sample.gyro_dps.x, sample.gyro_dps.y)
    }

    fn step(&mut self, centered: Axis2, dt: f64) -> ModelStep {
        let rate = Axis2::new(
            self.rate_lpf[0].apply(centered.x, dt),
            self.rate_lpf[1].apply(centered.y, dt),
        );
        self.angle_deg += rate * dt;

        let filtered = Axis2::new(
            self.angle_hpf[0].apply(self.angle_deg.x, dt),
            self.angle_hpf[1].apply(self.angle_deg.y, dt),
        );
        self.derivative
            .update(filtered.component_mul(&self.scale), dt)
    }

    fn reset(&mut self) {
        for f in self.rate_lpf.iter_mut() {
            f.reset();
        }
        for f in self.angle_hpf.iter_mut() {
            f.reset();
        }
        self.angle_deg = Axis2::zeros();
        self.derivative.reset();
    }
}
