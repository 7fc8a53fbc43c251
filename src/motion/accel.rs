use super::{ModelStep, MotionModel};
use crate::config::MeasurementConfig;
use crate::filters::{HighPassFilter, LowPassFilter};
use crate::sensors::SensorSample;
use crate::types::{AccelMm, Axis2, PositionMm, VelocityMm, GRAVITY_MM_S2};

/// Double integration of bias-free acceleration with gravity extraction,
/// drift high-pass, velocity damping and zero-velocity updates.
pub struct AccelIntegrator {
    gravity_lpf: [LowPassFilter; 2],
    drift_hpf: [HighPassFilter; 2],
    damping_per_sec: f64,
    zupt_threshold: f64,
    zupt_velocity: f64,
    zupt_samples: usize,
    still_count: usize,
    velocity: VelocityMm,
    position: PositionMm,
}

impl AccelIntegrator {
    pub fn new(config: &MeasurementConfig) -> Self {
        let lpf = LowPassFilter::new(config.gravity_low_pass);
        let hpf = HighPassFilter::new(config.accel_high_pass);
        Self {
            gravity_lpf: [lpf.clone(), lpf],
            drift_hpf: [hpf.clone(), hpf],
            damping_per_sec: config.velocity_damping_per_sec,
            zupt_threshold: config.zupt_threshold_mm_s2,
            zupt_velocity: config.zupt_velocity_mm_s,
            zupt_samples: config.zupt_sample_count,
            still_count: 0,
            velocity: VelocityMm::zeros(),
            position: PositionMm::zeros(),
        }
    }

    /// Consecutive samples below the ZUPT threshold so far.
    pub fn still_count(&self) -> usize {
        self.still_count
    }

    fn filter_axis(&mut self, axis: usize, value: f64, dt: f64) -> f64 {
        let gravity = self.gravity_lpf[axis].apply(value, dt);
        self.drift_hpf[axis].apply(value - gravity, dt)
    }

    /// Zero velocity once the sensor has been still long enough.
    ///
    /// A sample counts as still only when both the filtered acceleration and
    /// the integrated velocity are small. The turning points of a slow swing
    /// have low velocity but peak acceleration, and its midpoints the
    /// reverse, so neither alone trips the counter.
    fn apply_zupt(&mut self, accel: AccelMm) {
        if accel.norm() < self.zupt_threshold && self.velocity.norm() < self.zupt_velocity {
            self.still_count += 1;
        } else {
            self.still_count = 0;
        }

        if self.still_count >= self.zupt_samples {
            self.velocity = VelocityMm::zeros();
        }
    }
}

impl MotionModel for AccelIntegrator {
    fn name(&self) -> &'static str {
        "acceleration"
    }

    fn reference(&self, sample: &SensorSample) -> Axis2 {
        Axis2::new(sample.accel_g.x, sample.accel_g.y)
    }

    fn step(&mut self, centered: Axis2, dt: f64) -> ModelStep {
        let input = centered * GRAVITY_MM_S2;
        let accel = AccelMm::new(
            self.filter_axis(0, input.x, dt),
            self.filter_axis(1, input.y, dt),
        );

        self.velocity += accel * dt;
        self.velocity *= (1.0 - self.damping_per_sec * dt).max(0.0);
        self.apply_zupt(accel);
        self.position += self.velocity * dt;

        ModelStep {
            accel,
            velocity: self.velocity,
            position: self.position,
        }
    }

    fn reset(&mut self) {
        for f in self.gravity_lpf.iter_mut() {
            f.reset();
        }
        for f in self.drift_hpf.iter_mut() {
            f.reset();
        }
        self.still_count = 0;
        self.velocity = VelocityMm::zeros();
        self.position = PositionMm::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterResponse;

    fn config() -> MeasurementConfig {
        MeasurementConfig::default()
    }

    #[test]
    fn test_zero_input_stays_at_origin() {
        let mut model = AccelIntegrator::new(&config());
        for _ in 0..100 {
            let step = model.step(Axis2::zeros(), 0.02);
            assert_eq!(step.position, PositionMm::zeros());
            assert_eq!(step.velocity, VelocityMm::zeros());
        }
    }

    #[test]
    fn test_zupt_zeroes_velocity_after_still_run() {
        let config = MeasurementConfig {
            zupt_sample_count: 5,
            ..config()
        };
        let mut model = AccelIntegrator::new(&config);
        model.step(Axis2::zeros(), 0.02);

        // A short push builds up velocity
        let mut moving = VelocityMm::zeros();
        for _ in 0..5 {
            moving = model.step(Axis2::new(0.05, 0.0), 0.02).velocity;
        }
        assert!(moving.norm() > 0.0);

        // Back to the bias level: the high-pass decays toward zero and the
        // still counter eventually trips
        let mut zeroed = false;
        for _ in 0..200 {
            let step = model.step(Axis2::zeros(), 0.02);
            if model.still_count() >= 5 {
                assert_eq!(step.velocity, VelocityMm::zeros());
                zeroed = true;
                break;
            }
        }
        assert!(zeroed);
    }

    #[test]
    fn test_slow_swing_survives_zupt() {
        // 5 mm at 0.5 Hz: peak acceleration ~49 mm/s², peak speed ~16 mm/s
        let mut model = AccelIntegrator::new(&config());
        let omega = std::f64::consts::PI;
        let mut xs = Vec::new();
        for i in 0..500 {
            let t = i as f64 * 0.02;
            let a_g = -5.0 * omega * omega * (omega * t).sin() / GRAVITY_MM_S2;
            xs.push(model.step(Axis2::new(a_g, 0.0), 0.02).position.x);
        }

        let settled = &xs[250..];
        let max = settled.iter().cloned().fold(f64::MIN, f64::max);
        let min = settled.iter().cloned().fold(f64::MAX, f64::min);
        // True peak-to-peak is 10 mm; the drift high-pass shaves some off
        assert!(max - min > 6.0, "peak-to-peak {:.2} mm", max - min);
        assert!(max - min < 14.0, "peak-to-peak {:.2} mm", max - min);
    }

    #[test]
    fn test_damping_decays_velocity() {
        let config = MeasurementConfig {
            zupt_threshold_mm_s2: 0.0,
            velocity_damping_per_sec: 2.0,
            accel_high_pass: FilterResponse::FixedAlpha { alpha: 1.0 },
            gravity_low_pass: FilterResponse::FixedAlpha { alpha: 1e-9 },
            ..config()
        };
        let mut model = AccelIntegrator::new(&config);
        model.step(Axis2::zeros(), 0.02);
        let v1 = model.step(Axis2::new(0.1, 0.0), 0.02).velocity.x;
        let v2 = model.step(Axis2::new(0.1, 0.0), 0.02).velocity.x;
        assert!(v1 > 0.0);
        // Constant input with alpha=1 HPF: a keeps its first value, v grows
        // but less than linearly because of damping
        assert!(v2 > v1);
        assert!(v2 < 2.0 * v1);
    }

    #[test]
    fn test_reset() {
        let mut model = AccelIntegrator::new(&config());
        model.step(Axis2::zeros(), 0.02);
        let before = model.step(Axis2::new(0.2, -0.1), 0.02);
        model.reset();
        model.step(Axis2::zeros(), 0.02);
        let after = model.step(Axis2::new(0.2, -0.1), 0.02);
        assert_eq!(before, after);
        assert_eq!(model.name(), "acceleration");
    }
}
