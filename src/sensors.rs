use serde::{Deserialize, Serialize};

/// Three-axis reading (x, y, z)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One inertial reading as delivered by the transport layer, already
/// converted to g / deg/s / deg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Seconds, monotonic within a session
    pub timestamp: f64,
    #[serde(default)]
    pub accel_g: Axes3,
    #[serde(default)]
    pub gyro_dps: Axes3,
    #[serde(default)]
    pub angle_deg: Axes3,
}

impl SensorSample {
    /// Sample at rest: 1 g on Z, no rotation, level.
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            accel_g: Axes3::new(0.0, 0.0, 1.0),
            gyro_dps: Axes3::default(),
            angle_deg: Axes3::default(),
        }
    }

    pub fn with_accel(mut self, x: f64, y: f64, z: f64) -> Self {
        self.accel_g = Axes3::new(x, y, z);
        self
    }

    pub fn with_gyro(mut self, x: f64, y: f64, z: f64) -> Self {
        self.gyro_dps = Axes3::new(x, y, z);
        self
    }

    pub fn with_angle(mut self, x: f64, y: f64, z: f64) -> Self {
        self.angle_deg = Axes3::new(x, y, z);
        self
    }

    /// Malformed samples (NaN/inf anywhere) must not reach the integrators.
    pub fn is_well_formed(&self) -> bool {
        self.timestamp.is_finite()
            && self.accel_g.is_finite()
            && self.gyro_dps.is_finite()
            && self.angle_deg.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_magnitude() {
        assert_eq!(Axes3::new(3.0, 4.0, 0.0).magnitude(), 5.0);
    }

    #[test]
    fn test_builder() {
        let sample = SensorSample::new(1.5)
            .with_accel(0.1, 0.0, 0.99)
            .with_gyro(2.0, -1.0, 0.0)
            .with_angle(4.0, 0.5, 90.0);
        assert_eq!(sample.timestamp, 1.5);
        assert_eq!(sample.accel_g.x, 0.1);
        assert_eq!(sample.gyro_dps.y, -1.0);
        assert_eq!(sample.angle_deg.z, 90.0);
        assert!(sample.is_well_formed());
    }

    #[test]
    fn test_malformed_sample() {
        let sample = SensorSample::new(0.0).with_angle(f64::NAN, 0.0, 0.0);
        assert!(!sample.is_well_formed());
    }

    #[test]
    fn test_deserialize_missing_channels() {
        let sample: SensorSample =
            serde_json::from_str(r#"{"timestamp": 0.5, "angle_deg": {"x": 1.0, "y": 2.0, "z": 0.0}}"#)
                .unwrap();
        assert_eq!(sample.accel_g, Axes3::default());
        assert_eq!(sample.angle_deg.y, 2.0);
    }
}
