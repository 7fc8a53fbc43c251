//! Two-axis vector aliases for the platform plane.
//!
//! X and Y are processed independently everywhere, but carrying them as a
//! pair keeps the per-axis filter chains and integrators in lockstep.

use nalgebra::Vector2;

/// (x, y) pair in the platform plane
pub type Axis2 = Vector2<f64>;

/// Position in millimetres
pub type PositionMm = Axis2;
/// Velocity in mm/s
pub type VelocityMm = Axis2;
/// Acceleration in mm/s²
pub type AccelMm = Axis2;

/// Standard gravity in m/s²
pub const GRAVITY_MS2: f64 = 9.80665;
/// Standard gravity in mm/s²
pub const GRAVITY_MM_S2: f64 = GRAVITY_MS2 * 1000.0;

/// Scale `v` back onto the circle of radius `limit` if it lies outside.
pub fn clamp_radius(v: Axis2, limit: f64) -> Axis2 {
    let radius = v.norm();
    if radius > limit && radius > 0.0 {
        v * (limit / radius)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp_inside_limit() {
        let v = Axis2::new(3.0, 4.0);
        assert_eq!(clamp_radius(v, 40.0), v);
    }

    #[test]
    fn test_clamp_outside_limit() {
        let clamped = clamp_radius(Axis2::new(30.0, 40.0), 40.0);
        assert_relative_eq!(clamped.norm(), 40.0, epsilon = 1e-12);
        assert_relative_eq!(clamped.x, 24.0, epsilon = 1e-12);
        assert_relative_eq!(clamped.y, 32.0, epsilon = 1e-12);
    }
}
