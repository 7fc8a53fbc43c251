//! One-pole IIR filters operating on a (value, dt) stream.

pub mod high_pass;
pub mod low_pass;

pub use high_pass::HighPassFilter;
pub use low_pass::LowPassFilter;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How a filter derives its smoothing coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterResponse {
    /// Coefficient recomputed from the cutoff and `dt` on every call.
    Cutoff { hz: f64 },
    /// Coefficient used as-is regardless of `dt`.
    FixedAlpha { alpha: f64 },
}

impl FilterResponse {
    /// RC time constant for a cutoff frequency: 1 / (2π·fc)
    pub fn time_constant(hz: f64) -> f64 {
        1.0 / (2.0 * PI * hz)
    }

    pub fn validate(&self) -> Result<(), String> {
        match *self {
            FilterResponse::Cutoff { hz } => {
                if hz.is_finite() && hz > 0.0 {
                    Ok(())
                } else {
                    Err(format!("cutoff must be a positive frequency, got {}", hz))
                }
            }
            FilterResponse::FixedAlpha { alpha } => {
                if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
                    Ok(())
                } else {
                    Err(format!("alpha must be in (0, 1], got {}", alpha))
                }
            }
        }
    }
}
