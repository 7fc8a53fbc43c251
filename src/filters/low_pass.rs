use super::FilterResponse;

/// One-pole IIR low-pass: `y += alpha * (x - y)`
///
/// With a cutoff response, `alpha = dt / (dt + RC)` where `RC = 1/(2π·fc)`.
/// The first sample initializes the output to the input, so there is no
/// warm-up transient.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    response: FilterResponse,
    output: f64,
    initialized: bool,
}

impl LowPassFilter {
    pub fn new(response: FilterResponse) -> Self {
        Self {
            response,
            output: 0.0,
            initialized: false,
        }
    }

    pub fn with_cutoff(hz: f64) -> Self {
        Self::new(FilterResponse::Cutoff { hz })
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self::new(FilterResponse::FixedAlpha { alpha })
    }

    fn alpha(&self, dt: f64) -> f64 {
        match self.response {
            FilterResponse::Cutoff { hz } => {
                let rc = FilterResponse::time_constant(hz);
                dt / (dt + rc)
            }
            FilterResponse::FixedAlpha { alpha } => alpha,
        }
    }

    /// Feed one value; `dt` is seconds since the previous call on this instance.
    pub fn apply(&mut self, input: f64, dt: f64) -> f64 {
        if !self.initialized {
            self.output = input;
            self.initialized = true;
            return self.output;
        }

        let alpha = self.alpha(dt);
        self.output += alpha * (input - self.output);
        self.output
    }

    /// Last output, if any sample has been seen.
    pub fn value(&self) -> Option<f64> {
        self.initialized.then_some(self.output)
    }

    pub fn reset(&mut self) {
        self.output = 0.0;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_sample_passes_through() {
        let mut lpf = LowPassFilter::with_cutoff(0.1);
        assert_eq!(lpf.value(), None);
        assert_eq!(lpf.apply(3.5, 0.02), 3.5);
        assert_eq!(lpf.value(), Some(3.5));
    }

    #[test]
    fn test_converges_to_constant() {
        let mut lpf = LowPassFilter::with_cutoff(1.0);
        lpf.apply(0.0, 0.02);
        let mut out = 0.0;
        for _ in 0..2000 {
            out = lpf.apply(7.0, 0.02);
        }
        assert_relative_eq!(out, 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cutoff_alpha() {
        // fc = 1 Hz, dt = 0.02: alpha = 0.02 / (0.02 + 0.159155) ≈ 0.11164
        let mut lpf = LowPassFilter::with_cutoff(1.0);
        lpf.apply(0.0, 0.02);
        let out = lpf.apply(1.0, 0.02);
        let rc = 1.0 / (2.0 * std::f64::consts::PI);
        assert_relative_eq!(out, 0.02 / (0.02 + rc), epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_alpha_ignores_dt() {
        let mut a = LowPassFilter::with_alpha(0.25);
        let mut b = LowPassFilter::with_alpha(0.25);
        a.apply(0.0, 0.02);
        b.apply(0.0, 0.5);
        assert_eq!(a.apply(4.0, 0.02), 1.0);
        assert_eq!(b.apply(4.0, 0.5), 1.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut used = LowPassFilter::with_cutoff(0.5);
        for i in 0..50 {
            used.apply(i as f64, 0.02);
        }
        used.reset();
        assert_eq!(used.value(), None);

        let mut fresh = LowPassFilter::with_cutoff(0.5);
        assert_eq!(used.apply(2.0, 0.02), fresh.apply(2.0, 0.02));
        assert_eq!(used.apply(5.0, 0.02), fresh.apply(5.0, 0.02));
    }
}
