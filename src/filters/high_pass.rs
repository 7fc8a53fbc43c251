use super::FilterResponse;

/// One-pole IIR high-pass: `y = alpha * (y_prev + x - x_prev)`
///
/// With a cutoff response, `alpha = RC / (RC + dt)`. The first sample only
/// latches `x_prev` and outputs zero.
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    response: FilterResponse,
    prev_input: f64,
    prev_output: f64,
    initialized: bool,
}

impl HighPassFilter {
    pub fn new(response: FilterResponse) -> Self {
        Self {
            response,
            prev_input: 0.0,
            prev_output: 0.0,
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
                rc / (rc + dt)
            }
            FilterResponse::FixedAlpha { alpha } => alpha,
        }
    }

    pub fn apply(&mut self, input: f64, dt: f64) -> f64 {
        if !self.initialized {
            self.prev_input = input;
            self.prev_output = 0.0;
            self.initialized = true;
            return 0.0;
        }

        let alpha = self.alpha(dt);
        let output = alpha * (self.prev_output + input - self.prev_input);
        self.prev_input = input;
        self.prev_output = output;
        output
    }

    pub fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
        self.initialized = false;
    }
}
