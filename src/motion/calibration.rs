use crate::config::CalibrationWindow;
use crate::types::Axis2;

/// Per-axis bias/baseline estimation over the calibration window.
///
/// Averages whatever channel pair the active motion model consumes
/// (acceleration in g, angle in degrees, or angular rate in deg/s).
#[derive(Debug, Clone)]
pub struct BiasEstimator {
    window: CalibrationWindow,
    sum: Axis2,
    count: usize,
    bias: Option<Axis2>,
}

impl BiasEstimator {
    pub fn new(window: CalibrationWindow) -> Self {
        Self {
            window,
            sum: Axis2::zeros(),
            count: 0,
            bias: None,
        }
    }

    pub fn window(&self) -> CalibrationWindow {
        self.window
    }

    pub fn is_complete(&self) -> bool {
        self.bias.is_some()
    }

    pub fn bias(&self) -> Option<Axis2> {
        self.bias
    }

    /// Samples folded into the estimate so far.
    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Accumulate one reference reading. `elapsed` is seconds since the
    /// first sample of the session. Returns the bias on the sample that
    /// completes the window.
    pub fn observe(&mut self, reference: Axis2, elapsed: f64) -> Option<Axis2> {
        if self.bias.is_some() {
            return None;
        }

        self.sum += reference;
        self.count += 1;

        let done = match self.window {
            CalibrationWindow::Disabled => true,
            CalibrationWindow::Duration { seconds } => elapsed >= seconds,
            CalibrationWindow::Samples { count } => self.count >= count,
        };

        if done {
            let bias = self.sum / self.count as f64;
            self.bias = Some(bias);
            Some(bias)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.sum = Axis2::zeros();
        self.count = 0;
        self.bias = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disabled_uses_first_sample() {
        let mut est = BiasEstimator::new(CalibrationWindow::Disabled);
        let bias = est.observe(Axis2::new(1.5, -0.5), 0.0);
        assert_eq!(bias, Some(Axis2::new(1.5, -0.5)));
        assert!(est.is_complete());
        assert_eq!(est.observe(Axis2::new(9.0, 9.0), 0.02), None);
        assert_eq!(est.bias(), Some(Axis2::new(1.5, -0.5)));
    }

    #[test]
    fn test_sample_count_window() {
        let mut est = BiasEstimator::new(CalibrationWindow::Samples { count: 4 });
        for (i, v) in [1.0, 2.0, 3.0].iter().enumerate() {
            assert_eq!(est.observe(Axis2::new(*v, -*v), i as f64 * 0.02), None);
        }
        let bias = est.observe(Axis2::new(4.0, -4.0), 0.06).unwrap();
        assert_relative_eq!(bias.x, 2.5);
        assert_relative_eq!(bias.y, -2.5);
        assert_eq!(est.sample_count(), 4);
    }

    #[test]
    fn test_duration_window_includes_completing_sample() {
        let mut est = BiasEstimator::new(CalibrationWindow::Duration { seconds: 0.1 });
        let mut finished_at = None;
        for i in 0..10 {
            let t = i as f64 * 0.02;
            if est.observe(Axis2::new(2.0, 0.0), t).is_some() {
                finished_at = Some(i);
                break;
            }
        }
        // 0.00, 0.02, 0.04, 0.06, 0.08, 0.10 -> completes on the 6th sample
        assert_eq!(finished_at, Some(5));
        assert_eq!(est.sample_count(), 6);
    }

    #[test]
    fn test_reset() {
        let mut est = BiasEstimator::new(CalibrationWindow::Samples { count: 1 });
        est.observe(Axis2::new(1.0, 1.0), 0.0);
        est.reset();
        assert!(!est.is_complete());
        assert_eq!(est.sample_count(), 0);
    }
}
