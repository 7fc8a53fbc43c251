//! Session validity tracking. Issues are advisory: they flip the session
//! to invalid and set a message, but never stop the measurement.

use crate::types::ProcessedSample;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidityIssue {
    DataGap { gap_sec: f64 },
    OutOfOrder { previous: f64, timestamp: f64 },
    Malformed { timestamp: f64 },
    Artifact { radius_mm: f64 },
}

impl ValidityIssue {
    /// Higher wins when several issues compete for the message slot.
    fn priority(&self) -> u8 {
        match self {
            ValidityIssue::DataGap { .. } => 1,
            ValidityIssue::OutOfOrder { .. } | ValidityIssue::Malformed { .. } => 2,
            ValidityIssue::Artifact { .. } => 3,
        }
    }
}

impl fmt::Display for ValidityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityIssue::DataGap { gap_sec } => {
                write!(f, "data gap: {:.0} ms", gap_sec * 1000.0)
            }
            ValidityIssue::OutOfOrder {
                previous,
                timestamp,
            } => write!(
                f,
                "out-of-order sample: t={:.3} after t={:.3}",
                timestamp, previous
            ),
            ValidityIssue::Malformed { timestamp } => {
                write!(f, "malformed sample at t={:.3}", timestamp)
            }
            ValidityIssue::Artifact { radius_mm } => {
                write!(f, "artifact detected: {:.1} mm", radius_mm)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidityTracker {
    max_gap_sec: f64,
    artifact_threshold_mm: f64,
    last_timestamp: Option<f64>,
    is_valid: bool,
    message: Option<(u8, String)>,
    issue_count: usize,
}

impl ValidityTracker {
    pub fn new(max_gap_sec: f64, artifact_threshold_mm: f64) -> Self {
        Self {
            max_gap_sec,
            artifact_threshold_mm,
            last_timestamp: None,
            is_valid: true,
            message: None,
            issue_count: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(_, m)| m.as_str())
    }

    pub fn issue_count(&self) -> usize {
        self.issue_count
    }

    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.is_valid = true;
        self.message = None;
        self.issue_count = 0;
    }

    pub fn flag(&mut self, issue: ValidityIssue) {
        self.is_valid = false;
        self.issue_count += 1;
        let priority = issue.priority();
        let replace = match &self.message {
            Some((current, _)) => priority > *current,
            None => true,
        };
        if replace {
            self.message = Some((priority, issue.to_string()));
        }
    }

    /// Ordering and gap check for an incoming timestamp. An `Err` means the
    /// sample must be skipped; it has already been flagged.
    pub fn check_timestamp(&mut self, timestamp: f64) -> Result<(), ValidityIssue> {
        if let Some(previous) = self.last_timestamp {
            if timestamp <= previous {
                let issue = ValidityIssue::OutOfOrder {
                    previous,
                    timestamp,
                };
                log::warn!("[VALIDITY] {}", issue);
                self.flag(issue);
                return Err(issue);
            }

            let gap = timestamp - previous;
            if gap > self.max_gap_sec {
                let issue = ValidityIssue::DataGap { gap_sec: gap };
                log::warn!("[VALIDITY] {} at t={:.3}", issue, timestamp);
                self.flag(issue);
            }
        }
        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    /// Positional artifact check on a measured sample.
    pub fn check_sample(&mut self, sample: &ProcessedSample) {
        let radius = sample.raw_position().norm();
        if sample.has_artifact || radius > self.artifact_threshold_mm {
            let issue = ValidityIssue::Artifact { radius_mm: radius };
            log::warn!("[VALIDITY] {} at t={:.3}", issue, sample.t);
            self.flag(issue);
        }
    }
}
