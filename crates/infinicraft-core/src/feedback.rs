//! Transient combination feedback.

use crate::element::Element;
use kurbo::Point;
use std::time::{Duration, Instant};

/// Default time a feedback message stays visible.
pub const DEFAULT_FEEDBACK_DURATION: Duration = Duration::from_millis(2000);

/// What the feedback reports.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    /// A new element was produced.
    Success(Element),
    /// The service refused the pair, with its message.
    Failure(String),
}

/// A visible feedback message.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub outcome: FeedbackOutcome,
    /// Workspace-local anchor (the combination target's position).
    pub anchor: Point,
    pub expires_at: Instant,
}

impl Feedback {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FeedbackOutcome::Success(_))
    }
}

/// Single-slot feedback with one expiry timer.
///
/// Showing new feedback replaces the current one and restarts the window.
#[derive(Debug, Clone)]
pub struct FeedbackSlot {
    current: Option<Feedback>,
    duration: Duration,
}

impl Default for FeedbackSlot {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_DURATION)
    }
}

impl FeedbackSlot {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Show feedback, superseding whatever is pending.
    pub fn show(&mut self, outcome: FeedbackOutcome, anchor: Point, now: Instant) {
        if self.current.is_some() {
            log::debug!("Superseding pending feedback");
        }
        self.current = Some(Feedback {
            outcome,
            anchor,
            expires_at: now + self.duration,
        });
    }

    /// Clear the feedback once its window has elapsed.
    /// Returns true if something expired.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(feedback) if now >= feedback.expires_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// The feedback visible at `now`, if any.
    pub fn current(&self, now: Instant) -> Option<&Feedback> {
        self.current.as_ref().filter(|f| now < f.expires_at)
    }

    /// When the pending feedback expires.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|f| f.expires_at)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
