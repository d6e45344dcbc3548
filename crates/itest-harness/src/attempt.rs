//! Per-test attempt state machine.
//!
//! ```text
//! Pending -> Attempting(0) -> Success
//!                          -> Retrying(1) -> Attempting(1) -> ...
//!                          -> ExhaustedFailure   (last speed mismatched)
//! ```

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    /// Every repo snapshot matched.
    Matched,
    /// At least one repo snapshot differed.
    Mismatched,
    /// The stored snapshot was rewritten (record and update modes).
    SnapshotWritten,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptState {
    Pending,
    Attempting { index: usize, speed: f64 },
    Retrying { next: usize },
    Success { index: usize, speed: f64 },
    ExhaustedFailure { attempts: usize },
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Success { .. } | AttemptState::ExhaustedFailure { .. }
        )
    }
}

/// Walks a speed ladder, moving to the next slower speed only after a
/// mismatch.
#[derive(Debug, Clone)]
pub struct RetryController {
    speeds: Vec<f64>,
    state: AttemptState,
}

impl RetryController {
    pub fn new(speeds: Vec<f64>) -> Self {
        Self {
            speeds,
            state: AttemptState::Pending,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> usize {
        match self.state {
            AttemptState::Pending => 0,
            AttemptState::Attempting { index, .. } | AttemptState::Success { index, .. } => {
                index + 1
            }
            AttemptState::Retrying { next } => next,
            AttemptState::ExhaustedFailure { attempts } => attempts,
        }
    }

    /// Start the next attempt, returning its index and speed.
    ///
    /// `None` once the controller is terminal. An empty ladder goes straight
    /// to [`AttemptState::ExhaustedFailure`], so after `begin` returns `None`
    /// the state is always terminal.
    pub fn begin(&mut self) -> Option<(usize, f64)> {
        let index = match self.state {
            AttemptState::Pending => 0,
            AttemptState::Retrying { next } => next,
            _ => return None,
        };
        let Some(&speed) = self.speeds.get(index) else {
            self.state = AttemptState::ExhaustedFailure { attempts: index };
            return None;
        };
        self.state = AttemptState::Attempting { index, speed };
        Some((index, speed))
    }

    /// Whether the attempt in progress uses the last speed.
    pub fn is_last_attempt(&self) -> bool {
        match self.state {
            AttemptState::Attempting { index, .. } => index + 1 >= self.speeds.len(),
            _ => false,
        }
    }

    /// Record how the current attempt ended and move to the next state.
    pub fn finish(&mut self, result: AttemptResult) -> AttemptState {
        let AttemptState::Attempting { index, speed } = self.state else {
            return self.state;
        };

        self.state = match result {
            AttemptResult::Matched | AttemptResult::SnapshotWritten => {
                AttemptState::Success { index, speed }
            }
            AttemptResult::Mismatched if index + 1 < self.speeds.len() => {
                AttemptState::Retrying { next: index + 1 }
            }
            AttemptResult::Mismatched => AttemptState::ExhaustedFailure {
                attempts: index + 1,
            },
        };
        tracing::trace!(state = ?self.state, "attempt finished");
        self.state
    }
}
