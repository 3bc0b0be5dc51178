//! Poll scheduling (linear backoff)
//!
//! Pure functions of the attempt index. The lifecycle controller asks these
//! how long to wait and when to give up; nothing here sleeps.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempt ceiling shared by every polling backend unless configured otherwise
pub const DEFAULT_CEILING: u32 = 20;

/// Delay before the poll that follows `attempt_index`
///
/// Linear: `attempt_index * base_unit`, so the first retry waits zero.
pub fn next_delay(attempt_index: u32, base_unit: Duration) -> Duration {
    base_unit.saturating_mul(attempt_index)
}

/// Whether polling must stop at `attempt_index`
pub fn should_abort(attempt_index: u32, ceiling: u32) -> bool {
    attempt_index == ceiling
}

/// Total time slept before a backend that never settles is declared timed out
///
/// `base_unit * ceiling * (ceiling - 1) / 2`
pub fn worst_case_wait(base_unit: Duration, ceiling: u32) -> Duration {
    (0..ceiling)
        .map(|attempt| next_delay(attempt, base_unit))
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Polling parameters for one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Backoff unit multiplied by the attempt index
    pub base_unit: Duration,

    /// Number of status checks before giving up
    pub ceiling: u32,

    /// Optional wall-clock bound on the whole polling phase
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    pub fn new(base_unit: Duration, ceiling: u32) -> Self {
        Self {
            base_unit,
            ceiling,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn next_delay(&self, attempt_index: u32) -> Duration {
        next_delay(attempt_index, self.base_unit)
    }

    pub fn should_abort(&self, attempt_index: u32) -> bool {
        should_abort(attempt_index, self.ceiling)
    }

    pub fn worst_case_wait(&self) -> Duration {
        worst_case_wait(self.base_unit, self.ceiling)
    }

    /// Whether sleeping `delay` after `elapsed` would overrun the deadline
    pub fn overruns_deadline(&self, elapsed: Duration, delay: Duration) -> bool {
        self.deadline
            .is_some_and(|deadline| elapsed.saturating_add(delay) > deadline)
    }

    /// Worst-case wait, capped by the deadline when one is set
    pub fn max_wait(&self) -> Duration {
        match self.deadline {
            Some(deadline) => self.worst_case_wait().min(deadline),
            None => self.worst_case_wait(),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), DEFAULT_CEILING)
    }
}
