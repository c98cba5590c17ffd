//! Error supervisor.
//!
//! Runs once per cycle, **after** both slots have been serviced, and
//! decides whether the loop carries on, pauses, or asks for a restart.
//!
//! ## Accounting
//!
//! 1. A clean cycle (zero failures) resets the error count and the next
//!    cycle starts immediately.
//! 2. A cycle with failures adds its tally (1 or 2, or 3 with an
//!    unexpected error) to the error count.
//! 3. If the count has reached [`ESCALATION_THRESHOLD`] the count is reset
//!    and the restart action is invoked.
//! 4. Otherwise a warning is emitted and the loop pauses for [`BACKOFF`].
//!
//! The count is a sum of failures, not of failed cycles: two cycles in
//! which both sensors fail are enough to escalate, while single-sensor
//! failures take three cycles.

use std::time::Duration;

use log::{error, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, RestartPort};
use crate::error::Error;
use crate::sensors::SlotId;

/// Error count at which a restart is requested.
pub const ESCALATION_THRESHOLD: u32 = 3;

/// Pause after a failed cycle that did not escalate.
pub const BACKOFF: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// Failure tally for one cycle.  Created fresh each cycle, consumed by
/// [`ErrorSupervisor::evaluate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    slot_failed: [bool; 2],
    unexpected: bool,
}

impl CycleOutcome {
    /// Record a failure on `slot`.  A slot fails at most once per cycle.
    pub fn record_failure(&mut self, slot: SlotId) {
        self.slot_failed[slot.index()] = true;
    }

    /// Record a failure caught by the outer loop handler.
    pub fn record_unexpected(&mut self) {
        self.unexpected = true;
    }

    pub fn slot_failed(&self, slot: SlotId) -> bool {
        self.slot_failed[slot.index()]
    }

    pub fn failures(&self) -> u32 {
        self.slot_failed.iter().filter(|f| **f).count() as u32 + u32::from(self.unexpected)
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// What the loop should do after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No failures; start the next cycle now.
    Proceed,
    /// Failures below threshold; warn and pause.
    Backoff { error_count: u32 },
    /// Threshold reached; counter already reset, restart requested.
    Escalate { error_count: u32 },
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct ErrorSupervisor {
    threshold: u32,
    error_count: u32,
    restarts_requested: u32,
}

impl Default for ErrorSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSupervisor {
    pub fn new() -> Self {
        Self::with_threshold(ESCALATION_THRESHOLD)
    }

    /// Supervisor with a non-default threshold (clamped to at least 1).
    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            error_count: 0,
            restarts_requested: 0,
        }
    }

    /// Pure accounting step; no side effects beyond the counter.
    pub fn evaluate(&mut self, outcome: CycleOutcome) -> Verdict {
        if outcome.is_clean() {
            self.error_count = 0;
            return Verdict::Proceed;
        }

        self.error_count = self.error_count.saturating_add(outcome.failures());
        if self.error_count >= self.threshold {
            let error_count = self.error_count;
            self.error_count = 0;
            self.restarts_requested += 1;
            Verdict::Escalate { error_count }
        } else {
            Verdict::Backoff {
                error_count: self.error_count,
            }
        }
    }

    /// Evaluate `outcome` and carry out the verdict: pause on backoff,
    /// invoke `restart` on escalation.
    ///
    /// A failing restart action is returned as an error for the outer loop
    /// handler; the counter has already been reset by then.
    pub fn supervise(
        &mut self,
        outcome: CycleOutcome,
        restart: &mut impl RestartPort,
        clock: &mut impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<Verdict, Error> {
        let verdict = self.evaluate(outcome);
        match verdict {
            Verdict::Proceed => {}
            Verdict::Backoff { error_count } => {
                sink.emit(&AppEvent::CycleFailed {
                    failures: outcome.failures(),
                    error_count,
                });
                clock.sleep(BACKOFF);
            }
            Verdict::Escalate { error_count } => {
                sink.emit(&AppEvent::RestartRequested { error_count });
                restart.request_restart().map_err(|e| {
                    error!("restart action failed: {}", e);
                    Error::from(e)
                })?;
                warn!("restart requested; continuing until the process manager acts");
            }
        }
        Ok(verdict)
    }

    /// Current running error count (always below the threshold at rest).
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Total escalations since startup.
    pub fn restarts_requested(&self) -> u32 {
        self.restarts_requested
    }
}
