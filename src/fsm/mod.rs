//! Cycle state machine.
//!
//! One cycle walks a fixed ring of phases:
//!
//! ```text
//!  EnableSensor1 ─▶ ReadSensor1 ─▶ SettleOff1 ─▶ EnableSensor2
//!       ▲                                             │
//!       │                                             ▼
//!   Evaluate ◀──────── SettleOff2 ◀──────────── ReadSensor2
//! ```
//!
//! There is no terminal phase.  The engine only tracks *where* the cycle
//! is; the work done in each phase lives in
//! [`AppService`](crate::app::service::AppService).  Failures inside a
//! `Read*` phase never change the path; the ring is always walked in
//! full.

use log::trace;

use crate::sensors::SlotId;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CyclePhase {
    EnableSensor1 = 0,
    ReadSensor1 = 1,
    SettleOff1 = 2,
    EnableSensor2 = 3,
    ReadSensor2 = 4,
    SettleOff2 = 5,
    Evaluate = 6,
}

/// What a phase does, independent of which slot it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    Enable(SlotId),
    Read(SlotId),
    SettleOff(SlotId),
    Evaluate,
}

impl CyclePhase {
    /// Total number of phases.
    pub const COUNT: usize = 7;

    /// Convert an index back to a phase.  Out-of-range values fall back to
    /// `Evaluate` (debug builds assert).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::EnableSensor1,
            1 => Self::ReadSensor1,
            2 => Self::SettleOff1,
            3 => Self::EnableSensor2,
            4 => Self::ReadSensor2,
            5 => Self::SettleOff2,
            6 => Self::Evaluate,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Evaluate
            }
        }
    }

    /// The phase that follows this one.  `Evaluate` wraps to the start.
    pub fn next(self) -> Self {
        Self::from_index((self as usize + 1) % Self::COUNT)
    }

    pub fn action(self) -> PhaseAction {
        match self {
            Self::EnableSensor1 => PhaseAction::Enable(SlotId::One),
            Self::ReadSensor1 => PhaseAction::Read(SlotId::One),
            Self::SettleOff1 => PhaseAction::SettleOff(SlotId::One),
            Self::EnableSensor2 => PhaseAction::Enable(SlotId::Two),
            Self::ReadSensor2 => PhaseAction::Read(SlotId::Two),
            Self::SettleOff2 => PhaseAction::SettleOff(SlotId::Two),
            Self::Evaluate => PhaseAction::Evaluate,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::EnableSensor1 => "EnableSensor1",
            Self::ReadSensor1 => "ReadSensor1",
            Self::SettleOff1 => "SettleOff1",
            Self::EnableSensor2 => "EnableSensor2",
            Self::ReadSensor2 => "ReadSensor2",
            Self::SettleOff2 => "SettleOff2",
            Self::Evaluate => "Evaluate",
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct CycleFsm {
    current: CyclePhase,
    /// Completed cycles (incremented on `Evaluate → EnableSensor1`).
    cycles: u64,
}

impl Default for CycleFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleFsm {
    pub fn new() -> Self {
        Self {
            current: CyclePhase::EnableSensor1,
            cycles: 0,
        }
    }

    pub fn current(&self) -> CyclePhase {
        self.current
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Move to the next phase and return it.
    pub fn advance(&mut self) -> CyclePhase {
        let next = self.current.next();
        trace!("cycle: {} -> {}", self.current.name(), next.name());
        if self.current == CyclePhase::Evaluate {
            self.cycles += 1;
        }
        self.current = next;
        next
    }

    /// Abandon the current cycle and go back to its first phase.  Used by
    /// the outer error handler; the abandoned cycle still counts.
    pub fn restart_cycle(&mut self) {
        trace!("cycle: abandoned in {}", self.current.name());
        self.cycles += 1;
        self.current = CyclePhase::EnableSensor1;
    }
}
