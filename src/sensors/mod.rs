//! Sensor slots, readings, and the per-cycle sensor session.
//!
//! Two VL53L1X sensors sit on the same I2C bus at the same address.  Each
//! physical position is a [`SensorSlot`]; the slot's enable line decides
//! which of the two answers on the bus.

pub mod session;

use core::fmt;
use std::time::Instant;

/// Samples below this distance are treated as "no target" and dropped.
pub const NEAR_FIELD_MIN_MM: u16 = 10;

// ---------------------------------------------------------------------------
// Slot identity
// ---------------------------------------------------------------------------

/// Which of the two physical sensor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlotId {
    One = 0,
    Two = 1,
}

impl SlotId {
    /// Both slots, in cycle order.
    pub const ALL: [SlotId; 2] = [SlotId::One, SlotId::Two];

    /// Zero-based index into per-slot arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// One-based slot number as printed on the board.
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }

    /// The slot sharing the bus with this one.
    pub const fn other(self) -> SlotId {
        match self {
            SlotId::One => SlotId::Two,
            SlotId::Two => SlotId::One,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor {}", self.number())
    }
}

// ---------------------------------------------------------------------------
// Slot wiring
// ---------------------------------------------------------------------------

/// Static wiring of one sensor position.  Built once from config and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSlot {
    pub id: SlotId,
    /// Kernel GPIO number of the enable/XSHUT line.
    pub enable_line: u64,
    /// Board location of the enable line, for log output.
    pub enable_label: String,
    /// I2C character device, shared by both slots.
    pub bus: String,
    /// 7-bit I2C address, shared by both slots.
    pub address: u8,
    /// Broker topic readings from this slot go to.
    pub topic: String,
}

// ---------------------------------------------------------------------------
// Ranging mode
// ---------------------------------------------------------------------------

/// Distance mode requested when a session starts ranging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingMode {
    /// Up to ~1.3 m, best ambient-light immunity.
    Short,
    /// Up to ~4 m.
    Long,
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// One accepted distance sample.
///
/// Only constructed through [`Reading::accept`], so `distance_mm` is always
/// at least [`NEAR_FIELD_MIN_MM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    slot: SlotId,
    distance_mm: u16,
    captured_at: Instant,
}

impl Reading {
    /// Wrap a raw sample, or `None` if it falls inside the near field.
    pub fn accept(slot: SlotId, distance_mm: u16) -> Option<Self> {
        if distance_mm < NEAR_FIELD_MIN_MM {
            return None;
        }
        Some(Self {
            slot,
            distance_mm,
            captured_at: Instant::now(),
        })
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn distance_mm(&self) -> u16 {
        self.distance_mm
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// Result of sampling a sensor once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// A plausible distance; goes on to the publisher.
    Accepted(Reading),
    /// Below the near-field threshold; logged and dropped, not a failure.
    Ignored(u16),
}

impl Sample {
    pub fn classify(slot: SlotId, distance_mm: u16) -> Self {
        match Reading::accept(slot, distance_mm) {
            Some(reading) => Self::Accepted(reading),
            None => Self::Ignored(distance_mm),
        }
    }
}
