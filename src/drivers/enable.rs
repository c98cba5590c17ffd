//! Sensor enable-line controller.
//!
//! Both VL53L1X sensors boot at address 0x29, so at most one of them may
//! be powered at any instant.  Each sensor's XSHUT pin is wired to its own
//! active-high output line.
//!
//! ## Ordering contract
//!
//! [`EnableController::set_exclusive`] always drives the *other* line low
//! before driving the target line high, so there is no window in which
//! both are asserted even if the process dies between the two writes.
//! Every state change is followed by [`SETTLE_DELAY`] so the addressed
//! sensor has time to boot (or the released one to power down).

use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::app::ports::Clock;
use crate::error::LineError;
use crate::sensors::SlotId;

/// Pause after any enable-line change.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

pub struct EnableController<P: OutputPin> {
    lines: [P; 2],
    asserted: Option<SlotId>,
}

impl<P: OutputPin> EnableController<P> {
    /// `line_1` gates slot 1, `line_2` gates slot 2.  Lines are not touched
    /// until [`init`](Self::init) is called.
    pub fn new(line_1: P, line_2: P) -> Self {
        Self {
            lines: [line_1, line_2],
            asserted: None,
        }
    }

    /// Drive both lines low without waiting.  Called once at startup so
    /// neither sensor is powered before the loop takes over.
    pub fn init(&mut self) -> Result<(), LineError> {
        for slot in SlotId::ALL {
            self.write(slot, false)?;
        }
        self.asserted = None;
        Ok(())
    }

    /// Power exactly `slot`'s sensor, then wait for it to boot.
    pub fn set_exclusive(&mut self, slot: SlotId, clock: &mut impl Clock) -> Result<(), LineError> {
        self.write(slot.other(), false)?;
        self.write(slot, true)?;
        self.asserted = Some(slot);
        debug!("enable: {} asserted", slot);
        clock.sleep(SETTLE_DELAY);
        Ok(())
    }

    /// Power both sensors down, then wait.
    pub fn disable_all(&mut self, clock: &mut impl Clock) -> Result<(), LineError> {
        self.init()?;
        debug!("enable: all lines released");
        clock.sleep(SETTLE_DELAY);
        Ok(())
    }

    /// The slot currently powered, as far as this controller knows.
    pub fn asserted(&self) -> Option<SlotId> {
        self.asserted
    }

    /// Access the raw lines (test inspection).
    pub fn lines(&self) -> &[P; 2] {
        &self.lines
    }

    fn write(&mut self, slot: SlotId, high: bool) -> Result<(), LineError> {
        let line = &mut self.lines[slot.index()];
        let result = if high { line.set_high() } else { line.set_low() };
        result.map_err(|e| {
            if high {
                // A failed assert leaves the line state unknown.
                self.asserted = None;
            }
            LineError {
                slot,
                detail: format!("{:?}", e),
            }
        })
    }
}
