//! Bounded-lifetime sensor session.
//!
//! A [`SensorSession`] exists only while its slot's enable line is high.
//! It borrows the [`TofDriver`] for that window, and guarantees ranging is
//! stopped before the borrow ends:
//!
//! ```text
//!  open ──▶ read ──▶ close
//!    │        │
//!    │        └─ error ──▶ close
//!    └─ error (no session, nothing to close)
//! ```
//!
//! Dropping a session without calling [`SensorSession::close`] still stops
//! ranging; the close error is then only logged.

use log::{debug, warn};

use crate::app::ports::TofDriver;
use crate::error::SensorError;

use super::{RangingMode, Sample, SensorSlot, SlotId};

/// An open, ranging sensor.
pub struct SensorSession<'d, D: TofDriver> {
    driver: &'d mut D,
    slot: SlotId,
    open: bool,
}

impl<'d, D: TofDriver> SensorSession<'d, D> {
    /// Initialise the sensor at the slot's bus address and start short-range
    /// continuous ranging.
    pub fn open(driver: &'d mut D, slot: &SensorSlot) -> Result<Self, SensorError> {
        driver.open(&slot.bus, slot.address, RangingMode::Short)?;
        debug!("{} ranging on {} @ 0x{:02x}", slot.id, slot.bus, slot.address);
        Ok(Self {
            driver,
            slot: slot.id,
            open: true,
        })
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Fetch one distance sample and apply near-field rejection.
    pub fn read(&mut self) -> Result<Sample, SensorError> {
        let distance_mm = self.driver.read_distance_mm()?;
        Ok(Sample::classify(self.slot, distance_mm))
    }

    /// Stop ranging and release the device.
    pub fn close(mut self) -> Result<(), SensorError> {
        self.open = false;
        self.driver.close()
    }
}

impl<D: TofDriver> Drop for SensorSession<'_, D> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.driver.close() {
                warn!("{} did not stop ranging on drop: {}", self.slot, e);
            }
        }
    }
}
