//! Sysfs GPIO enable lines.
//!
//! [`SysfsLine`] exports a kernel GPIO, configures it as an output driven
//! low, and exposes it as an `embedded-hal` 1.0 [`OutputPin`] so the
//! [`EnableController`](crate::drivers::enable::EnableController) stays
//! platform-agnostic.

use core::fmt;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use linux_embedded_hal::sysfs_gpio::{Direction, Pin};

/// A sysfs write failed.
#[derive(Debug)]
pub struct LineIoError(pub linux_embedded_hal::sysfs_gpio::Error);

impl fmt::Display for LineIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sysfs gpio: {}", self.0)
    }
}

impl std::error::Error for LineIoError {}

impl digital::Error for LineIoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One exported output line.
pub struct SysfsLine {
    pin: Pin,
}

impl SysfsLine {
    /// Export `line` and configure it as an output, initially low.
    pub fn open(line: u64) -> Result<Self, LineIoError> {
        let pin = Pin::new(line);
        pin.export().map_err(LineIoError)?;
        pin.set_direction(Direction::Low).map_err(LineIoError)?;
        Ok(Self { pin })
    }

    pub fn number(&self) -> u64 {
        self.pin.get_pin_num()
    }
}

impl ErrorType for SysfsLine {
    type Error = LineIoError;
}

impl OutputPin for SysfsLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(0).map_err(LineIoError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_value(1).map_err(LineIoError)
    }
}
