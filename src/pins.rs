//! GPIO / bus assignments for the dual time-of-flight carrier board.
//!
//! Single source of truth: the default [`SystemConfig`](crate::config::SystemConfig)
//! references this module rather than hard-coding line numbers.
//!
//! Line numbers are sysfs GPIO numbers (`bank * 32 + offset`) as seen by the
//! kernel on the Allwinner-class SoC the board is built around.

// ---------------------------------------------------------------------------
// Sensor enable / XSHUT lines (active HIGH)
// ---------------------------------------------------------------------------

/// Slot 1 enable line: GPIOA6, header pin 12.
pub const SENSOR_1_ENABLE_LINE: u64 = 6;
/// Slot 2 enable line: GPIOC3, header pin 24.
pub const SENSOR_2_ENABLE_LINE: u64 = 67;

/// Human-readable location of each enable line, used in log output.
pub const SENSOR_1_ENABLE_LABEL: &str = "GPIOA6 (pin 12)";
pub const SENSOR_2_ENABLE_LABEL: &str = "GPIOC3 (pin 24)";

// ---------------------------------------------------------------------------
// I2C
// ---------------------------------------------------------------------------

/// Bus both sensors hang off.
pub const I2C_BUS: &str = "/dev/i2c-0";

/// Factory-default VL53L1X address.  Both sensors answer here, which is
/// why only one may be powered at a time.
pub const TOF_I2C_ADDRESS: u8 = 0x29;
