//! Port traits: the hexagonal boundary between the control loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (ToF driver, broker client, restart command, clock,
//! event sinks) implement these traits.  The enable lines use
//! [`embedded_hal::digital::OutputPin`] directly rather than a local trait.
//! The [`AppService`](super::service::AppService) consumes all of them via
//! generics, so the domain core never touches Linux devices directly and
//! every test runs against recording doubles.

use std::time::Duration;

use crate::error::{ConnectError, PublishError, RestartError, SensorError};
use crate::sensors::RangingMode;

// ───────────────────────────────────────────────────────────────
// Distance sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// A time-of-flight ranging device reached over I2C.
///
/// Calls always arrive in `open → read_distance_mm* → close` order, and
/// only while the sensor's enable line is asserted.
pub trait TofDriver {
    /// Bring up the device at `address` on `bus` and start continuous
    /// ranging in `mode`.
    fn open(&mut self, bus: &str, address: u8, mode: RangingMode) -> Result<(), SensorError>;

    /// Block until the next sample is available and return it in mm.
    fn read_distance_mm(&mut self) -> Result<u16, SensorError>;

    /// Stop ranging and release the bus handle.  Idempotent.
    fn close(&mut self) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// A single broker connection.
pub trait BrokerPort {
    /// One connection attempt.  Retrying is the caller's business.
    fn connect(&mut self) -> Result<(), ConnectError>;

    /// Hand one message to the client, fire-and-forget (QoS 0, no retain).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Restart port (driven adapter: domain → process manager)
// ───────────────────────────────────────────────────────────────

/// Asks the environment to restart this process.
///
/// Runs synchronously.  On a real system a successful call usually means
/// the process is about to be killed.
pub trait RestartPort {
    fn request_restart(&mut self) -> Result<(), RestartError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Timed pauses.  The only suspension points in the control loop go
/// through here, so tests substitute a clock that just records them.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
