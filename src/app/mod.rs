//! Application core: the cycle orchestrator and its ports.
//!
//! This module contains the control-loop rules for the dual-sensor
//! daemon: slot sequencing, failure tallying, and hand-off to the error
//! supervisor.  All interaction with hardware, the broker, and the OS
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
