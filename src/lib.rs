//! Dual VL53L1X multiplexer library.
//!
//! Exposes the pure-logic modules for integration testing.  Linux-only
//! adapters (sysfs GPIO, `/dev/i2c-*`, MQTT) are gated behind the `linux`
//! feature inside [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod publisher;
pub mod sensors;
pub mod supervisor;
