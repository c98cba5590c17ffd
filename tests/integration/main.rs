//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real GPIO,
//! I2C bus, or broker required.

mod cycle_tests;
mod publisher_tests;
