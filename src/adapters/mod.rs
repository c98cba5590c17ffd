//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                     |
//! |------------|-----------------------|---------------------------------|
//! | `gpio`     | `OutputPin`           | Linux sysfs GPIO                |
//! | `log_sink` | EventSink             | `log` facade                    |
//! | `mqtt`     | BrokerPort            | rumqttc sync client             |
//! | `restart`  | RestartPort           | external process-control command|
//! | `time`     | Clock                 | `std::thread::sleep`            |
//! | `vl53l1x`  | TofDriver             | VL53L1X ULD over `/dev/i2c-*`   |

#[cfg(feature = "linux")]
pub mod gpio;
pub mod log_sink;
#[cfg(feature = "linux")]
pub mod mqtt;
pub mod restart;
pub mod time;
#[cfg(feature = "linux")]
pub mod vl53l1x;
