//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  One event maps to one log
//! line in production.

use crate::sensors::SlotId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Both enable lines are configured and low; the loop is about to start.
    Started,

    /// The broker accepted the connection after `attempts` tries.
    BrokerConnected { attempts: u32 },

    /// A connection attempt failed; the next one follows after a pause.
    BrokerConnectFailed { attempt: u32, reason: String },

    /// A slot's enable line went high and the settle delay elapsed.
    SensorEnabled { slot: SlotId, line: String },

    /// The sensor did not come up; the slot is skipped this cycle.
    SensorInitFailed { slot: SlotId, reason: String },

    /// The sensor came up but no sample could be read.
    SensorReadFailed { slot: SlotId, reason: String },

    /// A sample fell inside the near field and was dropped.
    NearFieldIgnored { slot: SlotId, distance_mm: u16 },

    /// A valid sample was taken.
    DistanceMeasured { slot: SlotId, distance_mm: u16 },

    /// A reading was handed to the broker client.
    Published { slot: SlotId, topic: String, payload: String },

    /// A reading could not be handed to the broker client.
    PublishFailed { slot: SlotId, reason: String },

    /// Ranging stopped and the session was released.
    SensorClosed(SlotId),

    /// A cycle finished with failures below the escalation threshold.
    CycleFailed { failures: u32, error_count: u32 },

    /// The escalation threshold was reached; a restart is being requested.
    RestartRequested { error_count: u32 },

    /// Something outside the per-slot taxonomy went wrong mid-cycle.
    UnexpectedError { reason: String },
}
