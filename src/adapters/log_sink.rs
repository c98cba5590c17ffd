//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one line per application event to
//! the `log` facade.  In production `env_logger` routes these to the log
//! file configured in [`SystemConfig`](crate::config::SystemConfig).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | enable lines low");
            }
            AppEvent::BrokerConnected { attempts } => {
                info!("MQTT  | connected (attempt {})", attempts);
            }
            AppEvent::BrokerConnectFailed { attempt, reason } => {
                error!("MQTT  | connect attempt {} failed: {}", attempt, reason);
            }
            AppEvent::SensorEnabled { slot, line } => {
                info!("SLOT  | {} enabled on {}", slot, line);
            }
            AppEvent::SensorInitFailed { slot, reason } => {
                error!("SLOT  | {} init failed: {}", slot, reason);
            }
            AppEvent::SensorReadFailed { slot, reason } => {
                error!("SLOT  | {} read failed: {}", slot, reason);
            }
            AppEvent::NearFieldIgnored { slot, distance_mm } => {
                info!("SLOT  | {} ignored {} mm (near field)", slot, distance_mm);
            }
            AppEvent::DistanceMeasured { slot, distance_mm } => {
                info!("SLOT  | {} distance {} mm", slot, distance_mm);
            }
            AppEvent::Published {
                slot,
                topic,
                payload,
            } => {
                info!("MQTT  | {} -> {} {}", slot, topic, payload);
            }
            AppEvent::PublishFailed { slot, reason } => {
                error!("MQTT  | {} publish failed: {}", slot, reason);
            }
            AppEvent::SensorClosed(slot) => {
                info!("SLOT  | {} closed", slot);
            }
            AppEvent::CycleFailed {
                failures,
                error_count,
            } => {
                warn!(
                    "CYCLE | {} failure(s), error count {}; pausing",
                    failures, error_count
                );
            }
            AppEvent::RestartRequested { error_count } => {
                error!("CYCLE | error count {} reached threshold; restarting service", error_count);
            }
            AppEvent::UnexpectedError { reason } => {
                error!("CYCLE | unexpected error: {}", reason);
            }
        }
    }
}
