//! Broker publisher.
//!
//! Owns the single long-lived broker connection.  Connection setup is an
//! explicit state machine so it can be driven one attempt at a time:
//!
//! ```text
//!  Disconnected ──attempt ok──▶ Connected
//!       ▲   │
//!       └───┘ attempt failed → pause CONNECT_RETRY_PAUSE
//! ```
//!
//! [`Publisher::connect`] loops that machine until it reaches `Connected`,
//! with no upper bound on attempts.  Once connected, the state never goes
//! back; reconnecting after a drop is left to the broker client.

use std::time::Duration;

use log::debug;
use serde::Serialize;

use crate::app::events::AppEvent;
use crate::app::ports::{BrokerPort, Clock, EventSink};
use crate::error::{ConnectError, PublishError};
use crate::sensors::Reading;

/// Pause between failed connection attempts.
pub const CONNECT_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Wire shape of a published reading: `{"value": <mm>}`.
#[derive(Debug, Serialize)]
pub struct ReadingPayload {
    pub value: u16,
}

impl From<&Reading> for ReadingPayload {
    fn from(reading: &Reading) -> Self {
        Self {
            value: reading.distance_mm(),
        }
    }
}

/// Encode a reading as the JSON payload sent on the wire.
pub fn encode_reading(reading: &Reading) -> Result<String, PublishError> {
    serde_json::to_string(&ReadingPayload::from(reading)).map_err(|e| PublishError::Encode(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not yet connected; `attempts` failed tries so far.
    Disconnected { attempts: u32 },
    Connected,
}

pub struct Publisher<B: BrokerPort> {
    broker: B,
    state: ConnectionState,
    published: u64,
}

impl<B: BrokerPort> Publisher<B> {
    pub fn new(broker: B) -> Self {
        Self {
            broker,
            state: ConnectionState::Disconnected { attempts: 0 },
            published: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Readings handed to the broker client since startup.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    /// Make one connection attempt.  A no-op once connected.
    pub fn attempt(&mut self) -> Result<ConnectionState, ConnectError> {
        let ConnectionState::Disconnected { attempts } = self.state else {
            return Ok(self.state);
        };
        match self.broker.connect() {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(self.state)
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected {
                    attempts: attempts.saturating_add(1),
                };
                Err(e)
            }
        }
    }

    /// Block until the broker accepts a connection.  Returns the number of
    /// attempts it took.
    pub fn connect(&mut self, clock: &mut impl Clock, sink: &mut impl EventSink) -> u32 {
        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            match self.attempt() {
                Ok(_) => {
                    sink.emit(&AppEvent::BrokerConnected { attempts: attempt });
                    return attempt;
                }
                Err(e) => {
                    sink.emit(&AppEvent::BrokerConnectFailed {
                        attempt,
                        reason: e.to_string(),
                    });
                    clock.sleep(CONNECT_RETRY_PAUSE);
                }
            }
        }
    }

    /// Send `reading` on `topic`.  Returns the payload that was sent.
    pub fn publish(&mut self, topic: &str, reading: &Reading) -> Result<String, PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        let payload = encode_reading(reading)?;
        self.broker.publish(topic, payload.as_bytes())?;
        self.published += 1;
        debug!("published #{} on {}", self.published, topic);
        Ok(payload)
    }
}
