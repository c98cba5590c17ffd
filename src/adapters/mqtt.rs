//! MQTT broker adapter.
//!
//! Implements [`BrokerPort`] on the `rumqttc` synchronous client.  A
//! connection attempt builds a fresh client and drives its event loop until
//! the broker answers the CONNECT.  On success the event loop moves to a
//! background `mqtt-io` thread which keeps the session alive (pings,
//! reconnects) for the rest of the process; the control loop only ever
//! enqueues publishes.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};

use crate::app::ports::BrokerPort;
use crate::config::SystemConfig;
use crate::error::{ConnectError, PublishError};

/// Outgoing request queue depth.
const REQUEST_CAPACITY: usize = 10;

/// Events to wait through for the CONNACK before giving up an attempt.
const CONNACK_EVENT_BUDGET: usize = 16;

/// Pause after a dropped session before the background loop polls again.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

pub struct MqttBroker {
    options: MqttOptions,
    client: Option<Client>,
}

impl MqttBroker {
    pub fn new(options: MqttOptions) -> Self {
        Self {
            options,
            client: None,
        }
    }

    /// Broker options from the `mqtt_*` config fields.
    pub fn from_config(config: &SystemConfig) -> Self {
        let mut options = MqttOptions::new(
            config.mqtt_client_id.clone(),
            config.mqtt_host.clone(),
            config.mqtt_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.mqtt_keep_alive_secs)));
        Self::new(options)
    }

    fn await_connack(connection: &mut Connection) -> Result<(), ConnectError> {
        for notification in connection.iter().take(CONNACK_EVENT_BUDGET) {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    return if ack.code == ConnectReturnCode::Success {
                        Ok(())
                    } else {
                        Err(ConnectError(format!("broker refused: {:?}", ack.code)))
                    };
                }
                Ok(other) => debug!("mqtt: waiting for CONNACK, got {:?}", other),
                Err(e) => return Err(ConnectError(e.to_string())),
            }
        }
        Err(ConnectError("no CONNACK from broker".into()))
    }

    fn spawn_io(mut connection: Connection) -> Result<(), ConnectError> {
        thread::Builder::new()
            .name("mqtt-io".into())
            .spawn(move || {
                for notification in connection.iter() {
                    if let Err(e) = notification {
                        warn!("mqtt: connection error: {}", e);
                        thread::sleep(RECONNECT_PAUSE);
                    }
                }
            })
            .map(|_| ())
            .map_err(|e| ConnectError(format!("spawn mqtt-io: {}", e)))
    }
}

impl BrokerPort for MqttBroker {
    fn connect(&mut self) -> Result<(), ConnectError> {
        let (client, mut connection) = Client::new(self.options.clone(), REQUEST_CAPACITY);
        let (host, port) = self.options.broker_address();
        debug!("mqtt: connecting to {}:{}", host, port);

        Self::await_connack(&mut connection)?;
        Self::spawn_io(connection)?;
        self.client = Some(client);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let client = self.client.as_mut().ok_or(PublishError::NotConnected)?;
        client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| PublishError::Send(e.to_string()))
    }
}
