//! MQTT publisher for RangeLink gateways
//!
//! Wraps rumqttc's synchronous client behind the core
//! [`Publisher`](rangelink_core::Publisher) seam. The event loop runs
//! on its own thread so `publish` never blocks on network I/O; the
//! pipeline's loop-driven cadence is preserved.
//!
//! Delivery is QoS 0 to match the radio link's best-effort contract.
//! A last-will record lets consumers detect a gateway that dropped off
//! the broker without a clean disconnect.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rumqttc::{Client, Event, LastWill, MqttOptions, Packet, QoS};

use rangelink_core::Publisher;

use crate::{ConnectionStats, ConnectorError};

/// Delay before the event loop retries after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// MQTT connection configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: String,
    /// Broker port (1883 for plain TCP)
    pub port: u16,
    /// Client identifier presented to the broker
    pub client_id: String,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u64,
    /// Optional username/password pair
    pub credentials: Option<(String, String)>,
    /// Topic for the retained last-will record, if any
    pub last_will_topic: Option<String>,
}

impl MqttConfig {
    /// Configuration with conventional defaults for a local broker
    pub fn new(host: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 1883,
            client_id: client_id.into(),
            keep_alive_secs: 60,
            credentials: None,
            last_will_topic: None,
        }
    }
}

/// MQTT implementation of the gateway publish seam
pub struct MqttPublisher {
    client: Client,
    connected: Arc<AtomicBool>,
    reconnections: Arc<AtomicU32>,
    messages_sent: u64,
    messages_failed: u64,
    bytes_sent: u64,
}

impl MqttPublisher {
    /// Connect to the broker and start the event loop thread
    pub fn connect(config: MqttConfig) -> Self {
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let Some((user, pass)) = config.credentials {
            options.set_credentials(user, pass);
        }
        if let Some(topic) = config.last_will_topic {
            options.set_last_will(LastWill::new(
                topic,
                "offline".as_bytes().to_vec(),
                QoS::AtMostOnce,
                true,
            ));
        }

        let (client, mut connection) = Client::new(options, 16);

        let connected = Arc::new(AtomicBool::new(false));
        let reconnections = Arc::new(AtomicU32::new(0));
        let flag = Arc::clone(&connected);
        let retries = Arc::clone(&reconnections);

        thread::spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        flag.store(true, Ordering::SeqCst);
                        log::info!("mqtt connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Count each drop once, not every retry attempt
                        if flag.swap(false, Ordering::SeqCst) {
                            retries.fetch_add(1, Ordering::SeqCst);
                        }
                        log::warn!("mqtt connection error: {e}");
                        thread::sleep(RECONNECT_DELAY);
                    }
                }
            }
        });

        Self {
            client,
            connected,
            reconnections,
            messages_sent: 0,
            messages_failed: 0,
            bytes_sent: 0,
        }
    }

    /// Whether the broker connection is currently up
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Counters accumulated since connect
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            messages_sent: self.messages_sent,
            messages_failed: self.messages_failed,
            bytes_sent: self.bytes_sent,
            reconnections: self.reconnections.load(Ordering::SeqCst),
        }
    }

    /// Cleanly disconnect from the broker
    pub fn disconnect(&mut self) -> Result<(), ConnectorError> {
        self.client.disconnect()?;
        Ok(())
    }
}

impl Publisher for MqttPublisher {
    type Error = ConnectorError;

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error> {
        if !self.is_connected() {
            self.messages_failed += 1;
            return Err(ConnectorError::NotConnected);
        }

        match self
            .client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
        {
            Ok(()) => {
                self.messages_sent += 1;
                self.bytes_sent += payload.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.messages_failed += 1;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = MqttConfig::new("broker.local", "gateway_01");

        assert_eq!(config.port, 1883);
        assert_eq!(config.keep_alive_secs, 60);
        assert!(config.credentials.is_none());
        assert!(config.last_will_topic.is_none());
    }
}
