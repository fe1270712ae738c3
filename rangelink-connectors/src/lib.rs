//! Broker Connectors for RangeLink Gateways
//!
//! The gateway pipeline in `rangelink-core` publishes through the
//! narrow [`Publisher`](rangelink_core::Publisher) trait; this crate
//! provides production implementations of that seam. The radio link is
//! best-effort and unacknowledged, so the connectors default to the
//! matching delivery class on the broker side (MQTT QoS 0) - adding
//! guarantees at the broker would not recover frames the radio already
//! lost.
//!
//! Currently implemented:
//! - **MQTT** ([`mqtt::MqttPublisher`]) - persistent connection,
//!   keep-alive, last-will for gateway failure detection.
//!
//! Connection management (reconnect, backoff) lives entirely inside
//! the connector; the pipeline only sees publish success or failure.

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttPublisher};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The broker connection is not currently established
    #[error("not connected to broker")]
    NotConnected,

    /// The underlying MQTT client rejected the request
    #[cfg(feature = "mqtt")]
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total records published successfully
    pub messages_sent: u64,
    /// Total records that failed to publish
    pub messages_failed: u64,
    /// Total payload bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections observed
    pub reconnections: u32,
}
