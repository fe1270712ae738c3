//! Core telemetry engine for RangeLink
//!
//! A two-role embedded telemetry link: a battery-powered sensor node
//! measures distance (ultrasonic) and temperature and transmits 9-byte
//! CRC-protected frames over a lossy long-range radio; a gateway node
//! verifies and republishes them to a pub/sub broker as compact text.
//!
//! Key constraints:
//! - `no_std` by default; runs on radio-class microcontrollers
//! - No heap allocation anywhere in the core
//! - Every operation is O(1) and returns immediately
//!
//! ```no_run
//! use rangelink_core::filter::DistanceFilter;
//!
//! let mut filter = DistanceFilter::new();
//!
//! // Feed raw ultrasonic samples with a monotonic ms timestamp
//! match filter.update(314.2, 1000).estimate() {
//!     Some(cm) => { /* transmit refined estimate */ let _ = cm; }
//!     None => { /* rejected - silence this cycle */ }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod crc;
pub mod errors;
pub mod filter;
pub mod frame;
pub mod pipeline;
pub mod time;
pub mod traits;

// Public API
pub use crc::crc16_ccitt;
pub use errors::{FrameError, FrameResult};
pub use filter::{DistanceFilter, FilterUpdate, RejectReason};
pub use frame::TelemetryReading;
pub use pipeline::{GatewayPipeline, SensorPipeline};
pub use traits::{
    BatteryMonitor, DistanceSensor, Publisher, RadioTransport, TemperatureSensor, TimeSource,
};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
