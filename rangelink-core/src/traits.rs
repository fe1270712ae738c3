//! Collaborator seams for the telemetry pipelines
//!
//! The core does no I/O of its own. Everything that touches hardware or
//! a network - the ultrasonic driver, the temperature probe, the battery
//! gauge, the radio, the broker client - sits behind one of these narrow
//! traits. The pipelines consume the abstractions; platform crates and
//! test doubles provide them.
//!
//! Keep these simple. The sensor node is a loop-driven single-threaded
//! device; none of these calls suspend, and the only ones allowed to
//! block briefly are the transport methods.

pub use crate::time::TimeSource;

/// Raw distance sampler
///
/// Yields one centimeter reading on demand. The reading may be out of
/// the sensor's physical range or noisy - validity gating is the
/// filter's job, not the driver's.
pub trait DistanceSensor {
    /// Take one raw distance measurement in centimeters
    fn read_cm(&mut self) -> f32;
}

/// Raw temperature sampler
///
/// No filtering is applied to temperature by the core; the reading goes
/// onto the wire as measured.
pub trait TemperatureSensor {
    /// Take one temperature measurement in degrees Celsius
    fn read_celsius(&mut self) -> f32;
}

/// Battery state-of-charge gauge
pub trait BatteryMonitor {
    /// Current battery level as a percentage (0-100)
    fn level_pct(&mut self) -> u8;
}

/// Best-effort radio transport
///
/// Fire-and-forget send with no acknowledgement; polled receive using
/// `nb::Result` so callers can distinguish "no frame yet"
/// (`nb::Error::WouldBlock`) from actual transport errors. The link
/// offers no delivery, ordering, or integrity guarantees - integrity is
/// added by the frame CRC above this layer.
pub trait RadioTransport {
    /// Transport-specific error type
    type Error;

    /// Transmit one encoded frame, best-effort
    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Poll for a received frame, copying it into `buf`
    ///
    /// Returns the number of bytes written, `WouldBlock` when nothing
    /// is pending. The buffer must have room for one full frame.
    fn receive(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;
}

/// Publish/subscribe broker client
///
/// The gateway hands each decoded frame's text record to this seam.
/// Delivery guarantees are the implementation's concern.
pub trait Publisher {
    /// Client-specific error type
    type Error;

    /// Publish a text payload to a topic
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error>;
}
