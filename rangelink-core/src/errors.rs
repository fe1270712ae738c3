//! Error Types for the Telemetry Link
//!
//! Designed for the same constraints as the rest of the core:
//!
//! 1. **Small Size**: each variant carries a few integers at most, since
//!    errors are returned in the receive hot path.
//!
//! 2. **No Heap Allocation**: all error data is inline, deterministic
//!    memory usage on `no_std` targets.
//!
//! 3. **Copy Semantics**: errors implement Copy so they can be returned
//!    and stored in counters without move complications.
//!
//! Note what is *not* an error here: a sample rejected by the distance
//! filter is an expected per-cycle outcome ([`crate::filter::FilterUpdate`]),
//! and filter divergence recovery happens silently inside the filter.
//! Nothing in this core is fatal - the worst case is a dropped frame or
//! a cycle with no estimate.

use thiserror_no_std::Error;

/// Result type for frame decode operations
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors produced while decoding a received frame
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Stored checksum does not match the checksum recomputed over the
    /// first 7 received bytes. The whole frame is untrusted; no logical
    /// field is returned and the caller must discard it. No retry at
    /// this layer - the link is one-shot best-effort.
    #[error("checksum mismatch: stored {stored:#06X}, computed {computed:#06X}")]
    Integrity {
        /// CRC carried in the last two frame bytes
        stored: u16,
        /// CRC recomputed by the receiver
        computed: u16,
    },

    /// Input is not exactly one frame long.
    #[error("expected {expected}-byte frame, got {actual} bytes")]
    Length {
        /// Required frame length
        expected: usize,
        /// Length of the slice actually received
        actual: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Integrity { stored, computed } =>
                defmt::write!(fmt, "CRC mismatch: stored {:#06X}, computed {:#06X}", stored, computed),
            Self::Length { expected, actual } =>
                defmt::write!(fmt, "Bad frame length: expected {}, got {}", expected, actual),
        }
    }
}
