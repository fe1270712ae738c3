//! Constants for RangeLink Core
//!
//! Centralized, documented constants used throughout the telemetry link.
//! All numeric values live here with their purpose, source, and units so
//! that sensor tuning never hides behind magic numbers.
//!
//! Constants are grouped by domain:
//! - **Wire**: frame layout and fixed-point scaling
//! - **Ranging**: physical envelope of the ultrasonic sensor
//! - **Filter**: Kalman tuning and gating thresholds

// ===== WIRE FORMAT =====

/// Total size of an encoded telemetry frame in bytes.
///
/// Fixed layout: device id (2) + distance (2) + temperature (2) +
/// battery (1) + CRC (2). There is no versioning field; any change to
/// the field set is a breaking change for every deployed node.
pub const FRAME_LEN: usize = 9;

/// Number of leading frame bytes covered by the CRC.
///
/// The checksum always spans the first 7 bytes in on-wire order; both
/// encoder and decoder must compute over exactly this span.
pub const CRC_SPAN: usize = FRAME_LEN - 2;

/// Fixed-point scale for distance and temperature fields.
///
/// Physical values are multiplied by 100 and truncated to an integer on
/// encode, recovered by dividing by 100.0 on decode. Gives two decimal
/// places over the representable range.
pub const FIXED_POINT_SCALE: f32 = 100.0;

// ===== ULTRASONIC RANGING ENVELOPE =====

/// Minimum measurable distance for the JSN-SR04T transducer (cm).
///
/// Below 30 cm the transducer's ring-down overlaps the echo and readings
/// are garbage. Anything under this bound is physically impossible for
/// the sensor, regardless of history.
///
/// Source: JSN-SR04T datasheet
pub const MIN_DISTANCE_CM: f32 = 30.0;

/// Maximum measurable distance for the JSN-SR04T transducer (cm).
///
/// The datasheet claims 6 m; in practice echo strength degrades past
/// 5.7 m and readings become unreliable.
///
/// Source: JSN-SR04T datasheet, derated from field testing
pub const MAX_DISTANCE_CM: f32 = 570.0;

/// Maximum plausible rate of change for the measured surface (cm/s).
///
/// Water levels and tank contents move slowly; a step larger than this
/// bound implies a sensor glitch or multipath echo, not real motion.
pub const MAX_RATE_CM_PER_S: f32 = 50.0;

/// Elapsed time after which the rate gate is waived (ms).
///
/// A long gap between accepted samples invalidates the rate assumption:
/// the surface may legitimately have moved far in the meantime, so the
/// gate only applies to closely spaced samples.
pub const RATE_GATE_WAIVER_MS: u64 = 5_000;

// ===== DISTANCE FILTER TUNING =====

/// Process noise covariance Q.
///
/// Low because the measured distance changes slowly between samples.
pub const FILTER_PROCESS_NOISE: f32 = 0.05;

/// Nominal measurement noise covariance R.
///
/// The JSN-SR04T is fairly accurate; R adapts around this value per
/// sample based on innovation magnitude.
pub const FILTER_MEASUREMENT_NOISE: f32 = 1.5;

/// Measurement noise used while the filter distrusts a reading.
///
/// Applied when |innovation| exceeds [`LARGE_INNOVATION_CM`]; the filter
/// moves slowly toward suspicious readings.
pub const FILTER_NOISE_DISTRUST: f32 = 3.0;

/// Measurement noise used while the filter trusts a reading.
///
/// Applied when |innovation| is below [`SMALL_INNOVATION_CM`]; lets the
/// filter converge fast on consistent data.
pub const FILTER_NOISE_TRUST: f32 = 1.0;

/// Innovation magnitude above which a reading is distrusted (cm).
pub const LARGE_INNOVATION_CM: f32 = 20.0;

/// Innovation magnitude below which a reading is trusted (cm).
pub const SMALL_INNOVATION_CM: f32 = 5.0;

/// Initial estimate covariance P.
pub const FILTER_INITIAL_COVARIANCE: f32 = 5.0;

/// Initial distance estimate X (cm).
///
/// Mid-envelope starting point (3 m) so the first accepted samples pull
/// the estimate in either direction without a huge initial innovation.
pub const FILTER_INITIAL_ESTIMATE_CM: f32 = 300.0;

/// Consecutive rejections tolerated before a full filter reset.
///
/// A streak longer than this means the filter has locked onto a stale
/// estimate (occlusion, sensor fault); restoring the startup tuning lets
/// it re-acquire instead of rejecting forever.
pub const RESET_REJECTION_THRESHOLD: u32 = 15;

/// Kalman gain below which the filter is considered converged.
pub const STABLE_GAIN_THRESHOLD: f32 = 0.02;

/// Accepted samples required before the filter can report stability.
pub const STABLE_SAMPLE_COUNT: u32 = 10;

/// Accepted samples required before confidence is meaningful.
///
/// With fewer samples the gain is still dominated by the initial
/// covariance and confidence reads as zero.
pub const CONFIDENCE_MIN_SAMPLES: u32 = 5;

// ===== TIME =====

/// Milliseconds per second, for rate calculations.
pub const MS_PER_SECOND: u64 = 1_000;
