//! CRC-16/CCITT Frame Integrity Check
//!
//! Both ends of the radio link run this checksum over the first 7 bytes
//! of every frame. The variant is CCITT-FALSE: initial register 0xFFFF,
//! polynomial 0x1021, no final XOR, no bit reflection. The gateway must
//! reproduce the sensor node's checksum bit-for-bit over the raw encoded
//! bytes, so this function is the single source of truth for both
//! directions.
//!
//! Pure function, no state, no allocation - safe to call from anywhere
//! including interrupt context.

/// CCITT polynomial x^16 + x^12 + x^5 + 1.
const POLYNOMIAL: u16 = 0x1021;

/// Initial register value for CCITT-FALSE.
const INITIAL: u16 = 0xFFFF;

/// Compute the CRC-16/CCITT-FALSE checksum of a byte span.
///
/// Each input byte is XORed into the high 8 bits of the register,
/// followed by 8 shift-and-conditionally-XOR rounds.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = INITIAL;

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
