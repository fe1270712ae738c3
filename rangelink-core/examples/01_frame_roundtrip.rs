//! Frame Encode/Decode Walk-Through
//!
//! Demonstrates the 9-byte wire format: fixed-point packing, the CRC
//! integrity check, and the JSON projection the gateway publishes.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_frame_roundtrip
//! ```

use rangelink_core::{frame, FrameError, TelemetryReading};

fn main() {
    println!("RangeLink Frame Round-Trip Example");
    println!("==================================\n");

    let reading = TelemetryReading {
        device_id: frame::parse_device_id("1"),
        distance_cm: 314.27,
        temperature_c: -3.5,
        battery_pct: 91,
    };

    // Encode into the fixed 9-byte frame
    let encoded = frame::encode(&reading);
    print!("Encoded frame ({} bytes):", encoded.len());
    for byte in &encoded {
        print!(" {byte:02X}");
    }
    println!("\n");

    // Decode verifies the CRC before trusting any field
    let decoded = frame::decode(&encoded).expect("clean frame must decode");
    println!("Decoded fields:");
    println!("  device id:   {}", decoded.device_id);
    println!("  distance:    {:.2} cm", decoded.distance_cm);
    println!("  temperature: {:.2} °C", decoded.temperature_c);
    println!("  battery:     {}%", decoded.battery_pct);
    println!();

    // The gateway publishes this exact record per decoded frame
    println!("Broker record: {}", frame::to_json(&decoded));
    println!();

    // Any single corrupted bit in the CRC span is caught
    let mut corrupted = encoded;
    corrupted[2] ^= 0x01;
    match frame::decode(&corrupted) {
        Err(FrameError::Integrity { stored, computed }) => {
            println!("Corrupted frame rejected:");
            println!("  stored CRC:   {stored:#06X}");
            println!("  computed CRC: {computed:#06X}");
        }
        other => println!("unexpected result: {other:?}"),
    }

    // Deliberate tolerant paths, shared by every deployed node
    println!("\nTolerant encode paths:");
    println!("  parse_device_id(\"tank-a\") = {}", frame::parse_device_id("tank-a"));
    let negative = TelemetryReading { distance_cm: -5.0, ..reading };
    let floored = frame::decode(&frame::encode(&negative)).unwrap();
    println!("  distance -5.0 cm encodes as {:.2} cm", floored.distance_cm);
}
