//! Adaptive Distance Filter Demo
//!
//! Feeds the filter a scripted mix of clean samples, noise spikes, and
//! a sustained sensor fault, showing how the gates and the divergence
//! reset keep the estimate sane without any calibration step.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_distance_filter
//! ```

use rangelink_core::{DistanceFilter, FilterUpdate};

fn main() {
    println!("RangeLink Distance Filter Example");
    println!("=================================\n");

    let mut filter = DistanceFilter::new();
    let mut now = 0u64;

    println!("Phase 1: noisy but honest samples around 250 cm\n");
    let clean = [252.1, 249.4, 250.8, 248.9, 251.5, 250.2, 249.7, 250.4];
    for raw in clean {
        now += 1000;
        report(raw, filter.update(raw, now), &filter);
    }

    println!("\nPhase 2: glitches - a multipath echo and an impossible reading\n");
    for raw in [412.0, 7.5] {
        now += 1000;
        report(raw, filter.update(raw, now), &filter);
    }

    println!("\nPhase 3: sensor occluded - 16 impossible readings in a row\n");
    for _ in 0..16 {
        now += 1000;
        filter.update(2.0, now);
    }
    println!(
        "  after the streak: estimate={:.1} cm, accepted samples={}, resets={}",
        filter.estimate(),
        filter.accepted_samples(),
        filter.resets()
    );
    println!("  (filter restored its startup tuning and will re-acquire)");

    println!("\nPhase 4: occlusion clears, surface now at 180 cm\n");
    for raw in [181.0, 179.6, 180.3, 180.1, 179.9] {
        now += 1000;
        report(raw, filter.update(raw, now), &filter);
    }

    println!("\nFinal confidence: {:.0}%", filter.confidence());
}

fn report(raw: f32, update: FilterUpdate, filter: &DistanceFilter) {
    match update {
        FilterUpdate::Estimate(cm) => println!(
            "  raw {raw:6.1} cm -> estimate {cm:6.1} cm  (gain {:.3})",
            filter.gain()
        ),
        FilterUpdate::Rejected(reason) => {
            println!("  raw {raw:6.1} cm -> REJECTED ({reason:?})")
        }
    }
}
