//! Telemetry Pipelines
//!
//! Thin orchestration over the codec and the filter, one struct per
//! node role. The data path is strictly one-directional:
//!
//! ```text
//! sensor node:  sampler -> DistanceFilter -> encode -> radio
//! gateway:      radio -> decode -> JSON projection -> broker
//! ```
//!
//! Both pipelines are loop-driven: the platform calls `poll()` once per
//! cycle and the pipeline performs at most one frame's worth of work.
//! Nothing here suspends; the only potentially blocking calls are the
//! collaborator seams (radio send, broker publish) whose timeout and
//! retry policy is their own concern.
//!
//! Degraded behavior is deliberate silence: a rejected sample sends no
//! frame this cycle, and a frame failing its CRC is dropped without
//! retry or re-request - the link is one-shot best-effort.

use crate::{
    constants::FRAME_LEN,
    errors::FrameError,
    filter::{DistanceFilter, FilterUpdate, RejectReason},
    frame::{self, TelemetryReading},
    traits::{BatteryMonitor, DistanceSensor, Publisher, RadioTransport, TemperatureSensor, TimeSource},
};

/// Outcome of one sensor-node cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorCycle {
    /// Sample accepted; this reading was encoded and handed to the radio
    Sent(TelemetryReading),
    /// Sample rejected by the filter; no frame sent this cycle
    Rejected(RejectReason),
}

/// Counters for the sensor-node direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames handed to the radio successfully
    pub frames_sent: u32,
    /// Radio send attempts that returned an error
    pub send_failures: u32,
    /// Samples rejected by the filter gates
    pub samples_rejected: u32,
    /// Filter divergence recoveries observed
    pub filter_resets: u32,
}

/// Sensor-node pipeline: sample, filter, encode, transmit
///
/// Owns its filter instance outright - one owner, one writer, no
/// ambient global state.
pub struct SensorPipeline<D, T, B, R, C> {
    device_id: u16,
    distance: D,
    temperature: T,
    battery: B,
    radio: R,
    clock: C,
    filter: DistanceFilter,
    stats: LinkStats,
}

impl<D, T, B, R, C> SensorPipeline<D, T, B, R, C>
where
    D: DistanceSensor,
    T: TemperatureSensor,
    B: BatteryMonitor,
    R: RadioTransport,
    C: TimeSource,
{
    pub fn new(device_id: u16, distance: D, temperature: T, battery: B, radio: R, clock: C) -> Self {
        Self {
            device_id,
            distance,
            temperature,
            battery,
            radio,
            clock,
            filter: DistanceFilter::new(),
            stats: LinkStats::default(),
        }
    }

    /// Run one acquisition cycle
    ///
    /// Samples distance, feeds it through the filter, and on acceptance
    /// encodes and transmits one frame carrying the refined estimate,
    /// the raw temperature, and the battery level. A rejected sample is
    /// the expected degraded path and produces no frame.
    ///
    /// Radio errors belong to the transport's error model and are
    /// surfaced to the caller after being counted.
    pub fn poll(&mut self) -> Result<SensorCycle, R::Error> {
        let raw_cm = self.distance.read_cm();
        let now = self.clock.now();

        let estimate = match self.filter.update(raw_cm, now) {
            FilterUpdate::Estimate(cm) => cm,
            FilterUpdate::Rejected(reason) => {
                self.stats.samples_rejected += 1;
                self.stats.filter_resets = self.filter.resets();
                #[cfg(feature = "log")]
                log::debug!(
                    "sample rejected ({:?}): raw={:.1}cm estimate={:.1}cm streak={}",
                    reason,
                    raw_cm,
                    self.filter.estimate(),
                    self.filter.rejected_streak(),
                );
                return Ok(SensorCycle::Rejected(reason));
            }
        };

        let reading = TelemetryReading {
            device_id: self.device_id,
            distance_cm: estimate,
            temperature_c: self.temperature.read_celsius(),
            battery_pct: self.battery.level_pct(),
        };

        let encoded = frame::encode(&reading);
        match self.radio.send(&encoded) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                Ok(SensorCycle::Sent(reading))
            }
            Err(e) => {
                self.stats.send_failures += 1;
                Err(e)
            }
        }
    }

    /// Counters accumulated since construction
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Read-only view of the filter for diagnostics
    pub fn filter(&self) -> &DistanceFilter {
        &self.filter
    }
}

/// Counters for the gateway direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GatewayStats {
    /// Frames received from the radio
    pub frames_received: u32,
    /// Frames dropped for a bad checksum or length
    pub frames_dropped: u32,
    /// Records published to the broker
    pub published: u32,
    /// Broker publishes that returned an error
    pub publish_failures: u32,
}

/// Errors surfaced by a gateway cycle
///
/// Both variants come from collaborator seams; the core itself never
/// fails a cycle. An integrity failure is not represented here - the
/// frame is silently dropped and counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayError<RE, PE> {
    /// The radio transport reported a hard fault
    Radio(RE),
    /// The broker client could not publish the record
    Publish(PE),
}

/// Gateway pipeline: receive, verify, project, publish
pub struct GatewayPipeline<R, P> {
    topic: &'static str,
    radio: R,
    publisher: P,
    stats: GatewayStats,
}

impl<R, P> GatewayPipeline<R, P>
where
    R: RadioTransport,
    P: Publisher,
{
    pub fn new(topic: &'static str, radio: R, publisher: P) -> Self {
        Self {
            topic,
            radio,
            publisher,
            stats: GatewayStats::default(),
        }
    }

    /// Drain at most one pending frame from the radio
    ///
    /// Returns `Ok(None)` when nothing is pending or when a received
    /// frame failed its integrity check (dropped, counted, never
    /// retried). Returns the decoded reading after it has been
    /// published.
    pub fn poll(&mut self) -> Result<Option<TelemetryReading>, GatewayError<R::Error, P::Error>> {
        let mut buf = [0u8; FRAME_LEN];
        let len = match self.radio.receive(&mut buf) {
            Ok(len) => len,
            Err(nb::Error::WouldBlock) => return Ok(None),
            Err(nb::Error::Other(e)) => return Err(GatewayError::Radio(e)),
        };
        self.stats.frames_received += 1;

        let reading = match frame::decode(&buf[..len]) {
            Ok(reading) => reading,
            Err(FrameError::Integrity { stored, computed }) => {
                self.stats.frames_dropped += 1;
                #[cfg(feature = "log")]
                log::warn!(
                    "frame dropped: CRC mismatch (stored {:#06X}, computed {:#06X})",
                    stored,
                    computed,
                );
                #[cfg(not(feature = "log"))]
                let _ = (stored, computed);
                return Ok(None);
            }
            Err(FrameError::Length { actual, .. }) => {
                self.stats.frames_dropped += 1;
                #[cfg(feature = "log")]
                log::warn!("frame dropped: bad length {}", actual);
                #[cfg(not(feature = "log"))]
                let _ = actual;
                return Ok(None);
            }
        };

        let payload = frame::to_json(&reading);
        match self.publisher.publish(self.topic, payload.as_str()) {
            Ok(()) => {
                self.stats.published += 1;
                #[cfg(feature = "log")]
                log::trace!("published to {}: {}", self.topic, payload.as_str());
                Ok(Some(reading))
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                Err(GatewayError::Publish(e))
            }
        }
    }

    /// Counters accumulated since construction
    pub fn stats(&self) -> GatewayStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedTime;
    use core::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    struct ScriptedDistance {
        samples: Vec<f32>,
        cursor: usize,
    }

    impl ScriptedDistance {
        fn new(samples: &[f32]) -> Self {
            Self { samples: samples.to_vec(), cursor: 0 }
        }
    }

    impl DistanceSensor for ScriptedDistance {
        fn read_cm(&mut self) -> f32 {
            let sample = self.samples[self.cursor % self.samples.len()];
            self.cursor += 1;
            sample
        }
    }

    struct ConstTemperature(f32);

    impl TemperatureSensor for ConstTemperature {
        fn read_celsius(&mut self) -> f32 {
            self.0
        }
    }

    struct ConstBattery(u8);

    impl BatteryMonitor for ConstBattery {
        fn level_pct(&mut self) -> u8 {
            self.0
        }
    }

    /// Shared in-memory frame queue doubling as both radio ends
    #[derive(Clone, Default)]
    struct LoopbackRadio {
        frames: Rc<RefCell<Vec<[u8; FRAME_LEN]>>>,
        fail_sends: bool,
    }

    impl RadioTransport for LoopbackRadio {
        type Error = &'static str;

        fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            if self.fail_sends {
                return Err("tx fault");
            }
            let mut stored = [0u8; FRAME_LEN];
            stored.copy_from_slice(frame);
            self.frames.borrow_mut().push(stored);
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
            let mut frames = self.frames.borrow_mut();
            if frames.is_empty() {
                return Err(nb::Error::WouldBlock);
            }
            let frame = frames.remove(0);
            buf[..FRAME_LEN].copy_from_slice(&frame);
            Ok(FRAME_LEN)
        }
    }

    #[derive(Clone, Default)]
    struct MemoryPublisher {
        records: Rc<RefCell<Vec<(String, String)>>>,
        fail: bool,
    }

    impl Publisher for MemoryPublisher {
        type Error = &'static str;

        fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error> {
            if self.fail {
                return Err("broker down");
            }
            self.records.borrow_mut().push((topic.into(), payload.into()));
            Ok(())
        }
    }

    fn sensor_pipeline(
        samples: &[f32],
        radio: LoopbackRadio,
    ) -> SensorPipeline<ScriptedDistance, ConstTemperature, ConstBattery, LoopbackRadio, FixedTime> {
        SensorPipeline::new(
            3,
            ScriptedDistance::new(samples),
            ConstTemperature(21.5),
            ConstBattery(88),
            radio,
            FixedTime::new(1000),
        )
    }

    #[test]
    fn accepted_sample_becomes_frame() {
        let radio = LoopbackRadio::default();
        let mut pipeline = sensor_pipeline(&[300.0], radio.clone());

        match pipeline.poll().unwrap() {
            SensorCycle::Sent(reading) => {
                assert_eq!(reading.device_id, 3);
                assert_eq!(reading.battery_pct, 88);
            }
            other => panic!("expected a sent frame, got {:?}", other),
        }

        assert_eq!(radio.frames.borrow().len(), 1);
        assert_eq!(pipeline.stats().frames_sent, 1);
    }

    #[test]
    fn rejected_sample_sends_nothing() {
        let radio = LoopbackRadio::default();
        let mut pipeline = sensor_pipeline(&[10.0], radio.clone());

        assert_eq!(
            pipeline.poll().unwrap(),
            SensorCycle::Rejected(RejectReason::OutOfRange)
        );
        assert!(radio.frames.borrow().is_empty());
        assert_eq!(pipeline.stats().samples_rejected, 1);
        assert_eq!(pipeline.stats().frames_sent, 0);
    }

    #[test]
    fn send_failure_is_counted_and_surfaced() {
        let radio = LoopbackRadio { fail_sends: true, ..Default::default() };
        let mut pipeline = sensor_pipeline(&[300.0], radio);

        assert_eq!(pipeline.poll(), Err("tx fault"));
        assert_eq!(pipeline.stats().send_failures, 1);
    }

    #[test]
    fn gateway_publishes_decoded_frame() {
        let radio = LoopbackRadio::default();
        let publisher = MemoryPublisher::default();
        let mut sensor = sensor_pipeline(&[300.0], radio.clone());
        let mut gateway = GatewayPipeline::new("rangelink/units", radio, publisher.clone());

        sensor.poll().unwrap();
        let reading = gateway.poll().unwrap().expect("frame pending");
        assert_eq!(reading.device_id, 3);

        let records = publisher.records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "rangelink/units");
        assert!(records[0].1.starts_with("{\"i\":\"3\","));
        assert_eq!(gateway.stats().published, 1);
    }

    #[test]
    fn gateway_idles_on_empty_radio() {
        let gateway_radio = LoopbackRadio::default();
        let mut gateway =
            GatewayPipeline::new("rangelink/units", gateway_radio, MemoryPublisher::default());

        assert_eq!(gateway.poll().unwrap(), None);
        assert_eq!(gateway.stats().frames_received, 0);
    }

    #[test]
    fn corrupted_frame_is_dropped_not_published() {
        let radio = LoopbackRadio::default();
        let publisher = MemoryPublisher::default();
        let mut sensor = sensor_pipeline(&[300.0], radio.clone());
        sensor.poll().unwrap();

        // Flip one bit inside the CRC-covered span
        radio.frames.borrow_mut()[0][3] ^= 0x40;

        let mut gateway = GatewayPipeline::new("rangelink/units", radio, publisher.clone());
        assert_eq!(gateway.poll().unwrap(), None);
        assert_eq!(gateway.stats().frames_dropped, 1);
        assert!(publisher.records.borrow().is_empty());
    }

    #[test]
    fn publish_failure_is_surfaced() {
        let radio = LoopbackRadio::default();
        let mut sensor = sensor_pipeline(&[300.0], radio.clone());
        sensor.poll().unwrap();

        let publisher = MemoryPublisher { fail: true, ..Default::default() };
        let mut gateway = GatewayPipeline::new("rangelink/units", radio, publisher);

        assert_eq!(gateway.poll(), Err(GatewayError::Publish("broker down")));
        assert_eq!(gateway.stats().publish_failures, 1);
    }
}
