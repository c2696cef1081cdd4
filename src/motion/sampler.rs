//! Extraction of acceleration samples from raw motion events
//!
//! Sensor events arrive at a cadence the platform controls. Each one may carry
//! linear acceleration, acceleration including gravity, both, or neither, and
//! individual axes may be missing. Incomplete events are dropped here so the
//! classifier only ever sees whole three-axis samples.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// One optional-per-axis acceleration reading as reported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl AxisReading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// All three axes, or None if any is missing
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((self.x?, self.y?, self.z?))
    }
}

/// Raw motion event from a sensor source.
///
/// Device timestamps (`timeStamp` in browser JSON) count from an origin the
/// session does not share, so they are not read; samples are stamped on arrival.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Linear acceleration (gravity removed), m/s²
    #[serde(default)]
    pub acceleration: Option<AxisReading>,

    /// Acceleration including gravity, m/s²
    #[serde(default, alias = "accelerationIncludingGravity")]
    pub acceleration_including_gravity: Option<AxisReading>,
}

impl SensorEvent {
    /// Event carrying linear acceleration only
    pub fn linear(x: f64, y: f64, z: f64) -> Self {
        Self {
            acceleration: Some(AxisReading::new(x, y, z)),
            acceleration_including_gravity: None,
        }
    }

    /// Event carrying acceleration including gravity only
    pub fn with_gravity(x: f64, y: f64, z: f64) -> Self {
        Self {
            acceleration: None,
            acceleration_including_gravity: Some(AxisReading::new(x, y, z)),
        }
    }
}

/// A complete three-axis acceleration sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Session-clock timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl AccelerationSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Sum of absolute per-axis differences
    pub fn l1_distance(&self, other: &AccelerationSample) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    /// Largest absolute axis value
    pub fn max_axis_magnitude(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Turns sensor events into acceleration samples.
///
/// Starts disarmed: until motion permission is granted every event is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MotionSampler {
    armed: bool,
}

impl MotionSampler {
    pub fn new() -> Self {
        Self { armed: false }
    }

    /// Start forwarding samples
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Stop forwarding samples
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Extract a sample from an event arriving at session time `now_ms`.
    ///
    /// Linear acceleration is preferred; when the device does not report it the
    /// gravity-inclusive reading is used instead. Missing readings or axes drop
    /// the event silently.
    pub fn sample(&self, event: &SensorEvent, now_ms: u64) -> Option<AccelerationSample> {
        if !self.armed {
            return None;
        }

        let reading = event
            .acceleration
            .or(event.acceleration_including_gravity)?;

        let Some((x, y, z)) = reading.complete() else {
            trace!("Dropping sensor event with missing axes");
            return None;
        };

        Some(AccelerationSample::new(x, y, z, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> MotionSampler {
        let mut sampler = MotionSampler::new();
        sampler.arm();
        sampler
    }

    #[test]
    fn test_disarmed_sampler_is_noop() {
        let sampler = MotionSampler::new();
        assert!(sampler.sample(&SensorEvent::linear(1.0, 2.0, 3.0), 10).is_none());
    }

    #[test]
    fn test_prefers_linear_acceleration() {
        let event = SensorEvent {
            acceleration: Some(AxisReading::new(0.1, 0.2, 0.3)),
            acceleration_including_gravity: Some(AxisReading::new(0.1, 9.9, 0.3)),
        };

        let sample = armed().sample(&event, 50).unwrap();
        assert_eq!(sample, AccelerationSample::new(0.1, 0.2, 0.3, 50));
    }

    #[test]
    fn test_falls_back_to_gravity_reading() {
        let sample = armed()
            .sample(&SensorEvent::with_gravity(0.0, 9.8, 0.0), 70)
            .unwrap();
        assert_eq!(sample.y, 9.8);
    }

    #[test]
    fn test_drops_missing_axes() {
        let event = SensorEvent {
            acceleration: Some(AxisReading {
                x: Some(1.0),
                y: None,
                z: Some(1.0),
            }),
            acceleration_including_gravity: None,
        };
        assert!(armed().sample(&event, 5).is_none());
        assert!(armed().sample(&SensorEvent::default(), 5).is_none());
    }

    #[test]
    fn test_device_timestamp_is_ignored() {
        let json = r#"{"acceleration":{"x":1.0,"y":1.0,"z":1.0},"timeStamp":300000.4}"#;
        let event: SensorEvent = serde_json::from_str(json).unwrap();
        assert_eq!(armed().sample(&event, 1234).unwrap().timestamp_ms, 1234);
    }

    #[test]
    fn test_parses_browser_style_json() {
        let json = r#"{"accelerationIncludingGravity":{"x":0.5,"y":null,"z":9.7},"timeStamp":812.6}"#;
        let event: SensorEvent = serde_json::from_str(json).unwrap();
        assert!(event.acceleration.is_none());
        assert!(event.acceleration_including_gravity.is_some());
        assert!(armed().sample(&event, 0).is_none());
    }

    #[test]
    fn test_l1_distance() {
        let a = AccelerationSample::new(0.0, 0.0, 0.0, 0);
        let b = AccelerationSample::new(1.0, -2.0, 0.5, 1);
        assert_eq!(a.l1_distance(&b), 3.5);
    }
}
