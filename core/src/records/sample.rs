use crate::math::normalize_heading;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One parsed telemetry record before it is placed in the running sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub heading_deg: f64,
    pub speed_mph: f64,
}

impl RawRecord {
    pub fn new(timestamp: NaiveDateTime, heading_deg: f64, speed_mph: f64) -> Self {
        Self {
            timestamp,
            heading_deg,
            speed_mph,
        }
    }
}

/// Indexed telemetry sample. Heading is normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: u64,
    pub timestamp: NaiveDateTime,
    pub heading_deg: f64,
    pub speed_mph: f64,
}

impl Sample {
    pub fn from_record(index: u64, record: RawRecord) -> Self {
        Self {
            index,
            timestamp: record.timestamp,
            heading_deg: normalize_heading(record.heading_deg),
            speed_mph: record.speed_mph,
        }
    }

    /// Seconds elapsed from `earlier` to this sample, fractional part included.
    pub fn seconds_since(&self, earlier: &Sample) -> f64 {
        let delta = self.timestamp - earlier.timestamp;
        match delta.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            None => delta.num_milliseconds() as f64 / 1_000.0,
        }
    }
}

/// Sample carrying the angular velocity of the window it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSample {
    pub sample: Sample,
    /// Average angular velocity of the sample's window, rad/s.
    pub angular_velocity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(second: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(8, 0, second, milli)
            .unwrap()
    }

    #[test]
    fn heading_is_normalized_on_creation() {
        let sample = Sample::from_record(3, RawRecord::new(at(0, 0), 370.0, 30.0));
        assert_eq!(sample.heading_deg, 10.0);
        let sample = Sample::from_record(4, RawRecord::new(at(0, 0), -90.0, 30.0));
        assert_eq!(sample.heading_deg, 270.0);
        let sample = Sample::from_record(5, RawRecord::new(at(0, 0), -1e-14, 30.0));
        assert_eq!(sample.heading_deg, 0.0);
    }

    #[test]
    fn seconds_since_keeps_fractions() {
        let first = Sample::from_record(0, RawRecord::new(at(1, 0), 0.0, 0.0));
        let second = Sample::from_record(1, RawRecord::new(at(3, 500), 0.0, 0.0));
        assert!((second.seconds_since(&first) - 2.5).abs() < 1e-12);
        assert!((first.seconds_since(&second) + 2.5).abs() < 1e-12);
    }
}
