//! CSV batch parsing.
//!
//! A batch is the text of one ~10 s telemetry delivery. Either every record
//! parses or the whole batch is rejected.

use crate::prelude::{StageError, StageResult};
use crate::records::sample::RawRecord;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Column layout of the incoming CSV records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// `timestamp,heading_deg,speed_mph`
    #[default]
    Compact,
    /// `timestamp,latitude,longitude,direction,vehicle_motion_status,speed_mph,acceleration`
    Full,
}

impl RecordLayout {
    fn columns(self) -> usize {
        match self {
            RecordLayout::Compact => 3,
            RecordLayout::Full => 7,
        }
    }

    /// Positions of timestamp, heading and speed.
    fn positions(self) -> (usize, usize, usize) {
        match self {
            RecordLayout::Compact => (0, 1, 2),
            RecordLayout::Full => (0, 3, 5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchFormat {
    pub layout: RecordLayout,
    pub has_headers: bool,
}

/// Parses one batch of CSV text into records, rejecting it on the first bad row.
pub fn parse_batch(text: &str, format: &BatchFormat) -> StageResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(format.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let expected = format.layout.columns();
    let (ts_col, heading_col, speed_col) = format.layout.positions();
    let mut records = Vec::new();

    for (position, row) in reader.records().enumerate() {
        let malformed = |reason: String| StageError::MalformedBatch {
            record: position,
            reason,
        };

        let row = row.map_err(|err| malformed(err.to_string()))?;
        if row.len() != expected {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                expected,
                row.len()
            )));
        }

        let timestamp = parse_timestamp(&row[ts_col]).map_err(malformed)?;
        let heading_deg = parse_number("heading", &row[heading_col]).map_err(malformed)?;
        let speed_mph = parse_number("speed", &row[speed_col]).map_err(malformed)?;
        if speed_mph < 0.0 {
            return Err(malformed(format!("negative speed {}", speed_mph)));
        }

        records.push(RawRecord::new(timestamp, heading_deg, speed_mph));
    }

    Ok(records)
}

/// Accepts `YYYY-MM-DD HH:MM:SS[.frac]`, the `T`-separated variant and RFC 3339.
/// Offsets are folded into UTC.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    for format in NAIVE_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(timestamp);
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.naive_utc())
        .map_err(|err| format!("bad timestamp {:?}: {}", raw, err))
}

fn parse_number(field: &str, raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{} {:?} is not numeric", field, raw))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{} {:?} is not finite", field, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_compact_records() {
        let text = "2024-03-01 08:00:00,90.0,45.5\n2024-03-01 08:00:01.250,91.5,46\n";
        let records = parse_batch(text, &BatchFormat::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].heading_deg, 90.0);
        assert_eq!(records[1].speed_mph, 46.0);
        assert_eq!(records[1].timestamp.nanosecond(), 250_000_000);
    }

    #[test]
    fn parses_full_gps_layout_with_header() {
        let format = BatchFormat {
            layout: RecordLayout::Full,
            has_headers: true,
        };
        let text = "timestamp,latitude,longitude,direction,vehicle_motion_status,speed_mph,acceleration_from_gps_speed\n\
                    2024-03-01T08:00:00,41.88,-87.63,182.0,moving,52.0,0.1\n";
        let records = parse_batch(text, &format).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].heading_deg, 182.0);
        assert_eq!(records[0].speed_mph, 52.0);
    }

    #[test]
    fn rfc3339_offsets_fold_into_utc() {
        let timestamp = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(timestamp.hour(), 8);
    }

    #[test]
    fn empty_batch_has_no_records() {
        assert!(parse_batch("", &BatchFormat::default()).unwrap().is_empty());
    }

    #[test]
    fn non_numeric_speed_names_the_record() {
        let text = "2024-03-01 08:00:00,90,45\n2024-03-01 08:00:01,90,fast\n";
        match parse_batch(text, &BatchFormat::default()) {
            Err(StageError::MalformedBatch { record, .. }) => assert_eq!(record, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_timestamp_and_short_rows_are_rejected() {
        assert!(parse_batch("yesterday,90,45\n", &BatchFormat::default()).is_err());
        assert!(parse_batch("2024-03-01 08:00:00,90\n", &BatchFormat::default()).is_err());
        assert!(parse_batch("2024-03-01 08:00:00,90,-3\n", &BatchFormat::default()).is_err());
        assert!(parse_batch("2024-03-01 08:00:00,NaN,3\n", &BatchFormat::default()).is_err());
    }
}
