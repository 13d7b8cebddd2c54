use crate::prelude::{StageError, StageResult};
use crate::processing::window::WindowAggregate;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-sample verdict emitted by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub sample_index: u64,
    pub timestamp: NaiveDateTime,
    pub angular_velocity: f64,
    /// `+inf` while driving straight, written as `null` in JSON.
    #[serde(with = "unbounded")]
    pub radius_m: f64,
    #[serde(with = "unbounded")]
    pub critical_speed_mph: f64,
    pub actual_speed_mph: f64,
    pub flagged: bool,
}

/// JSON has no infinity: unbounded values travel as `null` and come back as
/// `+inf`.
mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Results produced by one batch, in sample order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub results: Vec<DetectionResult>,
    pub windows: Vec<WindowAggregate>,
}

impl DetectionReport {
    pub fn new(results: Vec<DetectionResult>, windows: Vec<WindowAggregate>) -> Self {
        Self { results, windows }
    }

    pub fn flagged(&self) -> impl Iterator<Item = &DetectionResult> + '_ {
        self.results.iter().filter(|result| result.flagged)
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged().count()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// One JSON object per flagged result, newline separated.
    pub fn flagged_json_lines(&self) -> StageResult<String> {
        let mut out = String::new();
        for result in self.flagged() {
            let line = serde_json::to_string(result)
                .map_err(|err| StageError::Internal(format!("encoding result: {}", err)))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn result(index: u64, flagged: bool) -> DetectionResult {
        DetectionResult {
            sample_index: index,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, index as u32)
                .unwrap(),
            angular_velocity: 0.2,
            radius_m: 50.0,
            critical_speed_mph: 55.0,
            actual_speed_mph: if flagged { 60.0 } else { 20.0 },
            flagged,
        }
    }

    #[test]
    fn report_filters_flagged_results() {
        let report = DetectionReport::new(vec![result(0, false), result(1, true)], Vec::new());
        assert_eq!(report.flagged_count(), 1);
        assert_eq!(report.flagged().next().unwrap().sample_index, 1);
    }

    #[test]
    fn flagged_results_render_as_json_lines() {
        let report = DetectionReport::new(
            vec![result(0, true), result(1, false), result(2, true)],
            Vec::new(),
        );
        let lines = report.flagged_json_lines().unwrap();
        let parsed: Vec<serde_json::Value> = lines
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["sample_index"], 2);
        assert_eq!(parsed[0]["timestamp"], "2024-03-01T08:00:00");
    }

    #[test]
    fn straight_line_results_survive_json() {
        let straight = DetectionResult {
            radius_m: f64::INFINITY,
            critical_speed_mph: f64::INFINITY,
            ..result(4, false)
        };
        let line = serde_json::to_string(&straight).unwrap();
        assert!(line.contains("\"radius_m\":null"));

        let parsed: DetectionResult = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, straight);
        let finite: DetectionResult =
            serde_json::from_str(&serde_json::to_string(&result(2, true)).unwrap()).unwrap();
        assert_eq!(finite.radius_m, 50.0);
    }
}
