use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rollguardcore::math::normalize_heading;
use rollguardcore::records::RawRecord;
use serde::{Deserialize, Serialize};

/// One leg of a synthetic drive at constant speed and yaw rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveSegment {
    pub samples: usize,
    pub speed_mph: f64,
    /// Positive turns clockwise (heading increases).
    pub heading_rate_deg_s: f64,
}

impl DriveSegment {
    pub fn new(samples: usize, speed_mph: f64, heading_rate_deg_s: f64) -> Self {
        Self {
            samples,
            speed_mph,
            heading_rate_deg_s,
        }
    }
}

/// Configuration for generating a synthetic tractor-trailer drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub start: NaiveDateTime,
    pub sample_period_secs: f64,
    pub initial_heading_deg: f64,
    pub heading_noise_deg: f64,
    pub speed_noise_mph: f64,
    pub segments: Vec<DriveSegment>,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    /// Highway cruise, a gentle bend, then an off-ramp taken too fast.
    fn default() -> Self {
        Self {
            seed: 0,
            start: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|date| date.and_hms_opt(8, 0, 0))
                .unwrap_or_default(),
            sample_period_secs: 1.0,
            initial_heading_deg: 90.0,
            heading_noise_deg: 0.2,
            speed_noise_mph: 0.5,
            segments: vec![
                DriveSegment::new(30, 62.0, 0.0),
                DriveSegment::new(20, 58.0, 1.5),
                DriveSegment::new(20, 60.0, 0.0),
                DriveSegment::new(15, 48.0, 30.0),
                DriveSegment::new(15, 25.0, 0.0),
            ],
            description: None,
        }
    }
}

impl GeneratorConfig {
    fn step(&self) -> Duration {
        Duration::milliseconds((self.sample_period_secs.max(0.001) * 1000.0).round() as i64)
    }

    pub fn sample_count(&self) -> usize {
        self.segments.iter().map(|segment| segment.samples).sum()
    }
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

pub fn build_records(config: &GeneratorConfig) -> anyhow::Result<Vec<RawRecord>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut records = Vec::with_capacity(config.sample_count());
    let step = config.step();
    let period = config.sample_period_secs.max(0.001);

    let mut timestamp = config.start;
    let mut heading = config.initial_heading_deg;

    for segment in &config.segments {
        for _ in 0..segment.samples {
            let noisy_heading =
                normalize_heading(heading + jitter(&mut rng, config.heading_noise_deg));
            let speed = (segment.speed_mph + jitter(&mut rng, config.speed_noise_mph)).max(0.0);
            records.push(RawRecord::new(timestamp, noisy_heading, speed));

            heading += segment.heading_rate_deg_s * period;
            timestamp = timestamp
                .checked_add_signed(step)
                .context("timestamp overflow while generating drive")?;
        }
    }

    Ok(records)
}

/// Renders records as compact CSV batches of `batch_len` rows.
pub fn render_batches(records: &[RawRecord], batch_len: usize) -> Vec<String> {
    records
        .chunks(batch_len.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|record| {
                    format!(
                        "{},{:.3},{:.2}\n",
                        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.heading_deg,
                        record.speed_mph
                    )
                })
                .collect()
        })
        .collect()
}

pub fn build_batches_from_config(
    config: &GeneratorConfig,
    batch_len: usize,
) -> anyhow::Result<Vec<String>> {
    let records = build_records(config)?;
    Ok(render_batches(&records, batch_len))
}
