use anyhow::Context;
use clap::Parser;
use generator::profile::build_batches_from_config;
use generator::replay::load_batches;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::{Overrides, WorkflowConfig};
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Replay tractor-trailer telemetry through the turn-risk detector")]
struct Args {
    /// Run every batch at once and append a summary to the report log
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Feed batches at the configured interval until exhausted or Ctrl+C
    #[arg(long, default_value_t = false)]
    follow: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Recorded CSV telemetry; a synthetic drive is generated when absent
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    window_size: Option<usize>,
    #[arg(long)]
    vehicle_length: Option<f64>,
    #[arg(long)]
    track_width: Option<f64>,
    #[arg(long)]
    batch_len: Option<usize>,
    #[arg(long)]
    interval_secs: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Derive the turn radius from speed over yaw rate
    #[arg(long, default_value_t = false)]
    kinematic: bool,
}

fn append_report(path: &Path, result: &WorkflowResult) -> anyhow::Result<()> {
    let metrics = serde_json::to_string(&result.metrics).context("encoding run metrics")?;
    let first = result
        .flagged
        .first()
        .map(|event| event.timestamp.to_string())
        .unwrap_or_else(|| "-".to_string());
    let report = format!("{} first_event={} metrics={}\n", result.summary(), first, metrics);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    workflow_config.apply(&Overrides {
        window_size: args.window_size,
        vehicle_length: args.vehicle_length,
        track_width: args.track_width,
        batch_len: args.batch_len,
        batch_interval_secs: args.interval_secs,
        seed: args.seed,
        kinematic: args.kinematic,
    });
    workflow_config.validate()?;

    let batches = match &args.input {
        Some(path) => load_batches(
            path,
            workflow_config.batch_len,
            workflow_config.format.has_headers,
        )?,
        None => {
            if let Some(description) = &workflow_config.generator.description {
                info!("synthetic drive: {}", description);
            }
            build_batches_from_config(&workflow_config.generator, workflow_config.batch_len)?
        }
    };
    let runner = Runner::new(workflow_config.clone());

    if args.offline || !args.follow {
        let result = runner.execute(&batches)?;
        for event in &result.flagged {
            println!(
                "{}",
                serde_json::to_string(event).context("encoding flagged event")?
            );
        }
        println!("Offline run -> {}", result.summary());
        append_report(&workflow_config.report_path, &result)?;
    }
    if args.follow {
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for batch replay")?;
        let result = runtime.block_on(runner.follow(batches))?;
        println!("Follow run -> {}", result.summary());
    }

    Ok(())
}
