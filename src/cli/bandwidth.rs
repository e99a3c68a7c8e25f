//! Bandwidth subcommand implementation.

use super::{progress_bar, Context};
use crate::bandwidth::BandwidthEstimator;
use crate::error::{CliError, CliResult};
use crate::history::{HistoryEntry, Operation};
use crate::probe::ProbeController;
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Estimate link quality from repeated latency samples.
#[derive(Parser, Debug)]
pub struct BandwidthCommand {
    /// Host to sample
    #[arg(value_name = "HOST", default_value = "8.8.8.8")]
    pub host: String,

    /// Test duration in seconds (defaults to the configured value)
    #[arg(short = 'd', long, value_name = "SECS")]
    pub duration: Option<u64>,
}

impl BandwidthCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let secs = self
            .duration
            .unwrap_or(ctx.settings.bandwidth_test_duration_secs);
        let estimator = BandwidthEstimator::new(Arc::new(ProbeController::new()))
            .with_window(Duration::from_secs(secs));
        let started = Instant::now();

        let pb = progress_bar(ctx, secs);
        pb.set_message(format!("Testing {}...", self.host));
        let estimate = estimator.estimate(&self.host, |progress| {
            pb.set_position(progress.elapsed.as_secs());
            if let Some(rtt) = progress.last_rtt_ms {
                pb.set_message(format!("Testing {}... last {:.1} ms", self.host, rtt));
            }
        });
        let report = tokio::select! {
            report = estimate => report,
            Ok(()) = tokio::signal::ctrl_c() => {
                pb.abandon_with_message("interrupted");
                return Err(CliError::Other("bandwidth test interrupted".to_string()));
            }
        };
        pb.finish_and_clear();
        let report = report?;

        let entry = HistoryEntry::new(
            Operation::Bandwidth,
            &report.host,
            &json!({ "duration_secs": secs }),
            &report,
            started.elapsed(),
            true,
        )?;
        ctx.emit(&entry)
    }
}
