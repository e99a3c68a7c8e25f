//! Ping subcommand implementation.

use super::{until_interrupted, Context};
use crate::error::{CliError, CliResult};
use crate::history::{HistoryEntry, Operation};
use crate::probe::{PingRequest, ProbeController};
use clap::Parser;
use std::time::{Duration, Instant};

/// Send echo requests to a host.
#[derive(Parser, Debug)]
pub struct PingCommand {
    /// Host name or address to ping
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Number of echo requests (defaults to the configured count)
    #[arg(short = 'c', long)]
    pub count: Option<u32>,

    /// Ping until interrupted with Ctrl-C
    #[arg(short = 't', long, conflicts_with = "count")]
    pub continuous: bool,

    /// Per-echo timeout in milliseconds
    #[arg(short = 'W', long, value_name = "MS")]
    pub timeout: Option<u64>,
}

impl PingCommand {
    pub fn request(&self, ctx: &Context) -> PingRequest {
        let request = if self.continuous {
            PingRequest::continuous(self.host.trim())
        } else {
            PingRequest::bounded(
                self.host.trim(),
                self.count.unwrap_or(ctx.settings.default_ping_count),
            )
        };
        let timeout = self
            .timeout
            .map_or_else(|| ctx.settings.ping_timeout(), Duration::from_millis);
        request.with_timeout(timeout)
    }

    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let request = self.request(ctx);
        let controller = ProbeController::new();
        let stream = ctx.interactive();
        let started = Instant::now();

        let session = controller
            .start(request.clone(), move |line| {
                if stream {
                    println!("{}", line);
                }
            })
            .await?;
        let report = until_interrupted(session.wait(), controller.stop()).await;

        let entry = HistoryEntry::new(
            Operation::Ping,
            &request.target,
            &request,
            &report,
            started.elapsed(),
            report.success,
        )?;
        ctx.emit(&entry)?;

        match report.error {
            Some(e) => Err(CliError::Probe(e)),
            None => Ok(()),
        }
    }
}
