//! Trace and lookup subcommands.

use super::{spinner, Context};
use crate::error::CliResult;
use crate::history::{HistoryEntry, Operation};
use crate::probe::{trace_route, NameResolver, SystemTool};
use clap::Parser;
use serde_json::json;
use std::time::{Duration, Instant};

/// Trace the route to a host.
#[derive(Parser, Debug)]
pub struct TraceCommand {
    /// Host name or address to trace
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Maximum number of hops (defaults to the configured value)
    #[arg(short = 'm', long)]
    pub max_hops: Option<u8>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS", default_value = "60")]
    pub timeout: u64,
}

impl TraceCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let max_hops = self.max_hops.unwrap_or(ctx.settings.trace_max_hops);
        let tool = SystemTool::new();
        let started = Instant::now();

        let pb = spinner(ctx, format!("Tracing route to {}...", self.host));
        let report = trace_route(&tool, &self.host, max_hops, Duration::from_secs(self.timeout)).await;
        pb.finish_and_clear();
        let report = report?;

        let entry = HistoryEntry::new(
            Operation::Trace,
            &report.host,
            &json!({ "max_hops": max_hops, "timeout_secs": self.timeout }),
            &report,
            started.elapsed(),
            report.success,
        )?;
        ctx.emit(&entry)
    }
}

/// Look up addresses and DNS records.
#[derive(Parser, Debug)]
pub struct LookupCommand {
    /// Domain name, or an address for a reverse lookup
    #[arg(value_name = "NAME")]
    pub query: String,

    /// Per-query timeout in milliseconds
    #[arg(short = 'W', long, value_name = "MS", default_value = "5000")]
    pub timeout: u64,
}

impl LookupCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let resolver = NameResolver::new(Duration::from_millis(self.timeout));
        let started = Instant::now();

        let pb = spinner(ctx, format!("Looking up {}...", self.query));
        let report = resolver.lookup(&self.query).await;
        pb.finish_and_clear();
        let report = report?;

        let entry = HistoryEntry::new(
            Operation::Lookup,
            &report.query,
            &json!({ "timeout_ms": self.timeout }),
            &report,
            started.elapsed(),
            !report.is_empty(),
        )?;
        ctx.emit(&entry)
    }
}
