//! Scan and discover subcommand implementations.

use super::{spinner, until_interrupted, Context};
use crate::error::{CliResult, ProbeError};
use crate::history::{HistoryEntry, Operation};
use crate::output::print_warning;
use crate::scanner::{ConcurrentScanner, JobConfig, ScanResult, UNKNOWN_HOST};
use crate::services::UNKNOWN_SERVICE;
use crate::types::PortSpec;
use clap::{Args, Parser};
use serde_json::json;
use std::time::{Duration, Instant};

/// Worker pool overrides shared by `scan` and `discover`.
#[derive(Args, Debug, Clone, Default)]
pub struct PoolArgs {
    /// Maximum number of concurrent probes
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Per-probe timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Rate limit in probes per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,
}

impl PoolArgs {
    pub fn apply(&self, mut config: JobConfig) -> JobConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(Duration::from_millis(timeout));
        }
        if let Some(rate) = self.rate_limit {
            config = config.with_rate_limit(rate);
        }
        config
    }
}

/// Scan a host for open TCP ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Host name or address to scan
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,8000-9000")
    #[arg(short, long)]
    pub ports: Option<String>,

    #[command(flatten)]
    pub pool: PoolArgs,
}

impl ScanCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let config = self.pool.apply(ctx.settings.job_config());
        let ports = self
            .ports
            .clone()
            .unwrap_or_else(|| ctx.settings.default_ports.clone());
        let port_count = ports.parse::<PortSpec>().map_err(ProbeError::from)?.count();
        let scanner = ConcurrentScanner::new(config.clone())?;
        let started = Instant::now();

        let pb = spinner(ctx, format!("Scanning {} ports on {}...", port_count, self.host));
        let mut open = 0;
        let scan = scanner.scan_ports(&self.host, &ports, |outcome| {
            open += 1;
            if let Some(port) = outcome.port {
                let service = outcome.service_name.as_deref().unwrap_or(UNKNOWN_SERVICE);
                pb.println(format!("  {:>5}/tcp  open  {}", port, service));
            }
            pb.set_message(format!(
                "Scanning {} ports on {}... {} open",
                port_count, self.host, open
            ));
        });
        let result = until_interrupted(scan, async { scanner.cancel() }).await;
        pb.finish_and_clear();
        let result = result?;

        report_cancelled(&result);
        let parameters = json!({ "ports": ports, "config": config });
        emit_scan(ctx, Operation::PortScan, &parameters, &result, started.elapsed())
    }
}

/// Discover responding hosts in a network.
#[derive(Parser, Debug)]
pub struct DiscoverCommand {
    /// Network in CIDR or mask form
    #[arg(value_name = "NETWORK")]
    pub network: String,

    #[command(flatten)]
    pub pool: PoolArgs,
}

impl DiscoverCommand {
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let config = self.pool.apply(ctx.settings.discovery_config());
        let scanner = ConcurrentScanner::new(config.clone())?;
        let started = Instant::now();

        let pb = spinner(ctx, format!("Discovering hosts in {}...", self.network));
        let mut found = 0;
        let scan = scanner.discover_hosts(&self.network, |outcome| {
            found += 1;
            let name = outcome.hostname.as_deref().unwrap_or(UNKNOWN_HOST);
            pb.println(format!("  {:<15}  {}", outcome.target, name));
            pb.set_message(format!("Discovering hosts in {}... {} up", self.network, found));
        });
        let result = until_interrupted(scan, async { scanner.cancel() }).await;
        pb.finish_and_clear();
        let result = result?;

        report_cancelled(&result);
        let parameters = json!({ "network": self.network, "config": config });
        emit_scan(ctx, Operation::Discovery, &parameters, &result, started.elapsed())
    }
}

fn report_cancelled(result: &ScanResult) {
    if result.cancelled {
        print_warning(&format!(
            "cancelled after {} of {} probes",
            result.attempted, result.submitted
        ));
    }
}

fn emit_scan(
    ctx: &Context,
    operation: Operation,
    parameters: &serde_json::Value,
    result: &ScanResult,
    elapsed: Duration,
) -> CliResult<()> {
    let entry = HistoryEntry::new(
        operation,
        &result.target,
        parameters,
        result,
        elapsed,
        result.is_complete(),
    )?
    .with_id(result.job_id);
    ctx.emit(&entry)
}
