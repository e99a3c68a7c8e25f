//! CLI subcommand definitions and handlers.
//!
//! - `netpulse ping <host>` - Stream echo replies
//! - `netpulse trace <host>` - Trace the route to a host
//! - `netpulse lookup <name>` - Resolve names and records
//! - `netpulse subnet <network>` - Subnet facts
//! - `netpulse scan <host>` - TCP port scan
//! - `netpulse discover <network>` - Find responding hosts
//! - `netpulse bandwidth [host]` - Rate link quality
//! - `netpulse interfaces` - List local network interfaces

mod bandwidth;
mod interfaces;
mod ping;
mod resolve;
mod scan;
mod subnet;

pub use bandwidth::BandwidthCommand;
pub use interfaces::InterfacesCommand;
pub use ping::PingCommand;
pub use resolve::{LookupCommand, TraceCommand};
pub use scan::{DiscoverCommand, ScanCommand};
pub use subnet::SubnetCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::history::HistoryEntry;
use crate::output;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// NetPulse - network diagnostics from the command line.
///
/// Ping, trace, resolve, calculate subnets, scan ports, discover hosts and
/// rate link quality.
#[derive(Parser, Debug)]
#[command(name = "netpulse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Network probing and diagnostics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress and streamed output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH", env = "NETPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send echo requests to a host
    Ping(PingCommand),

    /// Trace the route to a host
    #[command(alias = "traceroute")]
    Trace(TraceCommand),

    /// Look up addresses and DNS records
    #[command(alias = "nslookup")]
    Lookup(LookupCommand),

    /// Calculate subnet information
    Subnet(SubnetCommand),

    /// Scan a host for open TCP ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Discover responding hosts in a network
    #[command(alias = "d")]
    Discover(DiscoverCommand),

    /// Estimate link quality from repeated latency samples
    Bandwidth(BandwidthCommand),

    /// List local network interfaces and their addresses
    #[command(alias = "if")]
    Interfaces(InterfacesCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// What every command handler gets to work with.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: AppSettings,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    /// Whether progress and streamed lines should be shown.
    pub fn interactive(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Plain
    }

    pub fn emit(&self, entry: &HistoryEntry) -> CliResult<()> {
        output::print_entry(entry, self.format)
    }
}

impl Cli {
    /// Settings from `--config`, or the default location.
    pub fn load_settings(&self) -> CliResult<AppSettings> {
        let settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        Ok(settings)
    }

    pub async fn execute(&self, settings: AppSettings) -> CliResult<()> {
        let ctx = Context {
            settings,
            format: self.output,
            quiet: self.quiet,
        };
        match &self.command {
            Commands::Ping(cmd) => cmd.execute(&ctx).await,
            Commands::Trace(cmd) => cmd.execute(&ctx).await,
            Commands::Lookup(cmd) => cmd.execute(&ctx).await,
            Commands::Subnet(cmd) => cmd.execute(&ctx),
            Commands::Scan(cmd) => cmd.execute(&ctx).await,
            Commands::Discover(cmd) => cmd.execute(&ctx).await,
            Commands::Bandwidth(cmd) => cmd.execute(&ctx).await,
            Commands::Interfaces(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Drive `work` to completion, running `on_interrupt` first if Ctrl-C
/// arrives while it is still going.
pub(crate) async fn until_interrupted<W, I>(work: W, on_interrupt: I) -> W::Output
where
    W: Future,
    I: Future<Output = ()>,
{
    tokio::pin!(work);
    tokio::select! {
        output = &mut work => output,
        Ok(()) = tokio::signal::ctrl_c() => {
            on_interrupt.await;
            work.await
        }
    }
}

/// Spinner shown while a command runs, hidden when not interactive.
pub(crate) fn spinner(ctx: &Context, message: impl Into<String>) -> ProgressBar {
    if !ctx.interactive() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar with a known length, hidden when not interactive.
pub(crate) fn progress_bar(ctx: &Context, len: u64) -> ProgressBar {
    if !ctx.interactive() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
