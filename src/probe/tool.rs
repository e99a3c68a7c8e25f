//! The external probe tool capability.
//!
//! Everything that differs between operating systems (program names, count
//! and timeout flags, continuous mode) lives behind [`ProbeTool`]. The rest
//! of the engine only asks for a command.

use std::fmt;
use std::io;
use std::time::Duration;
use tokio::process::{Child, Command};

/// How many echoes a ping invocation sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingMode {
    /// Send exactly this many echoes, then exit.
    Bounded(u32),
    /// Run until terminated.
    Continuous,
}

/// Builds commands for the OS-level diagnostic tools.
pub trait ProbeTool: Send + Sync + fmt::Debug {
    /// Command that pings `target`, printing one line per reply.
    fn ping_command(&self, target: &str, mode: PingMode, timeout: Duration) -> Command;

    /// Command that traces the route to `target`.
    fn trace_command(&self, target: &str, max_hops: u8) -> Command;
}

/// Flag dialect of the host's ping and traceroute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    /// macOS, FreeBSD and DragonFly: `ping -W` takes milliseconds.
    Bsd,
    /// Linux and other unixes: `ping -W` takes seconds.
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(any(
            target_os = "macos",
            target_os = "freebsd",
            target_os = "dragonfly"
        )) {
            Self::Bsd
        } else {
            Self::Unix
        }
    }
}

/// The system `ping` and `traceroute`/`tracert` binaries.
#[derive(Debug, Clone)]
pub struct SystemTool {
    platform: Platform,
}

impl SystemTool {
    pub fn new() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self { platform }
    }

    /// Program and arguments for a ping invocation.
    pub fn ping_args(&self, target: &str, mode: PingMode, timeout: Duration) -> (&'static str, Vec<String>) {
        let mut args = Vec::new();
        match (self.platform, mode) {
            (Platform::Windows, PingMode::Bounded(count)) => {
                args.extend(["-n".to_string(), count.to_string()]);
                args.extend(["-w".to_string(), timeout.as_millis().max(1).to_string()]);
            }
            (Platform::Windows, PingMode::Continuous) => args.push("-t".to_string()),
            (Platform::Unix, PingMode::Bounded(count)) => {
                // -W takes whole seconds
                let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
                args.extend(["-c".to_string(), count.to_string()]);
                args.extend(["-W".to_string(), secs.to_string()]);
            }
            (Platform::Bsd, PingMode::Bounded(count)) => {
                args.extend(["-c".to_string(), count.to_string()]);
                args.extend(["-W".to_string(), timeout.as_millis().max(1).to_string()]);
            }
            (Platform::Unix | Platform::Bsd, PingMode::Continuous) => {}
        }
        args.push(target.to_string());
        ("ping", args)
    }

    /// Program and arguments for a route trace.
    pub fn trace_args(&self, target: &str, max_hops: u8) -> (&'static str, Vec<String>) {
        match self.platform {
            Platform::Windows => (
                "tracert",
                vec!["-h".to_string(), max_hops.to_string(), target.to_string()],
            ),
            Platform::Unix | Platform::Bsd => (
                "traceroute",
                vec!["-m".to_string(), max_hops.to_string(), target.to_string()],
            ),
        }
    }
}

impl Default for SystemTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeTool for SystemTool {
    fn ping_command(&self, target: &str, mode: PingMode, timeout: Duration) -> Command {
        let (program, args) = self.ping_args(target, mode, timeout);
        let mut command = Command::new(program);
        command.args(args);
        command
    }

    fn trace_command(&self, target: &str, max_hops: u8) -> Command {
        let (program, args) = self.trace_args(target, max_hops);
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

/// Ask a child process to exit (SIGTERM on unix, not SIGKILL).
///
/// A child that has already been reaped is left alone.
pub(crate) fn terminate(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };

    #[cfg(unix)]
    {
        // SAFETY: `pid` is our own child and has not been reaped yet, since
        // tokio clears the id once it collects the exit status.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        child.start_kill()
    }
}
