//! Single-target diagnostic probes.
//!
//! [`ProbeController`] owns at most one streaming ping at a time. Starting a
//! new ping supersedes the previous one: the old session is cancelled and
//! its process reaped before the new process is spawned, all under one
//! async mutex, so no caller ever observes two live sessions or a
//! half-replaced slot.
//!
//! Hop tracing lives in [`trace`], name resolution in [`lookup`], the local
//! interface listing in [`interfaces`].

pub mod interfaces;
pub mod lookup;
pub mod parse;
pub mod trace;
pub mod tool;

use crate::error::{ProbeError, ProbeResult};
use crate::types::Target;
use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use interfaces::{list_interfaces, InterfaceAddress, InterfaceInfo};
pub use lookup::{HostResolver, LookupReport, NameResolver};
pub use parse::{parse_rtt, PingStats};
pub use tool::{PingMode, Platform, ProbeTool, SystemTool};
pub use trace::{trace_route, Hop, TraceReport};

/// Per-echo timeout used when the caller does not choose one.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_secs(1);

/// Gap the system ping leaves between echoes.
const ECHO_INTERVAL: Duration = Duration::from_secs(1);

/// Slack on top of computed budgets for process start-up and exit.
const GRACE: Duration = Duration::from_secs(1);

/// How long to wait for stderr after the child exits.
const STDERR_WAIT: Duration = Duration::from_millis(500);

/// How long a terminated ping may take to exit before it is killed.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// What to ping and for how long.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingRequest {
    pub target: String,
    pub count: u32,
    pub continuous: bool,
    #[serde(with = "crate::types::duration_ms")]
    pub timeout: Duration,
}

impl PingRequest {
    /// Send `count` echoes and finish.
    pub fn bounded(target: impl Into<String>, count: u32) -> Self {
        Self {
            target: target.into(),
            count,
            continuous: false,
            timeout: DEFAULT_ECHO_TIMEOUT,
        }
    }

    /// Ping until stopped.
    pub fn continuous(target: impl Into<String>) -> Self {
        Self {
            continuous: true,
            ..Self::bounded(target, 0)
        }
    }

    /// Set the per-echo timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> PingMode {
        if self.continuous {
            PingMode::Continuous
        } else {
            PingMode::Bounded(self.count)
        }
    }

    /// Reject requests that cannot produce a meaningful session.
    pub fn validate(&self) -> ProbeResult<()> {
        Target::host(&self.target)?;
        if !self.continuous && self.count == 0 {
            return Err(ProbeError::InvalidInput(
                "echo count must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidInput(
                "echo timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Overall budget of a bounded run; continuous runs have none.
    fn deadline(&self) -> Option<Duration> {
        (!self.continuous).then(|| ECHO_INTERVAL * self.count + self.timeout + GRACE)
    }
}

/// Final result of one ping session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingReport {
    pub host: String,
    pub success: bool,
    pub continuous: bool,
    /// The session ended because it was stopped or superseded.
    pub stopped: bool,
    pub statistics: PingStats,
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl PingReport {
    fn failed(request: &PingRequest, error: ProbeError) -> Self {
        Self {
            host: request.target.clone(),
            success: false,
            continuous: request.continuous,
            stopped: false,
            statistics: PingStats::default(),
            output: Vec::new(),
            error: Some(error),
        }
    }
}

/// Callback receiving each output line as it arrives.
pub type LineHandler = Box<dyn FnMut(&str) + Send>;

/// A running ping.
///
/// The background reader task owns the child process. Dropping the session
/// does not stop the ping; use [`ProbeController::stop`] or [`Self::wait`].
#[derive(Debug)]
pub struct PingSession {
    id: u64,
    request: PingRequest,
    stats: Arc<Mutex<PingStats>>,
    task: JoinHandle<PingReport>,
}

impl PingSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.request.target
    }

    /// Snapshot of the statistics gathered so far.
    pub fn stats(&self) -> PingStats {
        lock(&self.stats).clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end and collect its report.
    pub async fn wait(self) -> PingReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                let error = ProbeError::ExternalTool(format!("ping reader task failed: {}", e));
                PingReport::failed(&self.request, error)
            }
        }
    }
}

/// The controller's handle on the current session.
struct ActiveSlot {
    id: u64,
    cancel: CancellationToken,
    released: watch::Receiver<bool>,
}

impl ActiveSlot {
    /// Cancel the session and wait until its process has been reaped.
    async fn release(mut self) {
        self.cancel.cancel();
        // A dropped sender means the reader is gone and its child was killed on drop.
        let _ = self.released.wait_for(|released| *released).await;
        debug!(session = self.id, "ping session released");
    }
}

/// Runs one reachability probe at a time against one target.
pub struct ProbeController {
    tool: Arc<dyn ProbeTool>,
    active: tokio::sync::Mutex<Option<ActiveSlot>>,
    next_id: AtomicU64,
}

impl ProbeController {
    /// Controller backed by the system ping.
    pub fn new() -> Self {
        Self::with_tool(Arc::new(SystemTool::new()))
    }

    pub fn with_tool(tool: Arc<dyn ProbeTool>) -> Self {
        Self {
            tool,
            active: tokio::sync::Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn tool(&self) -> Arc<dyn ProbeTool> {
        Arc::clone(&self.tool)
    }

    /// Start a ping, superseding any session still running.
    pub async fn start<F>(&self, request: PingRequest, on_line: F) -> ProbeResult<PingSession>
    where
        F: FnMut(&str) + Send + 'static,
    {
        request.validate()?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(session = previous.id, "superseding active ping session");
            previous.release().await;
        }

        let mut command = self
            .tool
            .ping_command(&request.target, request.mode(), request.timeout);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = command
            .spawn()
            .map_err(|e| ProbeError::ExternalTool(format!("failed to start ping: {}", e)))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let stats = Arc::new(Mutex::new(PingStats::default()));
        let (released_tx, released_rx) = watch::channel(false);

        info!(
            session = id,
            target_host = %request.target,
            continuous = request.continuous,
            count = request.count,
            "ping session started"
        );

        let task = tokio::spawn(drive_session(
            child,
            request.clone(),
            cancel.clone(),
            Arc::clone(&stats),
            Box::new(on_line),
            released_tx,
        ));

        *active = Some(ActiveSlot {
            id,
            cancel,
            released: released_rx,
        });

        Ok(PingSession {
            id,
            request,
            stats,
            task,
        })
    }

    /// Terminate the active session, if any, and wait for its process to exit.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(slot) = active.take() {
            slot.release().await;
        }
    }

    /// Whether a session is currently running.
    pub async fn is_active(&self) -> bool {
        let active = self.active.lock().await;
        active.as_ref().is_some_and(|slot| !*slot.released.borrow())
    }

    /// Start a ping and wait for its report.
    ///
    /// Start-up failures are folded into the report as `success: false`.
    pub async fn ping<F>(&self, request: PingRequest, on_line: F) -> PingReport
    where
        F: FnMut(&str) + Send + 'static,
    {
        match self.start(request.clone(), on_line).await {
            Ok(session) => session.wait().await,
            Err(e) => PingReport::failed(&request, e),
        }
    }
}

impl Default for ProbeController {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a single bounded echo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EchoReply {
    pub reachable: bool,
    pub rtt_ms: Option<f64>,
}

/// Send one echo to `target` and wait at most `timeout` plus a grace period.
pub async fn echo_once(tool: &dyn ProbeTool, target: &str, timeout: Duration) -> ProbeResult<EchoReply> {
    let mut command = tool.ping_command(target, PingMode::Bounded(1), timeout);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let budget = timeout + GRACE;
    let output = tokio::time::timeout(budget, command.output())
        .await
        .map_err(|_| ProbeError::timeout(budget))?
        .map_err(|e| ProbeError::ExternalTool(format!("failed to run ping: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let rtt_ms = stdout.lines().find_map(parse_rtt);
    match output.status.code() {
        // Windows ping exits 0 on "destination host unreachable" replies.
        Some(0) => Ok(EchoReply {
            reachable: rtt_ms.is_some() || !stdout.to_ascii_lowercase().contains("unreachable"),
            rtt_ms,
        }),
        Some(1) => Ok(EchoReply {
            reachable: false,
            rtt_ms: None,
        }),
        _ => Err(ProbeError::ExternalTool(format!(
            "ping exited with {}",
            output.status
        ))),
    }
}

fn lock(stats: &Mutex<PingStats>) -> MutexGuard<'_, PingStats> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn read_to_end<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut text = String::new();
    let _ = reader.read_to_string(&mut text).await;
    text
}

/// Exit codes 0 (replies) and 1 (no replies) are ordinary ping results.
fn exited_normally(status: ExitStatus) -> bool {
    matches!(status.code(), Some(0) | Some(1))
}

/// SIGTERM the child, then SIGKILL it if it is still running after
/// [`TERM_GRACE`].
async fn terminate_and_reap(child: &mut Child, target: &str) -> std::io::Result<ExitStatus> {
    if let Err(e) = tool::terminate(child) {
        warn!(target_host = %target, error = %e, "failed to terminate ping");
    }
    match tokio::time::timeout(TERM_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(target_host = %target, "ping ignored termination, killing it");
            child.start_kill()?;
            child.wait().await
        }
    }
}

async fn drive_session(
    mut child: Child,
    request: PingRequest,
    cancel: CancellationToken,
    stats: Arc<Mutex<PingStats>>,
    mut on_line: LineHandler,
    released: watch::Sender<bool>,
) -> PingReport {
    let mut output = Vec::new();
    let mut stopped = false;
    let mut failure: Option<ProbeError> = None;

    let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(read_to_end(stderr)));

    let deadline = request.deadline();
    let expired = async move {
        match deadline {
            Some(budget) => tokio::time::sleep(budget).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expired);

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    stopped = true;
                    break;
                }
                _ = &mut expired => {
                    failure = deadline.map(ProbeError::timeout);
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let line = line.trim_end();
                        if line.is_empty() {
                            continue;
                        }
                        let rtt = lock(&stats).observe_line(line);
                        trace!(target_host = %request.target, ?rtt, "{}", line);
                        on_line(line);
                        output.push(line.to_string());
                    }
                    Ok(None) => break,
                    Err(e) => {
                        failure = Some(ProbeError::ExternalTool(format!("failed to read ping output: {}", e)));
                        break;
                    }
                },
            }
        }
    }

    let status = if stopped || failure.is_some() {
        terminate_and_reap(&mut child, &request.target).await
    } else {
        child.wait().await
    };
    let _ = released.send(true);

    let stderr = match stderr_task {
        Some(task) => tokio::time::timeout(STDERR_WAIT, task)
            .await
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default(),
        None => String::new(),
    };

    match status {
        Err(e) => {
            failure.get_or_insert(ProbeError::ExternalTool(format!("failed to wait for ping: {}", e)));
        }
        Ok(status) if !stopped && failure.is_none() && !exited_normally(status) => {
            let detail = stderr.trim();
            let reason = if detail.is_empty() {
                format!("ping exited with {}", status)
            } else {
                format!("ping exited with {}: {}", status, detail)
            };
            failure = Some(ProbeError::ExternalTool(reason));
        }
        Ok(_) => {}
    }

    let statistics = {
        let mut stats = lock(&stats);
        if !request.continuous {
            let fallback = (!stopped && failure.is_none()).then_some(request.count);
            stats.finalize_bounded(fallback);
        }
        stats.clone()
    };

    info!(
        target_host = %request.target,
        received = statistics.received,
        stopped,
        success = failure.is_none(),
        "ping session finished"
    );

    PingReport {
        host: request.target,
        success: failure.is_none(),
        continuous: request.continuous,
        stopped,
        statistics,
        output,
        error: failure,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tokio::process::Command;

    /// Runs a shell script in place of the real ping.
    #[derive(Debug)]
    struct ScriptTool(&'static str);

    impl ProbeTool for ScriptTool {
        fn ping_command(&self, _target: &str, _mode: PingMode, _timeout: Duration) -> Command {
            let mut command = Command::new("sh");
            command.arg("-c").arg(self.0);
            command
        }

        fn trace_command(&self, _target: &str, _max_hops: u8) -> Command {
            let mut command = Command::new("sh");
            command.arg("-c").arg(self.0);
            command
        }
    }

    #[derive(Debug)]
    struct MissingTool;

    impl ProbeTool for MissingTool {
        fn ping_command(&self, _target: &str, _mode: PingMode, _timeout: Duration) -> Command {
            Command::new("/nonexistent/netpulse-ping")
        }

        fn trace_command(&self, _target: &str, _max_hops: u8) -> Command {
            Command::new("/nonexistent/netpulse-trace")
        }
    }

    const REPLIES: &str = "echo 'PING 127.0.0.1 (127.0.0.1) 56(84) bytes of data.'; \
        echo '64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=23.4 ms'; \
        echo '64 bytes from 127.0.0.1: icmp_seq=2 ttl=64 time=10.0 ms'; \
        echo '64 bytes from 127.0.0.1: icmp_seq=3 ttl=64 time=31.5 ms'; \
        echo ''; \
        echo '3 packets transmitted, 3 received, 0% packet loss, time 2003ms'";

    const FOREVER: &str = "while true; do echo '64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=1.5 ms'; sleep 0.05; done";

    fn controller(script: &'static str) -> ProbeController {
        ProbeController::with_tool(Arc::new(ScriptTool(script)))
    }

    async fn wait_for_first_line(session: &PingSession) {
        for _ in 0..200 {
            if session.stats().received > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no output from ping session");
    }

    #[tokio::test]
    async fn test_bounded_ping_streams_lines_in_order() {
        let controller = controller(REPLIES);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let report = controller
            .ping(PingRequest::bounded("127.0.0.1", 3), move |line| {
                sink.lock().unwrap().push(line.to_string());
            })
            .await;

        assert!(report.success, "{:?}", report.error);
        assert!(!report.stopped);
        assert_eq!(report.output.len(), 5);
        assert_eq!(*seen.lock().unwrap(), report.output);
        assert!(report.output[1].contains("time=23.4"));

        let stats = &report.statistics;
        assert_eq!(stats.received, 3);
        assert_eq!(stats.min_ms, Some(10.0));
        assert_eq!(stats.max_ms, Some(31.5));
        assert_eq!(stats.sent, Some(3));
        assert_eq!(stats.lost, Some(0));
        assert_eq!(stats.loss_percent, Some(0.0));
    }

    #[tokio::test]
    async fn test_partial_loss_is_not_a_failure() {
        let controller = controller(
            "echo 'time=4.0 ms'; echo 'time=6.0 ms'; \
             echo '4 packets transmitted, 2 received, 50% packet loss'; exit 1",
        );
        let report = controller
            .ping(PingRequest::bounded("127.0.0.1", 4), |_| {})
            .await;

        assert!(report.success);
        assert_eq!(report.statistics.lost, Some(2));
        assert_eq!(report.statistics.loss_percent, Some(50.0));
    }

    #[tokio::test]
    async fn test_abnormal_exit_keeps_partial_output() {
        let controller = controller("echo 'ping: cannot resolve nowhere.invalid'; echo 'bad' >&2; exit 2");
        let report = controller
            .ping(PingRequest::bounded("nowhere.invalid", 4), |_| {})
            .await;

        assert!(!report.success);
        let error = report.error.unwrap();
        assert_eq!(error.kind(), ErrorKind::ExternalTool);
        assert!(error.to_string().contains("bad"));
        assert_eq!(report.output, vec!["ping: cannot resolve nowhere.invalid"]);
        assert_eq!(report.statistics.sent, None);
        assert_eq!(report.statistics.loss_percent, None);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let controller = ProbeController::with_tool(Arc::new(MissingTool));
        let report = controller
            .ping(PingRequest::bounded("127.0.0.1", 1), |_| {})
            .await;
        assert!(!report.success);
        assert_eq!(report.error.unwrap().kind(), ErrorKind::ExternalTool);
        assert!(!controller.is_active().await);
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let controller = controller(REPLIES);
        let err = controller
            .start(PingRequest::bounded("", 4), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = controller
            .start(PingRequest::bounded("127.0.0.1", 0), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = controller
            .start(
                PingRequest::bounded("127.0.0.1", 1).with_timeout(Duration::ZERO),
                |_| {},
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_stop_ends_continuous_session() {
        let controller = controller(FOREVER);
        let session = controller
            .start(PingRequest::continuous("127.0.0.1"), |_| {})
            .await
            .unwrap();
        wait_for_first_line(&session).await;
        assert!(controller.is_active().await);

        controller.stop().await;
        assert!(!controller.is_active().await);
        controller.stop().await;

        let report = session.wait().await;
        assert!(report.stopped);
        assert!(report.success);
        assert!(report.continuous);
        assert!(report.statistics.received > 0);
        assert_eq!(report.statistics.sent, None);
        assert_eq!(report.statistics.loss_percent, None);
    }

    #[tokio::test]
    async fn test_stop_kills_process_ignoring_termination() {
        let controller = controller(
            "trap '' TERM; echo '64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=2.0 ms'; exec sleep 30",
        );
        let session = controller
            .start(PingRequest::continuous("127.0.0.1"), |_| {})
            .await
            .unwrap();
        wait_for_first_line(&session).await;

        tokio::time::timeout(TERM_GRACE + Duration::from_secs(3), controller.stop())
            .await
            .expect("stop should not hang on a process that ignores SIGTERM");
        assert!(!controller.is_active().await);

        let report = session.wait().await;
        assert!(report.stopped);
        assert_eq!(report.statistics.received, 1);
    }

    #[tokio::test]
    async fn test_stop_without_session_is_noop() {
        let controller = controller(REPLIES);
        controller.stop().await;
        controller.stop().await;
        assert!(!controller.is_active().await);
    }

    #[tokio::test]
    async fn test_new_start_supersedes_previous_session() {
        let controller = controller(FOREVER);
        let first = controller
            .start(PingRequest::continuous("127.0.0.1"), |_| {})
            .await
            .unwrap();
        wait_for_first_line(&first).await;

        let second = controller
            .start(PingRequest::continuous("127.0.0.1"), |_| {})
            .await
            .unwrap();
        assert_ne!(first.id(), second.id());

        let first_report = first.wait().await;
        assert!(first_report.stopped);

        controller.stop().await;
        let second_report = second.wait().await;
        assert!(second_report.stopped);
    }

    #[tokio::test]
    async fn test_echo_once() {
        let tool = ScriptTool("echo '64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=0.5 ms'");
        let reply = echo_once(&tool, "127.0.0.1", Duration::from_secs(1)).await.unwrap();
        assert!(reply.reachable);
        assert_eq!(reply.rtt_ms, Some(0.5));

        let tool = ScriptTool("exit 1");
        let reply = echo_once(&tool, "127.0.0.1", Duration::from_secs(1)).await.unwrap();
        assert!(!reply.reachable);

        let tool = ScriptTool("exit 2");
        let err = echo_once(&tool, "127.0.0.1", Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
    }

    #[tokio::test]
    async fn test_echo_once_times_out() {
        let tool = ScriptTool("sleep 5");
        let err = echo_once(&tool, "127.0.0.1", Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }
}
