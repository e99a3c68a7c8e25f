//! Concurrent probing of many targets.
//!
//! A scan job hands its targets to a fixed pool of worker tasks pulling
//! from one shared queue. Workers send outcomes over a channel to a single
//! aggregator, which owns the [`ScanResult`] and invokes the caller's
//! callback for every reachable outcome. Cancellation is cooperative:
//! workers check the job's token before taking a target and again right
//! before probing it; probes already in flight run to their timeout. A job
//! takes its token before any name resolution, so a cancel issued while the
//! host is still resolving stops the job too.

pub mod discovery;
pub mod rate_limiter;
pub mod tcp;
pub mod traits;

use crate::error::{ProbeError, ProbeResult};
use crate::probe::{HostResolver, NameResolver, ProbeTool, SystemTool};
use crate::subnet;
use crate::types::{JobId, PortSpec, Target};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use discovery::{HostProber, UNKNOWN_HOST};
pub use rate_limiter::RateLimiter;
pub use tcp::TcpProber;
pub use traits::{ProbeOutcome, Prober};

/// Largest address block `discover_hosts` accepts (a /16).
pub const MAX_DISCOVERY_HOSTS: u64 = 65_536;

/// Settings shared by every probe of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobConfig {
    /// Per-probe timeout.
    #[serde(rename = "timeout_ms", with = "crate::types::duration_ms")]
    pub timeout: Duration,
    /// Number of worker tasks.
    pub concurrency: usize,
    /// Probes per second across all workers, 0 for unlimited.
    pub rate_limit: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            concurrency: 50,
            rate_limit: 0,
        }
    }
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn validate(&self) -> ProbeResult<()> {
        if self.concurrency == 0 {
            return Err(ProbeError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidInput(
                "probe timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregate of one scan job.
///
/// `succeeded + failed == attempted <= submitted` always holds; without
/// cancellation every submitted target is attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub job_id: JobId,
    pub target: String,
    pub submitted: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
    /// Outcomes in submission order.
    pub outcomes: Vec<ProbeOutcome>,
}

impl ScanResult {
    /// Outcomes of targets that answered.
    pub fn reachable(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.reachable)
    }

    /// Ports found open, in ascending order.
    pub fn open_ports(&self) -> Vec<u16> {
        self.reachable().filter_map(|o| o.port).collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.attempted == self.submitted
    }
}

/// Collects outcomes as they arrive. Owned by the aggregator alone.
struct ResultBuilder {
    job_id: JobId,
    target: String,
    submitted: usize,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<(usize, ProbeOutcome)>,
    started: Instant,
}

impl ResultBuilder {
    fn new(job_id: JobId, target: &str, submitted: usize) -> Self {
        Self {
            job_id,
            target: target.to_string(),
            submitted,
            succeeded: 0,
            failed: 0,
            outcomes: Vec::new(),
            started: Instant::now(),
        }
    }

    fn push(&mut self, index: usize, outcome: ProbeOutcome) {
        if outcome.reachable {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push((index, outcome));
    }

    fn finish(mut self, cancelled: bool) -> ScanResult {
        self.outcomes.sort_by_key(|(index, _)| *index);
        ScanResult {
            job_id: self.job_id,
            target: self.target,
            submitted: self.submitted,
            attempted: self.outcomes.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            cancelled,
            duration_ms: self.started.elapsed().as_millis() as u64,
            outcomes: self.outcomes.into_iter().map(|(_, o)| o).collect(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs port scans and host discovery with bounded concurrency.
#[derive(Debug)]
pub struct ConcurrentScanner {
    config: JobConfig,
    tool: Arc<dyn ProbeTool>,
    resolver: Arc<dyn HostResolver>,
    cancel: Mutex<CancellationToken>,
}

impl ConcurrentScanner {
    /// Scanner using the system ping and resolver.
    pub fn new(config: JobConfig) -> ProbeResult<Self> {
        Self::with_tool(config, Arc::new(SystemTool::new()))
    }

    pub fn with_tool(config: JobConfig, tool: Arc<dyn ProbeTool>) -> ProbeResult<Self> {
        config.validate()?;
        let resolver = Arc::new(NameResolver::new(config.timeout));
        Ok(Self {
            config,
            tool,
            resolver,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Replace the DNS resolver used for scan targets and responder names.
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Stop every job currently running on this scanner.
    ///
    /// Jobs started afterwards are unaffected. Safe to call from any
    /// thread, any number of times, with or without a running job.
    pub fn cancel(&self) {
        let mut token = lock(&self.cancel);
        token.cancel();
        *token = CancellationToken::new();
        debug!("scanner cancelled");
    }

    fn job_token(&self) -> CancellationToken {
        lock(&self.cancel).child_token()
    }

    /// Connect-scan `ports` of `host`.
    ///
    /// `ports` takes `"start-end"`, a comma list, or both mixed. `on_open`
    /// sees each open port as soon as it is found.
    pub async fn scan_ports<F>(&self, host: &str, ports: &str, on_open: F) -> ProbeResult<ScanResult>
    where
        F: FnMut(&ProbeOutcome) + Send,
    {
        let token = self.job_token();
        let spec: PortSpec = ports.parse()?;
        let host = Target::host(host)?;
        let ports: Vec<u16> = spec.to_ports().into_iter().map(|p| p.as_u16()).collect();

        let ip = tokio::select! {
            _ = token.cancelled() => {
                debug!(%host, "scan cancelled while resolving");
                return Ok(ResultBuilder::new(JobId::new(), &host, ports.len()).finish(true));
            }
            ip = self.resolver.resolve_host(&host) => ip?,
        };
        debug!(%host, %ip, ports = ports.len(), "resolved scan target");

        let prober = Arc::new(TcpProber::new(ip, self.config.timeout));
        Ok(self.run_with_token(token, &host, ports, prober, on_open).await)
    }

    /// Find responding hosts in `network`.
    ///
    /// Accepts anything the subnet calculator does. Responders carry their
    /// reverse name, or `"unknown"`.
    pub async fn discover_hosts<F>(&self, network: &str, on_found: F) -> ProbeResult<ScanResult>
    where
        F: FnMut(&ProbeOutcome) + Send,
    {
        let token = self.job_token();
        let info = subnet::parse(network)?;
        if info.usable_host_count > MAX_DISCOVERY_HOSTS {
            return Err(ProbeError::InvalidInput(format!(
                "{} has {} hosts, at most {} can be discovered at once",
                info.cidr_notation, info.usable_host_count, MAX_DISCOVERY_HOSTS
            )));
        }

        let hosts: Vec<_> = info.hosts().collect();
        let prober = Arc::new(HostProber::new(
            Arc::clone(&self.tool),
            Arc::clone(&self.resolver),
            self.config.timeout,
        ));
        Ok(self
            .run_with_token(token, &info.cidr_notation, hosts, prober, on_found)
            .await)
    }

    /// Probe every target with `prober` on the worker pool.
    pub async fn run_job<T, P, F>(
        &self,
        label: &str,
        targets: Vec<T>,
        prober: Arc<P>,
        on_found: F,
    ) -> ScanResult
    where
        T: Send + 'static,
        P: Prober<T> + 'static,
        F: FnMut(&ProbeOutcome) + Send,
    {
        let token = self.job_token();
        self.run_with_token(token, label, targets, prober, on_found).await
    }

    async fn run_with_token<T, P, F>(
        &self,
        token: CancellationToken,
        label: &str,
        targets: Vec<T>,
        prober: Arc<P>,
        mut on_found: F,
    ) -> ScanResult
    where
        T: Send + 'static,
        P: Prober<T> + 'static,
        F: FnMut(&ProbeOutcome) + Send,
    {
        let job_id = JobId::new();
        let limiter = RateLimiter::new(self.config.rate_limit);
        let submitted = targets.len();
        let workers = self.config.concurrency.min(submitted);
        let mut builder = ResultBuilder::new(job_id, label, submitted);

        info!(job = %job_id.short(), target_host = label, submitted, workers, "scan job started");

        let queue = Arc::new(Mutex::new(targets.into_iter().enumerate()));
        let (tx, mut rx) = mpsc::channel::<(usize, ProbeOutcome)>(workers.max(1) * 2);

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let prober = Arc::clone(&prober);
                let token = token.clone();
                let limiter = limiter.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    loop {
                        if token.is_cancelled() {
                            break;
                        }
                        let next = lock(&queue).next();
                        let Some((index, target)) = next else {
                            break;
                        };
                        if let Some(limiter) = &limiter {
                            tokio::select! {
                                _ = token.cancelled() => break,
                                _ = limiter.wait() => {}
                            }
                        }
                        if token.is_cancelled() {
                            break;
                        }
                        let outcome = prober.probe(target).await;
                        if tx.send((index, outcome)).await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(tx);

        while let Some((index, outcome)) = rx.recv().await {
            if outcome.reachable {
                on_found(&outcome);
            }
            builder.push(index, outcome);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(job = %job_id.short(), error = %e, "scan worker failed");
            }
        }

        let result = builder.finish(token.is_cancelled());
        info!(
            job = %job_id.short(),
            attempted = result.attempted,
            succeeded = result.succeeded,
            cancelled = result.cancelled,
            duration_ms = result.duration_ms,
            "scan job finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Reports a fixed set of ports as open after an optional delay.
    struct FakePortProber {
        open: Vec<u16>,
        delay: Duration,
    }

    #[async_trait]
    impl Prober<u16> for FakePortProber {
        async fn probe(&self, port: u16) -> ProbeOutcome {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.open.contains(&port) {
                ProbeOutcome::reachable("10.0.0.1").with_port(port)
            } else {
                ProbeOutcome::unreachable("10.0.0.1", ErrorKind::Connection).with_port(port)
            }
        }
    }

    /// Every host answers after `delay`.
    struct SlowHostProber {
        delay: Duration,
        probed: AtomicUsize,
    }

    #[async_trait]
    impl Prober<Ipv4Addr> for SlowHostProber {
        async fn probe(&self, ip: Ipv4Addr) -> ProbeOutcome {
            self.probed.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            ProbeOutcome::reachable(ip.to_string())
        }
    }

    /// Resolves every name to loopback after `delay`; odd last octets have
    /// a reverse name.
    #[derive(Debug)]
    struct FakeResolver {
        delay: Duration,
    }

    #[async_trait]
    impl HostResolver for FakeResolver {
        async fn resolve_host(&self, _host: &str) -> ProbeResult<IpAddr> {
            tokio::time::sleep(self.delay).await;
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        }

        async fn reverse(&self, ip: IpAddr) -> Option<String> {
            match ip {
                IpAddr::V4(v4) if v4.octets()[3] % 2 == 1 => {
                    Some(format!("host-{}.lan", v4.octets()[3]))
                }
                _ => None,
            }
        }
    }

    fn scanner(concurrency: usize) -> ConcurrentScanner {
        ConcurrentScanner::new(
            JobConfig::new()
                .with_concurrency(concurrency)
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap()
    }

    fn assert_counts(result: &ScanResult) {
        assert_eq!(result.succeeded + result.failed, result.attempted);
        assert!(result.attempted <= result.submitted);
        assert_eq!(result.outcomes.len(), result.attempted);
    }

    #[test]
    fn test_job_config_validation() {
        assert!(JobConfig::default().validate().is_ok());
        let err = JobConfig::new().with_concurrency(0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = JobConfig::new().with_timeout(Duration::ZERO).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(ConcurrentScanner::new(JobConfig::new().with_concurrency(0)).is_err());
    }

    #[tokio::test]
    async fn test_fake_scan_finds_single_open_port() {
        let scanner = scanner(10);
        let ports: Vec<u16> = (1..=100).collect();
        let prober = Arc::new(FakePortProber {
            open: vec![42],
            delay: Duration::ZERO,
        });
        let mut found = Vec::new();

        let result = scanner
            .run_job("10.0.0.1", ports, prober, |o| found.push(o.port))
            .await;

        assert_counts(&result);
        assert_eq!(result.submitted, 100);
        assert_eq!(result.attempted, 100);
        assert_eq!(result.succeeded, 1);
        assert!(!result.cancelled);
        assert!(result.is_complete());
        assert_eq!(result.open_ports(), vec![42]);
        assert_eq!(found, vec![Some(42)]);
        let order: Vec<_> = result.outcomes.iter().filter_map(|o| o.port).collect();
        assert_eq!(order, (1..=100).collect::<Vec<u16>>());
    }

    #[tokio::test]
    async fn test_loopback_scan_finds_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let mut closed = Vec::new();
        for _ in 0..3 {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            closed.push(l.local_addr().unwrap().port());
        }

        let spec = std::iter::once(open)
            .chain(closed.iter().copied())
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let scanner = scanner(4);
        let mut reported = Vec::new();
        let result = scanner
            .scan_ports("127.0.0.1", &spec, |o| reported.push(o.clone()))
            .await
            .unwrap();

        assert_counts(&result);
        assert_eq!(result.submitted, 4);
        assert_eq!(result.attempted, 4);
        assert_eq!(result.open_ports(), vec![open]);
        assert_eq!(reported.len(), 1);
        assert!(reported[0].service_name.is_some());
        drop(listener);
    }

    #[tokio::test]
    async fn test_scan_rejects_bad_input() {
        let scanner = scanner(4);
        let err = scanner.scan_ports("", "80", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = scanner.scan_ports("127.0.0.1", "0-10", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = scanner.scan_ports("127.0.0.1", "90-80", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = scanner.scan_ports("127.0.0.1", "", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_cancel_mid_discovery() {
        let scanner = scanner(50);
        let hosts: Vec<_> = subnet::parse("192.168.1.0/24").unwrap().hosts().collect();
        assert_eq!(hosts.len(), 254);
        let prober = Arc::new(SlowHostProber {
            delay: Duration::from_millis(20),
            probed: AtomicUsize::new(0),
        });

        let mut seen = 0;
        let result = scanner
            .run_job("192.168.1.0/24", hosts, Arc::clone(&prober), |_| {
                seen += 1;
                if seen == 10 {
                    scanner.cancel();
                }
            })
            .await;

        assert_counts(&result);
        assert!(result.cancelled);
        assert!(result.attempted < 254);
        assert!(prober.probed.load(Ordering::SeqCst) < 254);
        scanner.cancel();
    }

    #[tokio::test]
    async fn test_cancel_during_resolution_stops_scan() {
        let scanner = scanner(8).with_resolver(Arc::new(FakeResolver {
            delay: Duration::from_millis(300),
        }));

        let (result, ()) = tokio::join!(
            scanner.scan_ports("slow.example", "1-40", |_| panic!("no port should be probed")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                scanner.cancel();
            }
        );
        let result = result.unwrap();

        assert_counts(&result);
        assert!(result.cancelled);
        assert_eq!(result.submitted, 40);
        assert_eq!(result.attempted, 0);
        assert_eq!(result.target, "slow.example");
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_does_not_leak_into_later_jobs() {
        let scanner = scanner(8);
        scanner.cancel();
        scanner.cancel();

        let prober = Arc::new(FakePortProber {
            open: vec![1, 2],
            delay: Duration::from_millis(1),
        });
        let result = scanner
            .run_job("10.0.0.1", (1..=20).collect(), prober, |_| {})
            .await;

        assert_counts(&result);
        assert!(!result.cancelled);
        assert_eq!(result.attempted, 20);
        assert_eq!(result.succeeded, 2);
    }

    #[tokio::test]
    async fn test_cancel_from_another_task() {
        let scanner = Arc::new(scanner(4));
        let prober = Arc::new(FakePortProber {
            open: Vec::new(),
            delay: Duration::from_millis(10),
        });

        let canceller = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                scanner.cancel();
            })
        };
        let result = scanner
            .run_job("10.0.0.1", (1..=1000).collect(), prober, |_| {})
            .await;
        canceller.await.unwrap();

        assert_counts(&result);
        assert!(result.cancelled);
        assert!(result.attempted < 1000);
    }

    #[tokio::test]
    async fn test_rate_limit_paces_probes() {
        let scanner = ConcurrentScanner::new(
            JobConfig::new().with_concurrency(10).with_rate_limit(50),
        )
        .unwrap();
        let prober = Arc::new(FakePortProber {
            open: Vec::new(),
            delay: Duration::ZERO,
        });

        let result = scanner
            .run_job("10.0.0.1", (1..=6).collect(), prober, |_| {})
            .await;

        assert_eq!(result.attempted, 6);
        assert!(result.duration_ms >= 80);
    }

    #[tokio::test]
    async fn test_discover_single_address_network_is_empty() {
        let scanner = scanner(4);
        let result = scanner
            .discover_hosts("10.1.2.3/32", |_| panic!("no host should be probed"))
            .await
            .unwrap();
        assert_eq!(result.submitted, 0);
        assert_eq!(result.attempted, 0);
        assert_eq!(result.target, "10.1.2.3/32");
    }

    #[tokio::test]
    async fn test_discover_rejects_bad_networks() {
        let scanner = scanner(4);
        let err = scanner.discover_hosts("10.0.0.0/33", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = scanner.discover_hosts("10.0.0.0/8", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_empty_job() {
        let scanner = scanner(4);
        let prober = Arc::new(FakePortProber {
            open: Vec::new(),
            delay: Duration::ZERO,
        });
        let result = scanner.run_job("none", Vec::new(), prober, |_| {}).await;
        assert_counts(&result);
        assert_eq!(result.submitted, 0);
        assert!(result.is_complete());
    }
    #[cfg(unix)]
    mod discovery_jobs {
        use super::*;
        use crate::probe::PingMode;
        use tokio::process::Command;

        /// Answers one echo for the listed addresses, or for every address
        /// when the list is empty.
        #[derive(Debug)]
        struct EchoTool {
            responders: Vec<Ipv4Addr>,
        }

        impl ProbeTool for EchoTool {
            fn ping_command(&self, target: &str, _mode: PingMode, _timeout: Duration) -> Command {
                let answers = self.responders.is_empty()
                    || self.responders.iter().any(|ip| ip.to_string() == target);
                let script = if answers {
                    format!(
                        "sleep 0.01; echo '64 bytes from {}: icmp_seq=1 ttl=64 time=0.8 ms'",
                        target
                    )
                } else {
                    "exit 1".to_string()
                };
                let mut command = Command::new("sh");
                command.arg("-c").arg(script);
                command
            }

            fn trace_command(&self, _target: &str, _max_hops: u8) -> Command {
                Command::new("true")
            }
        }

        fn discovery_scanner(concurrency: usize, responders: Vec<Ipv4Addr>) -> ConcurrentScanner {
            ConcurrentScanner::with_tool(
                JobConfig::new()
                    .with_concurrency(concurrency)
                    .with_timeout(Duration::from_secs(1)),
                Arc::new(EchoTool { responders }),
            )
            .unwrap()
            .with_resolver(Arc::new(FakeResolver {
                delay: Duration::ZERO,
            }))
        }

        #[tokio::test]
        async fn test_discover_names_responders() {
            let scanner = discovery_scanner(
                4,
                vec![Ipv4Addr::new(192, 168, 5, 3), Ipv4Addr::new(192, 168, 5, 4)],
            );
            let mut found = Vec::new();

            let result = scanner
                .discover_hosts("192.168.5.0/28", |o| found.push(o.clone()))
                .await
                .unwrap();

            assert_counts(&result);
            assert_eq!(result.target, "192.168.5.0/28");
            assert_eq!(result.submitted, 14);
            assert_eq!(result.attempted, 14);
            assert_eq!(result.succeeded, 2);
            assert_eq!(result.failed, 12);
            assert!(result.is_complete());

            found.sort_by(|a, b| a.target.cmp(&b.target));
            assert_eq!(found.len(), 2);
            assert_eq!(found[0].target, "192.168.5.3");
            assert_eq!(found[0].hostname.as_deref(), Some("host-3.lan"));
            assert_eq!(found[0].latency_ms, Some(0.8));
            assert_eq!(found[1].target, "192.168.5.4");
            assert_eq!(found[1].hostname.as_deref(), Some(UNKNOWN_HOST));

            let silent = result.outcomes.iter().find(|o| o.target == "192.168.5.1").unwrap();
            assert!(!silent.reachable);
            assert_eq!(silent.error, Some(ErrorKind::Timeout));
        }

        #[tokio::test]
        async fn test_cancel_discovery_after_ten_responders() {
            let scanner = discovery_scanner(20, Vec::new());
            let mut seen = 0;

            let result = scanner
                .discover_hosts("10.20.30.0/24", |o| {
                    assert!(o.hostname.is_some());
                    seen += 1;
                    if seen == 10 {
                        scanner.cancel();
                    }
                })
                .await
                .unwrap();

            assert_counts(&result);
            assert!(result.cancelled);
            assert_eq!(result.submitted, 254);
            assert!(result.attempted >= 10);
            assert!(result.attempted < 254);
            assert_eq!(result.succeeded, seen);
        }
    }
}
