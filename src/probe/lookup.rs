//! DNS name resolution.

use crate::error::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::proto::rr::RecordType;
use trust_dns_resolver::TokioAsyncResolver;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a lookup found about one name or address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupReport {
    pub query: String,
    pub addresses: Vec<String>,
    pub reverse_dns: Option<String>,
    pub cname_records: Vec<String>,
    pub mx_records: Vec<String>,
    pub txt_records: Vec<String>,
    pub ns_records: Vec<String>,
}

impl LookupReport {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
            && self.reverse_dns.is_none()
            && self.cname_records.is_empty()
            && self.mx_records.is_empty()
            && self.txt_records.is_empty()
            && self.ns_records.is_empty()
    }
}

/// Async resolver with a per-query time limit.
#[derive(Clone)]
pub struct NameResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl NameResolver {
    /// Resolver using the system configuration, or public defaults when
    /// the system configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match trust_dns_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!(error = %e, "falling back to default resolver configuration");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a host name or address literal to one address.
    pub async fn resolve_host(&self, host: &str) -> ProbeResult<IpAddr> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ProbeError::InvalidInput("host is empty".to_string()));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let lookup = self
            .bounded(self.resolver.lookup_ip(host))
            .await
            .ok_or_else(|| ProbeError::InvalidInput(format!("could not resolve {}", host)))?;
        lookup
            .iter()
            .find(IpAddr::is_ipv4)
            .or_else(|| lookup.iter().next())
            .ok_or_else(|| ProbeError::InvalidInput(format!("no addresses for {}", host)))
    }

    /// Reverse name of `ip`, if it has one.
    pub async fn reverse(&self, ip: IpAddr) -> Option<String> {
        let names = self.bounded(self.resolver.reverse_lookup(ip)).await?;
        let name = names.iter().next()?.to_string();
        Some(name.trim_end_matches('.').to_string())
    }

    /// Collect addresses and common records for `query`.
    ///
    /// An address literal gets a reverse lookup only. Record types that
    /// fail or time out are left empty.
    pub async fn lookup(&self, query: &str) -> ProbeResult<LookupReport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProbeError::InvalidInput("lookup query is empty".to_string()));
        }

        let mut report = LookupReport {
            query: query.to_string(),
            ..LookupReport::default()
        };

        if let Ok(ip) = query.parse::<IpAddr>() {
            report.addresses.push(ip.to_string());
            report.reverse_dns = self.reverse(ip).await;
            return Ok(report);
        }

        if let Some(lookup) = self.bounded(self.resolver.lookup_ip(query)).await {
            report.addresses = lookup.iter().map(|ip| ip.to_string()).collect();
        }
        let (cname, mx, txt, ns) = tokio::join!(
            self.records(query, RecordType::CNAME),
            self.records(query, RecordType::MX),
            self.records(query, RecordType::TXT),
            self.records(query, RecordType::NS),
        );
        report.cname_records = cname;
        report.mx_records = mx;
        report.txt_records = txt;
        report.ns_records = ns;

        debug!(query, addresses = report.addresses.len(), "lookup finished");
        Ok(report)
    }

    async fn records(&self, query: &str, record_type: RecordType) -> Vec<String> {
        match self.bounded(self.resolver.lookup(query, record_type)).await {
            Some(lookup) => lookup
                .iter()
                .map(|rdata| rdata.to_string().trim_end_matches('.').to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Run a resolver query under the time limit, discarding failures.
    async fn bounded<T, E, F>(&self, query: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                debug!(error = %e, "dns query failed");
                None
            }
            Err(_) => {
                debug!(timeout_ms = self.timeout.as_millis() as u64, "dns query timed out");
                None
            }
        }
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Forward and reverse resolution, as the scanner needs it.
#[async_trait]
pub trait HostResolver: Send + Sync + std::fmt::Debug {
    async fn resolve_host(&self, host: &str) -> ProbeResult<IpAddr>;

    async fn reverse(&self, ip: IpAddr) -> Option<String>;
}

#[async_trait]
impl HostResolver for NameResolver {
    async fn resolve_host(&self, host: &str) -> ProbeResult<IpAddr> {
        NameResolver::resolve_host(self, host).await
    }

    async fn reverse(&self, ip: IpAddr) -> Option<String> {
        NameResolver::reverse(self, ip).await
    }
}
