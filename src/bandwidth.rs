//! Link quality estimation from repeated latency samples.
//!
//! Takes one single-echo latency sample per interval over a fixed window
//! and reduces them to average, min, max, jitter and a quality tier.

use crate::error::{ProbeError, ProbeResult};
use crate::probe::{PingRequest, ProbeController};
use crate::types::Target;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Source of single latency samples.
#[async_trait]
pub trait LatencySampler: Send + Sync {
    /// Round-trip time to `host` in milliseconds, `None` when the probe failed.
    async fn sample(&self, host: &str) -> Option<f64>;
}

#[async_trait]
impl LatencySampler for ProbeController {
    async fn sample(&self, host: &str) -> Option<f64> {
        let report = self.ping(PingRequest::bounded(host, 1), |_| {}).await;
        if report.success {
            report.statistics.min_ms
        } else {
            None
        }
    }
}

/// Coarse link rating by average latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityTier {
    pub fn from_latency(avg_ms: f64) -> Self {
        if avg_ms < 50.0 {
            Self::Excellent
        } else if avg_ms < 100.0 {
            Self::Good
        } else if avg_ms < 200.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reduced statistics of a sample window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkQuality {
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    /// Spread between the slowest and fastest sample.
    pub jitter_ms: f64,
    pub quality: QualityTier,
}

/// Latency observations gathered over one window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandwidthSample {
    pub observations: Vec<f64>,
    pub failures: usize,
}

impl BandwidthSample {
    pub fn reduce(&self) -> ProbeResult<LinkQuality> {
        if self.observations.is_empty() {
            return Err(ProbeError::NoSamples(format!(
                "no successful pings in {} attempts",
                self.failures
            )));
        }
        let min = self.observations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.observations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = self.observations.iter().sum::<f64>() / self.observations.len() as f64;
        Ok(LinkQuality {
            avg_latency_ms: avg,
            min_latency_ms: min,
            max_latency_ms: max,
            jitter_ms: max - min,
            quality: QualityTier::from_latency(avg),
        })
    }
}

/// Progress after each sampling round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthProgress {
    pub elapsed: Duration,
    pub window: Duration,
    pub samples: usize,
    pub last_rtt_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthReport {
    pub host: String,
    pub duration_secs: u64,
    pub samples: usize,
    pub failed_samples: usize,
    #[serde(flatten)]
    pub link: LinkQuality,
}

pub struct BandwidthEstimator {
    sampler: Arc<dyn LatencySampler>,
    window: Duration,
    interval: Duration,
}

impl BandwidthEstimator {
    pub fn new(sampler: Arc<dyn LatencySampler>) -> Self {
        Self {
            sampler,
            window: DEFAULT_WINDOW,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sample `host` for the whole window and rate the link.
    pub async fn estimate<F>(&self, host: &str, mut on_progress: F) -> ProbeResult<BandwidthReport>
    where
        F: FnMut(&BandwidthProgress) + Send,
    {
        let host = Target::host(host)?;
        if self.window.is_zero() || self.interval.is_zero() {
            return Err(ProbeError::InvalidInput(
                "sampling window and interval must be greater than zero".to_string(),
            ));
        }

        info!(target_host = %host, window_secs = self.window.as_secs_f64(), "estimating link quality");
        let started = Instant::now();
        let mut sample = BandwidthSample::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if started.elapsed() >= self.window {
                break;
            }
            let rtt = self.sampler.sample(&host).await;
            match rtt {
                Some(ms) => sample.observations.push(ms),
                None => sample.failures += 1,
            }
            debug!(target_host = %host, ?rtt, "latency sample");
            on_progress(&BandwidthProgress {
                elapsed: started.elapsed().min(self.window),
                window: self.window,
                samples: sample.observations.len(),
                last_rtt_ms: rtt,
            });
        }

        let link = sample.reduce()?;
        Ok(BandwidthReport {
            host,
            duration_secs: self.window.as_secs(),
            samples: sample.observations.len(),
            failed_samples: sample.failures,
            link,
        })
    }
}
