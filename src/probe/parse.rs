//! Ping output parsing and running statistics.
//!
//! Parsing is tolerant: a line that carries no round-trip time is accepted
//! and leaves the statistics untouched.

use serde::Serialize;

/// Extract the round-trip time in milliseconds from one ping output line.
///
/// Recognises `time=23.4ms`, `time=23.4 ms` and the Windows `time<1ms` form.
pub fn parse_rtt(line: &str) -> Option<f64> {
    let lower = line.to_ascii_lowercase();
    let start = lower
        .find("time=")
        .or_else(|| lower.find("time<"))
        .map(|i| i + "time=".len())?;

    let rest = &line[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extract the number of echoes the tool reports as transmitted.
///
/// Handles `4 packets transmitted, ...` and `Packets: Sent = 4, ...`.
pub fn parse_transmitted(line: &str) -> Option<u32> {
    let lower = line.to_ascii_lowercase();
    if let Some(i) = lower.find("packets transmitted") {
        return lower[..i].split_whitespace().last()?.parse().ok();
    }
    if let Some(i) = lower.find("sent =") {
        return lower[i + "sent =".len()..]
            .trim_start()
            .split(|c: char| !c.is_ascii_digit())
            .next()?
            .parse()
            .ok();
    }
    None
}

/// Accumulated statistics of one ping session.
///
/// `sent`, `lost` and `loss_percent` are only filled in for bounded runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PingStats {
    pub sent: Option<u32>,
    pub received: u32,
    pub lost: Option<u32>,
    pub loss_percent: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    #[serde(skip)]
    total_ms: f64,
    #[serde(skip)]
    transmitted: Option<u32>,
}

impl PingStats {
    /// Feed one output line. Returns the parsed round-trip time, if any.
    pub fn observe_line(&mut self, line: &str) -> Option<f64> {
        if let Some(transmitted) = parse_transmitted(line) {
            self.transmitted = Some(transmitted);
        }
        let rtt = parse_rtt(line)?;
        self.record(rtt);
        Some(rtt)
    }

    /// Record one reply.
    pub fn record(&mut self, rtt_ms: f64) {
        self.received += 1;
        self.total_ms += rtt_ms;
        self.min_ms = Some(self.min_ms.map_or(rtt_ms, |m| m.min(rtt_ms)));
        self.max_ms = Some(self.max_ms.map_or(rtt_ms, |m| m.max(rtt_ms)));
        self.avg_ms = Some(self.total_ms / f64::from(self.received));
    }

    /// Compute loss once a bounded run has ended.
    ///
    /// The tool's own transmitted count wins over `fallback_sent`. With
    /// neither, loss stays unknown instead of being guessed.
    pub fn finalize_bounded(&mut self, fallback_sent: Option<u32>) {
        let Some(sent) = self.transmitted.or(fallback_sent) else {
            return;
        };
        let sent = sent.max(self.received);
        let lost = sent - self.received;
        self.sent = Some(sent);
        self.lost = Some(lost);
        self.loss_percent = (sent > 0).then(|| f64::from(lost) / f64::from(sent) * 100.0);
    }
}
