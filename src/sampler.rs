//! Per-interface throughput from cumulative counters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::model::{DiskIoMetric, DiskIoRate, NetMetric, RateResult};

#[derive(Default)]
struct SamplerState {
    previous: HashMap<String, NetMetric>,
    last_update: Option<Instant>,
}

/// Keeps the previous observation of every accepted interface and turns the
/// next observation into per-second rates.
///
/// One sampling pass runs at a time. The previous state is replaced as a
/// whole at the end of each pass, so interfaces that vanish simply drop out.
#[derive(Default)]
pub struct RateSampler {
    state: Mutex<SamplerState>,
}

impl RateSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample<F>(&self, current: &HashMap<String, NetMetric>, accept: F) -> Vec<RateResult>
    where
        F: Fn(&str) -> bool,
    {
        self.sample_at(current, accept, Instant::now())
    }

    /// Same as [`sample`](Self::sample) with an explicit clock reading.
    pub fn sample_at<F>(
        &self,
        current: &HashMap<String, NetMetric>,
        accept: F,
        now: Instant,
    ) -> Vec<RateResult>
    where
        F: Fn(&str) -> bool,
    {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let secs = interval_secs(state.last_update, now);

        let mut results = Vec::new();
        let mut next: HashMap<String, NetMetric> = HashMap::new();

        for (name, metric) in current {
            if !accept(name) {
                continue;
            }

            let mut result = RateResult::from_metric(metric);
            result.name = name.clone();

            if let Some(prev) = state.previous.get(name) {
                result.bytes_in_per_sec = per_second(prev.bytes_recv, metric.bytes_recv, secs);
                result.bytes_out_per_sec = per_second(prev.bytes_sent, metric.bytes_sent, secs);
                if metric.bytes_recv < prev.bytes_recv || metric.bytes_sent < prev.bytes_sent {
                    trace!(interface = %name, "counter reset");
                }
            }

            next.insert(name.clone(), metric.clone());
            results.push(result);
        }

        state.previous = next;
        state.last_update = Some(now);

        results.sort_by(|a, b| a.name.cmp(&b.name));
        results
    }

    /// Number of interfaces with a previous observation.
    pub fn tracked(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).previous.len()
    }
}

#[derive(Default)]
struct DiskIoState {
    previous: HashMap<String, DiskIoMetric>,
    last_update: Option<Instant>,
}

/// Read and write throughput per disk, under the same interval and reset
/// rules as [`RateSampler`]. Every reported disk is tracked.
#[derive(Default)]
pub struct DiskIoSampler {
    state: Mutex<DiskIoState>,
}

impl DiskIoSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&self, current: &HashMap<String, DiskIoMetric>) -> Vec<DiskIoRate> {
        self.sample_at(current, Instant::now())
    }

    pub fn sample_at(&self, current: &HashMap<String, DiskIoMetric>, now: Instant) -> Vec<DiskIoRate> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let secs = interval_secs(state.last_update, now);

        let mut results: Vec<DiskIoRate> = current
            .iter()
            .map(|(name, metric)| {
                let mut rate = DiskIoRate {
                    name: name.clone(),
                    read_bytes: metric.read_bytes,
                    written_bytes: metric.written_bytes,
                    ..Default::default()
                };
                if let Some(prev) = state.previous.get(name) {
                    rate.read_per_sec = per_second(prev.read_bytes, metric.read_bytes, secs);
                    rate.write_per_sec = per_second(prev.written_bytes, metric.written_bytes, secs);
                }
                rate
            })
            .collect();

        state.previous = current.clone();
        state.last_update = Some(now);

        results.sort_by(|a, b| a.name.cmp(&b.name));
        results
    }
}

/// Seconds since the previous pass. No previous pass, or a clock that did
/// not move forward, counts as one second.
fn interval_secs(last: Option<Instant>, now: Instant) -> f64 {
    let elapsed = match last {
        Some(last) => now.saturating_duration_since(last),
        None => Duration::ZERO,
    };
    if elapsed.is_zero() { 1.0 } else { elapsed.as_secs_f64() }
}

/// A counter that went backwards was reset; report no traffic for it.
fn per_second(prev: u64, curr: u64, secs: f64) -> f64 {
    if curr >= prev {
        (curr - prev) as f64 / secs
    } else {
        0.0
    }
}
