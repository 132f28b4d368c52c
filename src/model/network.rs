use serde::Serialize;

/// Raw cumulative counters for one interface at one sampling instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetMetric {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

/// Throughput for one fabric interface over the last sampling interval.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RateResult {
    pub name: String,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
    pub packets_in: u64,
    pub packets_out: u64,
}

impl RateResult {
    pub fn from_metric(metric: &NetMetric) -> Self {
        Self {
            name: metric.name.clone(),
            bytes_in: metric.bytes_recv,
            bytes_out: metric.bytes_sent,
            bytes_in_per_sec: 0.0,
            bytes_out_per_sec: 0.0,
            packets_in: metric.packets_recv,
            packets_out: metric.packets_sent,
        }
    }
}
