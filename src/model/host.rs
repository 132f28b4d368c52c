use std::sync::Arc;

use serde::Serialize;

use super::inventory::InventorySnapshot;
use super::network::RateResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub device: String,
    pub fs_type: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

impl DiskUsage {
    pub fn new(mount_point: String, device: String, fs_type: String, total: u64, free: u64) -> Self {
        let used = total.saturating_sub(free);
        let used_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self { mount_point, device, fs_type, total, used, free, used_percent }
    }
}

/// Who the machine is. `boot_time` is in seconds since the Unix epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub hostname: String,
    pub os_version: String,
    pub kernel_version: String,
    pub boot_time: u64,
}

/// Cumulative I/O counters for one disk at one sampling instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskIoMetric {
    pub name: String,
    pub read_bytes: u64,
    pub written_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiskIoRate {
    pub name: String,
    pub read_bytes: u64,
    pub written_bytes: u64,
    pub read_per_sec: f64,
    pub write_per_sec: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HostInfo {
    pub identity: Option<HostIdentity>,
    pub memory: Option<MemoryInfo>,
    pub uptime_secs: Option<u64>,
    pub disks: Vec<DiskUsage>,
    /// `None` when the disk counters could not be read this tick.
    pub disk_io: Option<Vec<DiskIoRate>>,
}

// --- Aggregated monitor data ---

#[derive(Clone, Debug, Serialize)]
pub struct MonitorData {
    pub time: String,
    pub host: HostInfo,
    pub inventory: Arc<InventorySnapshot>,
    /// `None` when the counter source produced no data this tick.
    pub fabric_net: Option<Vec<RateResult>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_usage_percent() {
        let d = DiskUsage::new("/".into(), "/dev/disk3s1".into(), "apfs".into(), 1000, 250);
        assert_eq!(d.used, 750);
        assert!((d.used_percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disk_usage_zero_total() {
        let d = DiskUsage::new("/dev".into(), "devfs".into(), "devfs".into(), 0, 0);
        assert_eq!(d.used, 0);
        assert_eq!(d.used_percent, 0.0);
    }
}
