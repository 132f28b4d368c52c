//! Host-level counters that accompany every snapshot.

use tracing::debug;

use crate::collectors::CounterSource;
use crate::model::HostInfo;
use crate::sampler::DiskIoSampler;

/// Each counter is read independently; a failed one is left out.
pub fn collect(counters: &dyn CounterSource, disk_sampler: &DiskIoSampler) -> HostInfo {
    let identity = counters
        .host_identity()
        .map_err(|e| debug!(error = %e, "host identity unavailable"))
        .ok();
    let memory = counters
        .memory()
        .map_err(|e| debug!(error = %e, "memory counters unavailable"))
        .ok();
    let uptime_secs = counters
        .uptime_secs()
        .map_err(|e| debug!(error = %e, "uptime unavailable"))
        .ok();
    let mut disks = counters
        .disk_usage()
        .map_err(|e| debug!(error = %e, "disk usage unavailable"))
        .unwrap_or_default();
    disks.retain(|d| d.total > 0);
    disks.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));

    let disk_io = counters
        .disk_io()
        .map(|current| disk_sampler.sample(&current))
        .map_err(|e| debug!(error = %e, "disk I/O counters unavailable"))
        .ok();

    HostInfo { identity, memory, uptime_secs, disks, disk_io }
}
