use std::collections::HashMap;
use std::sync::Mutex;

use sysinfo::{DiskRefreshKind, Disks, Networks, System};

use super::CounterSource;
use crate::error::{Error, Result};
use crate::model::{DiskIoMetric, DiskUsage, HostIdentity, MemoryInfo, NetMetric};

/// Counter reader backed by `sysinfo`, usable on every supported platform.
pub struct SysinfoCounters {
    sys: Mutex<System>,
    networks: Mutex<Networks>,
    disks: Mutex<Disks>,
}

impl SysinfoCounters {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl Default for SysinfoCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoCounters {
    fn net_metrics(&self) -> Result<HashMap<String, NetMetric>> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|_| Error::unavailable("network counters lock poisoned"))?;
        networks.refresh(true);

        Ok(networks
            .iter()
            .map(|(name, data)| {
                let metric = NetMetric {
                    name: name.clone(),
                    bytes_sent: data.total_transmitted(),
                    bytes_recv: data.total_received(),
                    packets_sent: data.total_packets_transmitted(),
                    packets_recv: data.total_packets_received(),
                };
                (name.clone(), metric)
            })
            .collect())
    }

    fn memory(&self) -> Result<MemoryInfo> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| Error::unavailable("memory counters lock poisoned"))?;
        sys.refresh_memory();
        if sys.total_memory() == 0 {
            return Err(Error::unavailable("memory size not reported"));
        }
        Ok(MemoryInfo {
            total: sys.total_memory(),
            used: sys.used_memory(),
            available: sys.available_memory(),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
        })
    }

    fn uptime_secs(&self) -> Result<u64> {
        match System::uptime() {
            0 => Err(Error::unavailable("boot time not reported")),
            secs => Ok(secs),
        }
    }

    fn disk_usage(&self) -> Result<Vec<DiskUsage>> {
        let mut disks = self
            .disks
            .lock()
            .map_err(|_| Error::unavailable("disk list lock poisoned"))?;
        disks.refresh(true);

        Ok(disks
            .iter()
            .map(|disk| {
                DiskUsage::new(
                    disk.mount_point().to_string_lossy().into_owned(),
                    disk.name().to_string_lossy().into_owned(),
                    disk.file_system().to_string_lossy().into_owned(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect())
    }

    fn disk_io(&self) -> Result<HashMap<String, DiskIoMetric>> {
        let mut disks = self
            .disks
            .lock()
            .map_err(|_| Error::unavailable("disk list lock poisoned"))?;
        disks.refresh_specifics(true, DiskRefreshKind::everything());

        let mut metrics = HashMap::new();
        for disk in disks.iter() {
            let name = disk.name().to_string_lossy().into_owned();
            if name.is_empty() {
                continue;
            }
            let usage = disk.usage();
            metrics.insert(
                name.clone(),
                DiskIoMetric {
                    name,
                    read_bytes: usage.total_read_bytes,
                    written_bytes: usage.total_written_bytes,
                },
            );
        }
        Ok(metrics)
    }

    fn host_identity(&self) -> Result<HostIdentity> {
        let hostname = System::host_name().ok_or_else(|| Error::unavailable("host name not reported"))?;
        Ok(HostIdentity {
            hostname,
            os_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            boot_time: System::boot_time(),
        })
    }
}
