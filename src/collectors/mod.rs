use std::collections::HashMap;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    DiskIoMetric, DiskUsage, HostIdentity, MemoryInfo, NetMetric, StorageRecord, Switch, UsbRecord,
};

pub mod linux;
pub mod mac;
pub mod native;

/// Point-in-time OS counters.
pub trait CounterSource: Send + Sync {
    /// Cumulative byte and packet counters keyed by interface name.
    fn net_metrics(&self) -> Result<HashMap<String, NetMetric>>;

    fn memory(&self) -> Result<MemoryInfo>;

    fn uptime_secs(&self) -> Result<u64>;

    fn disk_usage(&self) -> Result<Vec<DiskUsage>>;

    /// Cumulative read and write byte counters keyed by disk name.
    fn disk_io(&self) -> Result<HashMap<String, DiskIoMetric>>;

    fn host_identity(&self) -> Result<HostIdentity>;
}

/// Flat enumeration of Thunderbolt switches. An empty list is a valid answer.
pub trait SwitchEnumerator: Send + Sync {
    fn switches(&self) -> Result<Vec<Switch>>;
}

/// Static device classes. Each method fails independently of the others.
pub trait InventorySource: SwitchEnumerator {
    fn storage_devices(&self) -> Result<Vec<StorageRecord>>;

    fn usb_devices(&self) -> Result<Vec<UsbRecord>>;

    fn gpu_core_count(&self) -> Result<u32>;
}

/// Line-oriented listings used to find fabric network interfaces.
pub trait MembershipSource: Send + Sync {
    /// Description of `bridge`, with one member-marker line per member.
    fn bridge_membership(&self, bridge: &str) -> Result<String>;

    /// Hardware port listing: a label line followed by its `Device:` line.
    fn hardware_ports(&self) -> Result<String>;
}

/// Run an external tool and return its stdout. A missing binary or a non-zero
/// exit status makes the source unavailable.
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::unavailable(format!("{}: {}", program, e)))?;
    if !output.status.success() {
        debug!(program, status = %output.status, "command failed");
        return Err(Error::unavailable(format!("{} exited with {}", program, output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `0x1234`, `0x05ac  (Apple Inc.)` or a bare hex string. Anything
/// unparseable yields 0.
pub(crate) fn parse_hex_prefix(value: &str) -> u64 {
    let token = value.split_whitespace().next().unwrap_or("");
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_prefix_variants() {
        assert_eq!(parse_hex_prefix("0x05ac  (Apple Inc.)"), 0x05ac);
        assert_eq!(parse_hex_prefix("0X8086"), 0x8086);
        assert_eq!(parse_hex_prefix("15ef"), 0x15ef);
        assert_eq!(parse_hex_prefix("0x01100000 / 1"), 0x0110_0000);
        assert_eq!(parse_hex_prefix("garbage"), 0);
        assert_eq!(parse_hex_prefix(""), 0);
    }

    #[test]
    fn missing_program_is_unavailable() {
        let err = run_command("boltwatch-definitely-not-installed", &[]).unwrap_err();
        assert!(err.is_unavailable());
    }
}
