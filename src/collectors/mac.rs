use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::debug;

use super::{InventorySource, MembershipSource, SwitchEnumerator, parse_hex_prefix, run_command};
use crate::error::{Error, Result};
use crate::model::{StorageRecord, Switch, UsbRecord};

/// macOS collector built on `ioreg`, `system_profiler`, `ifconfig` and
/// `networksetup`.
pub struct MacCollector {}

impl MacCollector {
    pub fn new() -> Self {
        Self {}
    }

    fn profiler_json(data_type: &str) -> Result<String> {
        run_command("system_profiler", &["-json", data_type])
    }
}

impl Default for MacCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchEnumerator for MacCollector {
    fn switches(&self) -> Result<Vec<Switch>> {
        let out = run_command("ioreg", &["-l", "-w0", "-r", "-c", "IOThunderboltSwitch"])?;
        Ok(parse_ioreg_switches(&out))
    }
}

impl InventorySource for MacCollector {
    fn storage_devices(&self) -> Result<Vec<StorageRecord>> {
        parse_storage(&Self::profiler_json("SPStorageDataType")?)
    }

    fn usb_devices(&self) -> Result<Vec<UsbRecord>> {
        // Newer releases moved the tree to SPUSBHostDataType.
        let out = match Self::profiler_json("SPUSBHostDataType") {
            Ok(out) if !out.trim().is_empty() => out,
            _ => Self::profiler_json("SPUSBDataType")?,
        };
        parse_usb(&out)
    }

    fn gpu_core_count(&self) -> Result<u32> {
        parse_gpu_cores(&Self::profiler_json("SPDisplaysDataType")?)
    }
}

impl MembershipSource for MacCollector {
    fn bridge_membership(&self, bridge: &str) -> Result<String> {
        run_command("ifconfig", &[bridge])
    }

    fn hardware_ports(&self) -> Result<String> {
        run_command("networksetup", &["-listallhardwareports"])
    }
}

// ── ioreg ───────────────────────────────────────────────────────────────────

/// Split `"Key" = value` property lines out of `ioreg -l` output.
fn parse_property(line: &str) -> Option<(&str, &str)> {
    let start = line.find('"')?;
    let rest = &line[start + 1..];
    let end = rest.find('"')?;
    let key = &rest[..end];
    let value = rest[end + 1..].trim_start().strip_prefix('=')?.trim();
    Some((key, value.trim_matches('"')))
}

fn parse_number(value: &str) -> u64 {
    if value.starts_with("0x") || value.starts_with("0X") {
        parse_hex_prefix(value)
    } else {
        value.parse().unwrap_or(0)
    }
}

/// Registry entry a property line belongs to.
#[derive(Clone, Copy)]
enum Entry {
    Switch(usize),
    Port(usize),
    Other,
}

#[derive(Default)]
struct PortSpeeds {
    /// Switch the port hangs off.
    owner: Option<usize>,
    supported: u32,
    current: u32,
}

fn apply_switch_property(sw: &mut Switch, key: &str, value: &str) {
    match key {
        "UID" => sw.uid = parse_number(value),
        "Depth" => sw.depth = parse_number(value) as u32,
        "Vendor ID" => sw.vendor_id = parse_number(value) as u32,
        "Device ID" => sw.device_id = parse_number(value) as u32,
        "Device Vendor Name" => sw.vendor_name = value.to_string(),
        "Device Model Name" => sw.device_name = value.to_string(),
        "Supported Link Speed" => sw.link_speed = sw.link_speed.max(parse_number(value) as u32),
        "Current Link Speed" => sw.current_speed = sw.current_speed.max(parse_number(value) as u32),
        _ => {}
    }
}

/// Parse the switch registry entries in enumeration order.
///
/// Nesting follows the column of each `+-o` marker. A port's speeds count
/// toward the nearest switch above it. A non-root switch reports the speed
/// negotiated on the port it is plugged into, and is attached to the host
/// switch that heads its chain.
pub fn parse_ioreg_switches(output: &str) -> Vec<Switch> {
    let mut switches: Vec<Switch> = Vec::new();
    let mut upstream: Vec<Option<usize>> = Vec::new();
    let mut ports: Vec<PortSpeeds> = Vec::new();
    let mut stack: Vec<(usize, Entry)> = Vec::new();
    let mut current = Entry::Other;

    for line in output.lines() {
        if let Some(column) = line.find("+-o ") {
            while stack.last().is_some_and(|&(c, _)| c >= column) {
                stack.pop();
            }
            current = if line.contains("<class IOThunderboltSwitch") {
                upstream.push(match stack.last() {
                    Some(&(_, Entry::Port(p))) => Some(p),
                    _ => None,
                });
                switches.push(Switch::default());
                Entry::Switch(switches.len() - 1)
            } else if line.contains("<class IOThunderboltPort") {
                let owner = stack.iter().rev().find_map(|&(_, e)| match e {
                    Entry::Switch(i) => Some(i),
                    _ => None,
                });
                ports.push(PortSpeeds { owner, ..Default::default() });
                Entry::Port(ports.len() - 1)
            } else {
                Entry::Other
            };
            stack.push((column, current));
            continue;
        }

        let Some((key, value)) = parse_property(line) else {
            continue;
        };
        match current {
            Entry::Switch(i) => apply_switch_property(&mut switches[i], key, value),
            Entry::Port(p) => match key {
                "Supported Link Speed" => ports[p].supported = parse_number(value) as u32,
                "Current Link Speed" => ports[p].current = parse_number(value) as u32,
                _ => {}
            },
            Entry::Other => {}
        }
    }

    for port in &ports {
        if let Some(i) = port.owner {
            let sw = &mut switches[i];
            sw.link_speed = sw.link_speed.max(port.supported);
            sw.current_speed = sw.current_speed.max(port.current);
        }
    }
    for (sw, port) in switches.iter_mut().zip(&upstream) {
        if sw.depth == 0 {
            continue;
        }
        if let Some(negotiated) = port.map(|p| ports[p].current).filter(|&c| c > 0) {
            sw.current_speed = negotiated;
        }
    }

    let mut root_uid = None;
    for sw in &mut switches {
        if sw.depth == 0 {
            root_uid = Some(sw.uid);
        } else if let Some(root) = root_uid {
            sw.parent_uid = root;
        }
    }
    switches
}

// ── system_profiler ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StorageReport {
    #[serde(rename = "SPStorageDataType")]
    #[serde(default)]
    items: Vec<StorageVolume>,
}

#[derive(Deserialize)]
struct StorageVolume {
    #[serde(rename = "_name")]
    #[serde(default)]
    name: String,
    #[serde(default)]
    bsd_name: String,
    physical_drive: Option<PhysicalDrive>,
}

#[derive(Deserialize)]
struct PhysicalDrive {
    #[serde(default)]
    device_name: String,
    #[serde(default)]
    medium_type: String,
    #[serde(default)]
    protocol: String,
    #[serde(rename = "is_internal_disk")]
    #[serde(default)]
    is_internal: String,
}

/// `disk4s1` and `disk3s1s1` live on `disk4` and `disk3`.
fn whole_disk_name(bsd_name: &str) -> &str {
    match bsd_name.strip_prefix("disk").and_then(|rest| rest.find('s')) {
        Some(slice) => &bsd_name[..4 + slice],
        None => bsd_name,
    }
}

/// One non-whole record per volume plus one whole record per physical drive.
/// Drives are told apart by BSD whole-disk name, or by model when a volume
/// has no BSD name.
pub fn parse_storage(json: &str) -> Result<Vec<StorageRecord>> {
    let report: StorageReport = serde_json::from_str(json)?;
    let mut records = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for volume in report.items {
        let Some(drive) = volume.physical_drive else {
            continue;
        };
        let is_internal = drive.is_internal == "yes";
        records.push(StorageRecord {
            name: volume.name,
            protocol: drive.protocol.clone(),
            medium_type: drive.medium_type.clone(),
            is_whole: false,
            is_internal,
        });
        let key = match whole_disk_name(&volume.bsd_name) {
            "" => drive.device_name.clone(),
            whole => whole.to_string(),
        };
        if !key.is_empty() && seen.insert(key.clone()) {
            let name = if drive.device_name.is_empty() { key } else { drive.device_name };
            records.push(StorageRecord {
                name,
                protocol: drive.protocol,
                medium_type: drive.medium_type,
                is_whole: true,
                is_internal,
            });
        }
    }
    Ok(records)
}

#[derive(Deserialize)]
struct UsbNode {
    #[serde(rename = "_name")]
    #[serde(default)]
    name: String,
    #[serde(default, alias = "USBDeviceKeyVendorName")]
    manufacturer: String,
    #[serde(default, alias = "USBDeviceKeyProductID")]
    product_id: String,
    #[serde(default, alias = "USBDeviceKeyVendorID")]
    vendor_id: String,
    #[serde(default, alias = "USBDeviceKeyLocationID")]
    location_id: String,
    #[serde(rename = "_items")]
    #[serde(default)]
    items: Vec<UsbNode>,
}

fn flatten_usb(node: UsbNode, out: &mut Vec<UsbRecord>) {
    out.push(UsbRecord {
        product_name: node.name,
        vendor_name: node.manufacturer,
        product_id: parse_hex_prefix(&node.product_id) as u16,
        vendor_id: parse_hex_prefix(&node.vendor_id) as u16,
        location_id: parse_hex_prefix(&node.location_id) as u32,
    });
    for child in node.items {
        flatten_usb(child, out);
    }
}

/// Top-level entries are host controllers; only what hangs below them is a
/// device.
pub fn parse_usb(json: &str) -> Result<Vec<UsbRecord>> {
    let report: HashMap<String, Vec<UsbNode>> = serde_json::from_str(json)?;
    let controllers = report
        .into_values()
        .next()
        .ok_or_else(|| Error::malformed("USB report has no data type"))?;

    let mut records = Vec::new();
    for controller in controllers {
        for device in controller.items {
            flatten_usb(device, &mut records);
        }
    }
    Ok(records)
}

#[derive(Deserialize)]
struct DisplaysReport {
    #[serde(rename = "SPDisplaysDataType")]
    #[serde(default)]
    items: Vec<DisplayAdapter>,
}

#[derive(Deserialize)]
struct DisplayAdapter {
    #[serde(rename = "sppci_cores")]
    #[serde(default)]
    cores: String,
}

pub fn parse_gpu_cores(json: &str) -> Result<u32> {
    let report: DisplaysReport = serde_json::from_str(json)?;
    let cores = report
        .items
        .iter()
        .filter_map(|a| a.cores.trim().parse::<u32>().ok())
        .next()
        .unwrap_or(0);
    debug!(cores, "GPU core count");
    Ok(cores)
}
