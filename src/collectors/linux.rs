use std::fs;
use std::path::{Path, PathBuf};

use super::{InventorySource, MembershipSource, SwitchEnumerator, parse_hex_prefix};
use crate::error::{Error, Result};
use crate::model::{StorageRecord, Switch, UsbRecord};

/// Linux collector reading sysfs.
pub struct LinuxCollector {
    /// Mount point of sysfs, normally `/sys`.
    root: PathBuf,
    /// Prefix written before each bridge port in membership listings.
    member_marker: String,
}

impl LinuxCollector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), member_marker: "member:".to_string() }
    }

    /// Render bridge ports with the marker the classifier looks for.
    pub fn with_member_marker(mut self, marker: impl Into<String>) -> Self {
        self.member_marker = marker.into();
        self
    }

    // ── helpers ──────────────────────────────────────────────────────────

    fn list_dir(path: &Path) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(path)
            .map_err(|e| Error::unavailable(format!("{}: {}", path.display(), e)))?
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Read a sysfs attribute, trimmed. Missing or unreadable attributes are `None`.
fn read_attr(dir: &Path, name: &str) -> Option<String> {
    fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.trim().to_string())
}

// ── Thunderbolt ─────────────────────────────────────────────────────────────

/// Split a router directory name such as `0-301` into (domain, route).
/// Service and XDomain entries (`0-0:1.1`) are not routers.
fn parse_router_name(name: &str) -> Option<(u64, u64)> {
    if name.contains(':') {
        return None;
    }
    let (domain, route) = name.split_once('-')?;
    Some((domain.parse().ok()?, u64::from_str_radix(route, 16).ok()?))
}

/// Each hop of a route string occupies one byte.
fn route_depth(route: u64) -> u32 {
    if route == 0 {
        0
    } else {
        (64 - route.leading_zeros()).div_ceil(8)
    }
}

fn generation_speed_code(generation: u32) -> u32 {
    match generation {
        0 => 0,
        1..=3 => 8,
        4 => 12,
        _ => 14,
    }
}

/// `rx_speed` reads like `20.0 Gb/s` per lane.
fn lane_speed_code(rx_speed: Option<&str>, lanes: Option<&str>) -> u32 {
    let per_lane: f64 = rx_speed
        .and_then(|s| s.split_whitespace().next())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);
    let lanes: f64 = lanes.and_then(|s| s.parse().ok()).unwrap_or(1.0);
    let total = per_lane * lanes;
    if total >= 80.0 {
        14
    } else if total >= 40.0 {
        12
    } else if total > 0.0 {
        8
    } else {
        0
    }
}

impl SwitchEnumerator for LinuxCollector {
    fn switches(&self) -> Result<Vec<Switch>> {
        let dir = self.root.join("bus/thunderbolt/devices");
        if !dir.exists() {
            // No Thunderbolt subsystem loaded: no hardware of that class.
            return Ok(Vec::new());
        }

        let mut routers: Vec<(u64, u64, String)> = Self::list_dir(&dir)?
            .into_iter()
            .filter_map(|name| parse_router_name(&name).map(|(d, r)| (d, r, name)))
            .collect();
        routers.sort_by_key(|(domain, route, _)| (*domain, *route));

        let mut switches = Vec::new();
        for (domain, route, name) in routers {
            let path = dir.join(&name);
            let depth = route_depth(route);
            let generation: u32 = read_attr(&path, "generation")
                .and_then(|g| g.parse().ok())
                .unwrap_or(0);
            let current_speed = lane_speed_code(
                read_attr(&path, "rx_speed").as_deref(),
                read_attr(&path, "rx_lanes").as_deref(),
            );
            switches.push(Switch {
                uid: (domain << 56) | route,
                parent_uid: if depth > 0 { domain << 56 } else { 0 },
                depth,
                vendor_id: read_attr(&path, "vendor").map(|v| parse_hex_prefix(&v) as u32).unwrap_or(0),
                vendor_name: read_attr(&path, "vendor_name").unwrap_or_default(),
                device_id: read_attr(&path, "device").map(|v| parse_hex_prefix(&v) as u32).unwrap_or(0),
                device_name: read_attr(&path, "device_name").unwrap_or_default(),
                link_speed: generation_speed_code(generation),
                current_speed,
            });
        }
        Ok(switches)
    }
}

// ── Storage / USB ───────────────────────────────────────────────────────────

fn is_virtual_block(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram") || name.starts_with("zram")
}

fn block_protocol(name: &str) -> &'static str {
    if name.starts_with("nvme") {
        "NVMe"
    } else if name.starts_with("sd") {
        "SCSI"
    } else if name.starts_with("mmcblk") {
        "SD/MMC"
    } else if name.starts_with("vd") {
        "Virtio"
    } else {
        "Unknown"
    }
}

/// Pack a USB `devpath` such as `1.2` into a location id: bus number in the
/// top byte, one nibble per hop below it.
fn usb_location_id(busnum: u32, devpath: &str) -> u32 {
    let mut location = (busnum & 0xFF) << 24;
    for (i, port) in devpath.split('.').take(6).enumerate() {
        let port: u32 = port.parse().unwrap_or(0);
        location |= (port & 0xF) << (20 - 4 * i as u32);
    }
    location
}

impl InventorySource for LinuxCollector {
    fn storage_devices(&self) -> Result<Vec<StorageRecord>> {
        let dir = self.root.join("block");
        let mut records = Vec::new();

        for name in Self::list_dir(&dir)? {
            if is_virtual_block(&name) {
                continue;
            }
            let path = dir.join(&name);
            let protocol = block_protocol(&name).to_string();
            let medium_type = match read_attr(&path, "queue/rotational").as_deref() {
                Some("1") => "HDD",
                _ => "SSD",
            }
            .to_string();
            let is_internal = read_attr(&path, "removable").as_deref() != Some("1");

            records.push(StorageRecord {
                name: name.clone(),
                protocol: protocol.clone(),
                medium_type: medium_type.clone(),
                is_whole: true,
                is_internal,
            });

            for child in Self::list_dir(&path).unwrap_or_default() {
                if path.join(&child).join("partition").exists() {
                    records.push(StorageRecord {
                        name: child,
                        protocol: protocol.clone(),
                        medium_type: medium_type.clone(),
                        is_whole: false,
                        is_internal,
                    });
                }
            }
        }
        Ok(records)
    }

    fn usb_devices(&self) -> Result<Vec<UsbRecord>> {
        let dir = self.root.join("bus/usb/devices");
        let mut records = Vec::new();

        for name in Self::list_dir(&dir)? {
            // Interfaces and root hubs are not devices.
            if name.contains(':') || name.starts_with("usb") {
                continue;
            }
            let path = dir.join(&name);
            let busnum: u32 = read_attr(&path, "busnum").and_then(|b| b.parse().ok()).unwrap_or(0);
            let devpath = read_attr(&path, "devpath").unwrap_or_default();
            records.push(UsbRecord {
                product_name: read_attr(&path, "product").unwrap_or_default(),
                vendor_name: read_attr(&path, "manufacturer").unwrap_or_default(),
                product_id: read_attr(&path, "idProduct").map(|v| parse_hex_prefix(&v) as u16).unwrap_or(0),
                vendor_id: read_attr(&path, "idVendor").map(|v| parse_hex_prefix(&v) as u16).unwrap_or(0),
                location_id: usb_location_id(busnum, &devpath),
            });
        }
        Ok(records)
    }

    fn gpu_core_count(&self) -> Result<u32> {
        Err(Error::unavailable("GPU core count is not exposed through sysfs"))
    }
}

impl MembershipSource for LinuxCollector {
    /// Rendered as one `<marker> <ifname>` line per bridge port.
    fn bridge_membership(&self, bridge: &str) -> Result<String> {
        let ports = Self::list_dir(&self.root.join("class/net").join(bridge).join("brif"))?;
        let mut out = format!("{}:\n", bridge);
        for port in ports {
            out.push_str(&format!("\t{} {}\n", self.member_marker, port));
        }
        Ok(out)
    }

    fn hardware_ports(&self) -> Result<String> {
        Err(Error::unavailable("hardware port listing is macOS only"))
    }
}
