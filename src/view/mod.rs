mod shared;
mod topology;

use std::io::{self, Write};

use chrono::{DateTime, Local};
use crossterm::{cursor, execute, terminal};

use crate::model::{HostInfo, InventorySnapshot, MonitorData, RateResult};

pub use shared::{format_bytes, format_bytes_rate, format_number, format_uptime, truncate_str};
pub use topology::{
    ACTIVE_ICON, FormattedBus, FormattedDevice, INACTIVE_ICON, format_bus, normalize_mode,
    render_tree,
};

/// Longest interface or device name shown before truncation.
const NAME_WIDTH: usize = 28;

pub struct Presenter;

impl Presenter {
    /// Full plain-text snapshot.
    pub fn render_text(data: &MonitorData) -> String {
        let mut sections = vec![
            format!("boltwatch  {}", data.time),
            Self::render_host(&data.host),
            format!("Thunderbolt\n{}", render_tree(&data.inventory.fabric)),
            Self::render_rates(data.fabric_net.as_deref()),
        ];
        let inventory = Self::render_inventory(&data.inventory);
        if !inventory.is_empty() {
            sections.push(inventory);
        }
        sections.join("\n\n")
    }

    pub fn render_host(host: &HostInfo) -> String {
        let mut lines = Vec::new();
        if let Some(id) = &host.identity {
            let booted = DateTime::from_timestamp(id.boot_time as i64, 0)
                .filter(|_| id.boot_time > 0)
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!(
                "Host    {}  OS {}, kernel {}, booted {}",
                id.hostname, id.os_version, id.kernel_version, booted
            ));
        }
        if let Some(mem) = &host.memory {
            lines.push(format!(
                "Memory  {} / {} used, swap {} / {}",
                format_bytes(mem.used),
                format_bytes(mem.total),
                format_bytes(mem.swap_used),
                format_bytes(mem.swap_total),
            ));
        }
        if let Some(secs) = host.uptime_secs {
            lines.push(format!("Uptime  {}", format_uptime(secs)));
        }
        for disk in &host.disks {
            lines.push(format!(
                "Disk    {:<20} {:>10} free of {:>10} ({:.1}% used)",
                truncate_str(&disk.mount_point, 20),
                format_bytes(disk.free),
                format_bytes(disk.total),
                disk.used_percent,
            ));
        }
        for io in host.disk_io.iter().flatten() {
            lines.push(format!(
                "Disk IO {:<20} read {:>12}  write {:>12}",
                truncate_str(&io.name, 20),
                format_bytes_rate(io.read_per_sec),
                format_bytes_rate(io.write_per_sec),
            ));
        }
        if lines.is_empty() {
            lines.push("Host counters unavailable.".to_string());
        }
        lines.join("\n")
    }

    pub fn render_rates(rates: Option<&[RateResult]>) -> String {
        let Some(rates) = rates else {
            return "Thunderbolt network\nNo data.".to_string();
        };
        if rates.is_empty() {
            return "Thunderbolt network\nNo Thunderbolt interfaces.".to_string();
        }

        let mut lines = vec!["Thunderbolt network".to_string()];
        for r in rates {
            lines.push(format!(
                "  {:<width$} ↓ {:>12}  ↑ {:>12}  ({} pkts in, {} pkts out)",
                truncate_str(&r.name, NAME_WIDTH),
                format_bytes_rate(r.bytes_in_per_sec),
                format_bytes_rate(r.bytes_out_per_sec),
                format_number(r.packets_in),
                format_number(r.packets_out),
                width = NAME_WIDTH,
            ));
        }
        lines.join("\n")
    }

    pub fn render_inventory(snapshot: &InventorySnapshot) -> String {
        let mut lines = Vec::new();

        if !snapshot.storage.is_empty() {
            lines.push("Storage".to_string());
            for disk in &snapshot.storage {
                let location = if disk.is_internal { "internal" } else { "external" };
                lines.push(format!(
                    "  {} ({}, {}, {})",
                    truncate_str(&disk.name, NAME_WIDTH),
                    disk.protocol,
                    disk.medium_type,
                    location
                ));
            }
        }

        for bus in &snapshot.usb {
            lines.push(bus.name.clone());
            for dev in &bus.devices {
                let maker = if dev.manufacturer.is_empty() { "unknown vendor" } else { dev.manufacturer.as_str() };
                lines.push(format!(
                    "  {} ({}, {}:{}, {})",
                    truncate_str(&dev.name, NAME_WIDTH),
                    maker,
                    dev.vendor_id,
                    dev.product_id,
                    dev.location_id
                ));
            }
        }

        for display in &snapshot.displays {
            lines.push(format!("GPU     {} ({} cores)", display.name, display.cores));
        }

        lines.join("\n")
    }

    pub fn render_json(data: &MonitorData) -> serde_json::Result<String> {
        #[derive(serde::Serialize)]
        struct JsonSnapshot<'a> {
            #[serde(flatten)]
            data: &'a MonitorData,
            thunderbolt: Vec<FormattedBus>,
        }

        let buses = data.inventory.fabric.iter().map(format_bus).collect();
        serde_json::to_string_pretty(&JsonSnapshot { data, thunderbolt: buses })
    }

    /// Clear the terminal and home the cursor before the next frame.
    pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
        execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))
    }
}
