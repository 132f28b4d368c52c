//! Display form of the bus/device tree.

use serde::Serialize;

use crate::model::Bus;

pub const ACTIVE_ICON: &str = "ϟ";
pub const INACTIVE_ICON: &str = "○";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedDevice {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vendor: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(rename = "info_string", skip_serializing_if = "String::is_empty")]
    pub info: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedBus {
    pub name: String,
    pub status: String,
    pub icon: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub speed: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<FormattedDevice>,
}

/// Short protocol name for a raw link mode (`thunderbolt_4` → `TB4`).
/// Unknown modes are title-cased.
pub fn normalize_mode(raw: &str) -> String {
    let mode = raw.to_lowercase().replace('_', " ");
    let has = |needles: &[&str]| needles.iter().any(|n| mode.contains(n));

    if has(&["thunderbolt 5", "thunderbolt5", "thunderbolt five", "tb5"]) {
        "TB5".to_string()
    } else if has(&["thunderbolt 4", "thunderbolt4", "thunderbolt four", "tb4"]) {
        "TB4".to_string()
    } else if has(&["thunderbolt 3", "thunderbolt3", "thunderbolt three", "tb3"]) {
        "TB3".to_string()
    } else if has(&["usb4", "usb 4"]) {
        "USB4".to_string()
    } else {
        title_case(&raw.replace('_', " "))
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Protocol a receptacle is actually running at, when its speed is a
/// negotiated value rather than an `Up to` capability.
fn active_protocol(speed: &str) -> Option<&'static str> {
    if speed.is_empty() || speed.contains("Up to") {
        None
    } else if speed.contains("120") || speed.contains("80") {
        Some("TB5")
    } else if speed.contains("40") {
        Some("TB4")
    } else if speed.contains("20") {
        Some("TB3")
    } else {
        None
    }
}

pub fn format_bus(bus: &Bus) -> FormattedBus {
    let active = bus.is_active();
    let speed = bus
        .receptacle
        .as_ref()
        .map(|r| r.current_speed.clone())
        .unwrap_or_default();

    let mut name = bus.label.clone();
    if active {
        if let Some(proto) = active_protocol(&speed) {
            if let Some((capability, rest)) = bus.label.split_once(' ') {
                if capability != proto {
                    name = format!("{} @ {} {}", capability, proto, rest);
                }
            }
        }
    }

    let devices = bus
        .connected_devices
        .iter()
        .map(|dev| {
            let mode = if dev.mode.is_empty() { String::new() } else { normalize_mode(&dev.mode) };
            let info = match (dev.vendor_name.is_empty(), mode.is_empty()) {
                (false, false) => format!("{}, {}", dev.vendor_name, mode),
                (false, true) => dev.vendor_name.clone(),
                (true, false) => mode.clone(),
                (true, true) => String::new(),
            };
            let name = if dev.name.is_empty() {
                format!("Device {}", dev.device_id)
            } else {
                dev.name.clone()
            };
            FormattedDevice { name, vendor: dev.vendor_name.clone(), mode, info }
        })
        .collect();

    FormattedBus {
        name,
        status: if active { "Active" } else { "Inactive" }.to_string(),
        icon: if active { ACTIVE_ICON } else { INACTIVE_ICON }.to_string(),
        speed,
        devices,
    }
}

/// Plain-text tree: one line per bus, one line per attached device.
pub fn render_tree(buses: &[Bus]) -> String {
    if buses.is_empty() {
        return "No Thunderbolt controllers found.".to_string();
    }

    let mut lines = Vec::new();
    for bus in buses.iter().map(format_bus) {
        let speed = if bus.speed.is_empty() { String::new() } else { format!(" @ {}", bus.speed) };
        lines.push(format!("{} {} ({}){}", bus.icon, bus.name, bus.status, speed));

        let last = bus.devices.len().saturating_sub(1);
        for (i, dev) in bus.devices.iter().enumerate() {
            let prefix = if i == last { "  └─" } else { "  ├─" };
            if dev.info.is_empty() {
                lines.push(format!("{} {}", prefix, dev.name));
            } else {
                lines.push(format!("{} {} ({})", prefix, dev.name, dev.info));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, Receptacle, ReceptacleStatus, Switch};
    use crate::topology::build_buses;

    fn device(name: &str, vendor: &str, mode: &str) -> Device {
        Device {
            name: name.into(),
            vendor_name: vendor.into(),
            vendor_id: "0x0001".into(),
            device_id: "0x0002".into(),
            switch_uid: "0x0000000000000001".into(),
            mode: mode.into(),
        }
    }

    fn bus(label: &str, speed: &str, status: ReceptacleStatus, devices: Vec<Device>) -> Bus {
        Bus {
            label: label.into(),
            vendor_name: "Apple Inc.".into(),
            switch_uid: "0x0000000000000000".into(),
            domain_uuid: "0".into(),
            receptacle: Some(Receptacle {
                status,
                current_speed: speed.into(),
                receptacle_id: "1".into(),
            }),
            connected_devices: devices,
        }
    }

    #[test]
    fn mode_normalization() {
        assert_eq!(normalize_mode("thunderbolt_five"), "TB5");
        assert_eq!(normalize_mode("Thunderbolt 4"), "TB4");
        assert_eq!(normalize_mode("thunderbolt3"), "TB3");
        assert_eq!(normalize_mode("TB5"), "TB5");
        assert_eq!(normalize_mode("usb_4"), "USB4");
        assert_eq!(normalize_mode("display_port"), "Display Port");
    }

    #[test]
    fn empty_topology_message() {
        assert_eq!(render_tree(&[]), "No Thunderbolt controllers found.");
    }

    #[test]
    fn tree_from_built_buses() {
        let switches = vec![
            Switch { uid: 0x10, depth: 0, link_speed: 14, ..Default::default() },
            Switch {
                uid: 0x100,
                parent_uid: 0x10,
                depth: 1,
                vendor_name: "CalDigit".into(),
                device_name: "TS5 Plus".into(),
                link_speed: 14,
                current_speed: 12,
                ..Default::default()
            },
            Switch {
                uid: 0x101,
                parent_uid: 0x10,
                depth: 1,
                device_name: "SSD".into(),
                link_speed: 8,
                ..Default::default()
            },
            Switch { uid: 0x21, depth: 0, link_speed: 12, ..Default::default() },
        ];
        let expected = "ϟ TB5 Bus 0 (Active) @ Up to 80 Gb/s\n\
                        \u{20}\u{20}├─ TS5 Plus (CalDigit, TB4)\n\
                        \u{20}\u{20}└─ SSD (TB3)\n\
                        ○ TB4 Bus 1 (Inactive) @ Up to 40 Gb/s";
        assert_eq!(render_tree(&build_buses(&switches)), expected);
    }

    #[test]
    fn device_without_vendor_or_mode_is_bare() {
        let b = bus("TB4 Bus 2", "", ReceptacleStatus::Connected, vec![device("Cable", "", "")]);
        assert_eq!(render_tree(&[b]), "ϟ TB4 Bus 2 (Active)\n  └─ Cable");
    }

    #[test]
    fn negotiated_speed_shows_active_protocol() {
        let b = bus("TB5 Bus 1", "40 Gb/s", ReceptacleStatus::Connected, vec![device("Dock", "OWC", "TB4")]);
        let f = format_bus(&b);
        assert_eq!(f.name, "TB5 @ TB4 Bus 1");
        assert_eq!(f.devices[0].info, "OWC, TB4");
    }

    #[test]
    fn matching_protocol_keeps_label() {
        let b = bus("TB4 Bus 1", "40 Gb/s", ReceptacleStatus::Connected, vec![]);
        assert_eq!(format_bus(&b).name, "TB4 Bus 1");
    }

    #[test]
    fn unnamed_device_uses_device_id() {
        let b = bus("TB4 Bus 0", "", ReceptacleStatus::Connected, vec![device("", "Acme", "")]);
        assert_eq!(format_bus(&b).devices[0].name, "Device 0x0002");
    }

    #[test]
    fn json_omits_empty_fields() {
        let b = bus("TB4 Bus 0", "", ReceptacleStatus::NoDevicesConnected, vec![]);
        let json = serde_json::to_value(format_bus(&b)).unwrap();
        assert_eq!(json["icon"], "○");
        assert!(json.get("speed").is_none());
        assert!(json.get("devices").is_none());
    }
}
