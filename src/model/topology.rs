use std::fmt;

use serde::Serialize;

/// One node of the flat hardware enumeration.
///
/// Depth 0 marks a host (bus-level) switch; anything deeper is a device that
/// points at its host switch through `parent_uid`. Speed fields carry the raw
/// link-speed codes reported by the platform (14 = 80 Gb/s, 12 = 40 Gb/s,
/// 8 = 20 Gb/s); 0 means the value was absent or unparseable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Switch {
    pub uid: u64,
    pub parent_uid: u64,
    pub depth: u32,
    pub vendor_id: u32,
    pub vendor_name: String,
    pub device_id: u32,
    pub device_name: String,
    pub link_speed: u32,
    pub current_speed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Generation {
    #[serde(rename = "TB3")]
    Tb3,
    #[serde(rename = "TB4")]
    Tb4,
    #[serde(rename = "TB5")]
    Tb5,
}

impl Generation {
    /// Map a link-speed code to a generation. Unknown speeds default to TB4.
    pub fn from_speed(speed: u32) -> Self {
        if speed >= 14 {
            Generation::Tb5
        } else if speed >= 12 {
            Generation::Tb4
        } else if speed > 0 {
            Generation::Tb3
        } else {
            Generation::Tb4
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Generation::Tb3 => 3,
            Generation::Tb4 => 4,
            Generation::Tb5 => 5,
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            Generation::Tb5 => "Up to 80 Gb/s",
            _ => "Up to 40 Gb/s",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TB{}", self.number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReceptacleStatus {
    #[serde(rename = "receptacle_no_devices_connected")]
    NoDevicesConnected,
    #[serde(rename = "receptacle_connected")]
    Connected,
}

impl ReceptacleStatus {
    pub fn is_connected(self) -> bool {
        self == ReceptacleStatus::Connected
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receptacle {
    pub status: ReceptacleStatus,
    pub current_speed: String,
    pub receptacle_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Device {
    pub name: String,
    pub vendor_name: String,
    pub vendor_id: String,
    pub device_id: String,
    pub switch_uid: String,
    pub mode: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bus {
    pub label: String,
    pub vendor_name: String,
    pub switch_uid: String,
    pub domain_uuid: String,
    pub receptacle: Option<Receptacle>,
    pub connected_devices: Vec<Device>,
}

impl Bus {
    /// A bus is active when its receptacle reports a connection, or, lacking
    /// receptacle data, when anything is attached to it.
    pub fn is_active(&self) -> bool {
        match &self.receptacle {
            Some(r) => r.status.is_connected(),
            None => !self.connected_devices.is_empty(),
        }
    }
}
