use serde::Serialize;

use super::topology::Bus;

// --- Raw records handed over by inventory sources ---

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageRecord {
    pub name: String,
    pub protocol: String,
    pub medium_type: String,
    pub is_whole: bool,
    pub is_internal: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsbRecord {
    pub product_name: String,
    pub vendor_name: String,
    pub product_id: u16,
    pub vendor_id: u16,
    pub location_id: u32,
}

// --- Snapshot entries ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StorageItem {
    pub name: String,
    pub device_name: String,
    pub protocol: String,
    pub medium_type: String,
    pub is_internal: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsbDevice {
    pub name: String,
    pub manufacturer: String,
    pub product_id: String,
    pub vendor_id: String,
    pub location_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsbBus {
    pub name: String,
    pub devices: Vec<UsbDevice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    pub name: String,
    pub cores: String,
    pub model: String,
    pub vendor: String,
}

/// Static hardware listing captured once per cache.
///
/// Each class is filled independently, so a failed source leaves only its own
/// list empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InventorySnapshot {
    pub fabric: Vec<Bus>,
    pub storage: Vec<StorageItem>,
    pub usb: Vec<UsbBus>,
    pub displays: Vec<DisplayItem>,
}
