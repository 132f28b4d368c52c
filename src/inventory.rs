//! Lazily captured, process-lifetime hardware inventory.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::collectors::InventorySource;
use crate::error::Result;
use crate::model::{
    DisplayItem, InventorySnapshot, StorageItem, StorageRecord, UsbBus, UsbDevice, UsbRecord,
};
use crate::topology::build_buses;

/// Name given to the synthetic display entry built from the GPU core count.
pub const GPU_DISPLAY_NAME: &str = "Apple GPU";

/// Captures the static inventory on first access and hands out the same
/// snapshot afterwards. The source is never queried again.
pub struct InventoryCache {
    source: Box<dyn InventorySource>,
    snapshot: Mutex<Option<Arc<InventorySnapshot>>>,
}

impl InventoryCache {
    pub fn new(source: Box<dyn InventorySource>) -> Self {
        Self {
            source,
            snapshot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Arc<InventorySnapshot> {
        let mut slot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(snapshot) = slot.as_ref() {
            return Arc::clone(snapshot);
        }

        let snapshot = Arc::new(self.capture());
        debug!(
            buses = snapshot.fabric.len(),
            disks = snapshot.storage.len(),
            usb = snapshot.usb.iter().map(|b| b.devices.len()).sum::<usize>(),
            displays = snapshot.displays.len(),
            "inventory captured"
        );
        *slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    fn capture(&self) -> InventorySnapshot {
        InventorySnapshot {
            fabric: or_empty("thunderbolt", self.source.switches().map(|s| build_buses(&s))),
            storage: or_empty("storage", self.source.storage_devices().map(|r| storage_items(&r))),
            usb: or_empty("usb", self.source.usb_devices().map(|r| usb_buses(&r))),
            displays: or_empty("displays", self.source.gpu_core_count().map(display_items)),
        }
    }
}

fn or_empty<T>(class: &str, result: Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) if e.is_unavailable() => {
            debug!(class, error = %e, "device class unavailable");
            Vec::new()
        }
        Err(e) => {
            warn!(class, error = %e, "device class skipped");
            Vec::new()
        }
    }
}

/// Whole disks only; partitions and volumes are dropped.
pub fn storage_items(records: &[StorageRecord]) -> Vec<StorageItem> {
    records
        .iter()
        .filter(|r| r.is_whole)
        .map(|r| StorageItem {
            name: r.name.clone(),
            device_name: r.name.clone(),
            protocol: r.protocol.clone(),
            medium_type: r.medium_type.clone(),
            is_internal: r.is_internal,
        })
        .collect()
}

/// Named devices grouped under a single `USB` bus. No bus when nothing is
/// named.
pub fn usb_buses(records: &[UsbRecord]) -> Vec<UsbBus> {
    let devices: Vec<UsbDevice> = records
        .iter()
        .filter(|r| !r.product_name.is_empty())
        .map(|r| UsbDevice {
            name: r.product_name.clone(),
            manufacturer: r.vendor_name.clone(),
            product_id: format!("0x{:04x}", r.product_id),
            vendor_id: format!("0x{:04x}", r.vendor_id),
            location_id: format!("0x{:08x}", r.location_id),
        })
        .collect();

    if devices.is_empty() {
        return Vec::new();
    }
    vec![UsbBus { name: "USB".to_string(), devices }]
}

pub fn display_items(cores: u32) -> Vec<DisplayItem> {
    if cores == 0 {
        return Vec::new();
    }
    vec![DisplayItem {
        name: GPU_DISPLAY_NAME.to_string(),
        cores: cores.to_string(),
        model: String::new(),
        vendor: String::new(),
    }]
}
