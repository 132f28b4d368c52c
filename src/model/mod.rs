// Re-export all model types from submodules.

pub use host::{DiskIoMetric, DiskIoRate, DiskUsage, HostIdentity, HostInfo, MemoryInfo, MonitorData};
pub use inventory::{
    DisplayItem, InventorySnapshot, StorageItem, StorageRecord, UsbBus, UsbDevice, UsbRecord,
};
pub use network::{NetMetric, RateResult};
pub use topology::{Bus, Device, Generation, Receptacle, ReceptacleStatus, Switch};

mod host;
mod inventory;
mod network;
mod topology;
