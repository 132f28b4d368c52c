//! Reconstruction of the bus/device tree from a flat switch enumeration.

use std::collections::HashMap;

use tracing::trace;

use crate::model::{Bus, Device, Generation, Receptacle, ReceptacleStatus, Switch};

/// Build one `Bus` per host switch and attach every reachable device to it.
///
/// Buses keep the input order of their host switches, devices the input order
/// of their switches. A device whose `parent_uid` names no host switch is
/// dropped.
pub fn build_buses(switches: &[Switch]) -> Vec<Bus> {
    let mut buses: Vec<Bus> = Vec::new();
    let mut uid_to_bus: HashMap<u64, usize> = HashMap::new();

    for sw in switches.iter().filter(|sw| sw.depth == 0) {
        let generation = switch_generation(sw);
        let bus_num = bus_number(sw.uid);

        uid_to_bus.insert(sw.uid, buses.len());
        buses.push(Bus {
            label: format!("{} Bus {}", generation, bus_num),
            vendor_name: sw.vendor_name.clone(),
            switch_uid: format_uid(sw.uid),
            domain_uuid: "0".to_string(),
            receptacle: Some(Receptacle {
                status: ReceptacleStatus::NoDevicesConnected,
                current_speed: generation.speed_label().to_string(),
                receptacle_id: (bus_num + 1).to_string(),
            }),
            connected_devices: Vec::new(),
        });
    }

    for sw in switches.iter().filter(|sw| sw.depth > 0) {
        let Some(&idx) = uid_to_bus.get(&sw.parent_uid) else {
            trace!(uid = %format_uid(sw.uid), parent = %format_uid(sw.parent_uid), "dropping orphaned switch");
            continue;
        };

        let bus = &mut buses[idx];
        bus.connected_devices.push(Device {
            name: sw.device_name.clone(),
            vendor_name: sw.vendor_name.clone(),
            vendor_id: format_id(sw.vendor_id),
            device_id: format_id(sw.device_id),
            switch_uid: format_uid(sw.uid),
            mode: switch_generation(sw).to_string(),
        });
        if let Some(r) = bus.receptacle.as_mut() {
            r.status = ReceptacleStatus::Connected;
        }
    }

    buses
}

/// Host switches are classified by their supported link speed, attached
/// devices by the negotiated speed when one was reported.
pub fn switch_generation(sw: &Switch) -> Generation {
    let speed = if sw.depth > 0 && sw.current_speed > 0 {
        sw.current_speed
    } else {
        sw.link_speed
    };
    Generation::from_speed(speed)
}

/// Low nibble of the switch uid. Collides once a machine has more than 16
/// host controllers.
pub fn bus_number(uid: u64) -> u64 {
    uid & 0xF
}

pub fn format_uid(uid: u64) -> String {
    format!("0x{:016X}", uid)
}

pub fn format_id(id: u32) -> String {
    format!("0x{:04X}", id)
}
