//! End-to-end checks of the sampling context with injected sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use boltwatch::collectors::{
    CounterSource, InventorySource, MembershipSource, SwitchEnumerator,
};
use boltwatch::config::Config;
use boltwatch::controller::Monitor;
use boltwatch::error::{Error, Result};
use boltwatch::inventory::InventoryCache;
use boltwatch::model::{
    DiskIoMetric, DiskUsage, HostIdentity, MemoryInfo, NetMetric, ReceptacleStatus, StorageRecord,
    Switch, UsbRecord,
};
use boltwatch::view::{Presenter, render_tree};

// ── fakes ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Calls {
    switches: AtomicUsize,
    storage: AtomicUsize,
    usb: AtomicUsize,
    gpu: AtomicUsize,
}

struct FakeInventory {
    calls: Arc<Calls>,
    switches: Vec<Switch>,
    storage_fails: bool,
}

impl SwitchEnumerator for FakeInventory {
    fn switches(&self) -> Result<Vec<Switch>> {
        self.calls.switches.fetch_add(1, Ordering::SeqCst);
        Ok(self.switches.clone())
    }
}

impl InventorySource for FakeInventory {
    fn storage_devices(&self) -> Result<Vec<StorageRecord>> {
        self.calls.storage.fetch_add(1, Ordering::SeqCst);
        if self.storage_fails {
            return Err(Error::malformed("SPStorageDataType: expected array"));
        }
        Ok(vec![
            StorageRecord { name: "disk0".into(), is_whole: true, is_internal: true, ..Default::default() },
            StorageRecord { name: "disk0s1".into(), is_whole: false, ..Default::default() },
        ])
    }

    fn usb_devices(&self) -> Result<Vec<UsbRecord>> {
        self.calls.usb.fetch_add(1, Ordering::SeqCst);
        Ok(vec![UsbRecord {
            product_name: "Keyboard".into(),
            vendor_id: 0x5ac,
            ..Default::default()
        }])
    }

    fn gpu_core_count(&self) -> Result<u32> {
        self.calls.gpu.fetch_add(1, Ordering::SeqCst);
        Err(Error::unavailable("no GPU"))
    }
}

struct FakeMembership;

impl MembershipSource for FakeMembership {
    fn bridge_membership(&self, bridge: &str) -> Result<String> {
        Ok(format!("{}: flags=8863<UP>\n\tmember: en2 flags=3<LEARNING,DISCOVER>\n", bridge))
    }

    fn hardware_ports(&self) -> Result<String> {
        Err(Error::unavailable("networksetup"))
    }
}

/// Interface and disk counters that grow by a fixed step on every read.
#[derive(Default)]
struct FakeCounters {
    reads: AtomicU64,
    disk_reads: AtomicU64,
    fail: bool,
    no_interfaces: bool,
}

impl CounterSource for FakeCounters {
    fn net_metrics(&self) -> Result<HashMap<String, NetMetric>> {
        if self.fail {
            return Err(Error::unavailable("getifaddrs failed"));
        }
        if self.no_interfaces {
            return Ok(HashMap::new());
        }
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        let metric = |name: &str, base: u64| NetMetric {
            name: name.to_string(),
            bytes_recv: base + n * 1000,
            bytes_sent: base + n * 500,
            packets_recv: n,
            packets_sent: n,
        };
        Ok([metric("en0", 10), metric("en2", 20), metric("bridge0", 30), metric("tb1", 40)]
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect())
    }

    fn memory(&self) -> Result<MemoryInfo> {
        Ok(MemoryInfo { total: 16 << 30, used: 8 << 30, available: 8 << 30, ..Default::default() })
    }

    fn uptime_secs(&self) -> Result<u64> {
        Err(Error::unavailable("kern.boottime"))
    }

    fn disk_usage(&self) -> Result<Vec<DiskUsage>> {
        Ok(vec![DiskUsage::new("/".into(), "disk3s1".into(), "apfs".into(), 1000, 400)])
    }

    fn disk_io(&self) -> Result<HashMap<String, DiskIoMetric>> {
        if self.fail {
            return Err(Error::unavailable("IOBlockStorageDriver"));
        }
        let n = self.disk_reads.fetch_add(1, Ordering::SeqCst);
        let metric = DiskIoMetric { name: "disk3".into(), read_bytes: 4096 * n, written_bytes: 1024 * n };
        Ok(HashMap::from([("disk3".to_string(), metric)]))
    }

    fn host_identity(&self) -> Result<HostIdentity> {
        Ok(HostIdentity {
            hostname: "studio.local".into(),
            os_version: "15.1".into(),
            kernel_version: "24.1.0".into(),
            boot_time: 1_700_000_000,
        })
    }
}

fn host(uid: u64) -> Switch {
    Switch { uid, depth: 0, link_speed: 14, vendor_name: "Apple Inc.".into(), ..Default::default() }
}

fn attached(uid: u64, parent_uid: u64, name: &str) -> Switch {
    Switch {
        uid,
        parent_uid,
        depth: 1,
        device_name: name.into(),
        vendor_name: "OWC".into(),
        link_speed: 14,
        current_speed: 12,
        ..Default::default()
    }
}

fn inventory(switches: Vec<Switch>, storage_fails: bool) -> (FakeInventory, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    (FakeInventory { calls: Arc::clone(&calls), switches, storage_fails }, calls)
}

fn monitor(fail_counters: bool, switches: Vec<Switch>) -> Monitor {
    let (inv, _) = inventory(switches, false);
    Monitor::with_sources(
        Box::new(FakeCounters { fail: fail_counters, ..Default::default() }),
        Box::new(FakeMembership),
        Box::new(inv),
        &Config::default(),
    )
}

// ── inventory cache ─────────────────────────────────────────────────────────

#[test]
fn inventory_is_captured_once() {
    let (inv, calls) = inventory(vec![host(0x10), attached(0x11, 0x10, "Dock")], false);
    let cache = InventoryCache::new(Box::new(inv));

    let first = cache.get();
    let second = cache.get();
    assert!(Arc::ptr_eq(&first, &second));

    assert_eq!(calls.switches.load(Ordering::SeqCst), 1);
    assert_eq!(calls.storage.load(Ordering::SeqCst), 1);
    assert_eq!(calls.usb.load(Ordering::SeqCst), 1);
    assert_eq!(calls.gpu.load(Ordering::SeqCst), 1);

    assert_eq!(first.fabric.len(), 1);
    assert_eq!(first.fabric[0].connected_devices.len(), 1);
    assert_eq!(first.storage.len(), 1);
    assert_eq!(first.usb[0].devices[0].vendor_id, "0x05ac");
    assert!(first.displays.is_empty());
}

#[test]
fn concurrent_first_access_builds_once() {
    let (inv, calls) = inventory(vec![host(0x10)], false);
    let cache = Arc::new(InventoryCache::new(Box::new(inv)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get())
        })
        .collect();
    let snapshots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.switches.load(Ordering::SeqCst), 1);
    assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn failing_class_leaves_siblings_intact() {
    let (inv, _) = inventory(vec![host(0x10)], true);
    let snapshot = InventoryCache::new(Box::new(inv)).get();
    assert!(snapshot.storage.is_empty());
    assert_eq!(snapshot.fabric.len(), 1);
    assert_eq!(snapshot.usb.len(), 1);
}

// ── topology through the context ────────────────────────────────────────────

#[test]
fn orphan_devices_are_dropped_without_error() {
    let m = monitor(false, vec![host(0x10), attached(0x11, 0x10, "Dock"), attached(0x12, 0x77, "Ghost")]);
    let snapshot = m.inventory();
    assert_eq!(snapshot.fabric.len(), 1);
    let bus = &snapshot.fabric[0];
    assert_eq!(bus.receptacle.as_ref().unwrap().status, ReceptacleStatus::Connected);
    let names: Vec<&str> = bus.connected_devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Dock"]);

    assert_eq!(
        render_tree(&snapshot.fabric),
        "ϟ TB5 Bus 0 (Active) @ Up to 80 Gb/s\n  └─ Dock (OWC, TB4)"
    );
}

// ── fabric throughput ───────────────────────────────────────────────────────

#[test]
fn fabric_rates_only_cover_fabric_interfaces() {
    let m = monitor(false, Vec::new());
    let rates = m.fabric_rates().unwrap();
    let names: Vec<&str> = rates.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["bridge0", "en2", "tb1"]);
    assert!(rates.iter().all(|r| r.bytes_in_per_sec == 0.0));

    let rates = m.fabric_rates().unwrap();
    assert!(rates.iter().all(|r| r.bytes_in_per_sec > 0.0 && r.bytes_out_per_sec > 0.0));
    assert!(rates.iter().all(|r| r.bytes_in_per_sec >= r.bytes_out_per_sec));
}

#[test]
fn unavailable_counters_produce_no_data() {
    let mut m = monitor(true, vec![host(0x10)]);
    assert!(m.fabric_rates().unwrap_err().is_unavailable());

    m.update();
    let data = m.last_data.as_ref().unwrap();
    assert!(data.fabric_net.is_none());
    assert_eq!(data.inventory.fabric.len(), 1);
    assert!(data.host.memory.is_some());
    assert!(data.host.uptime_secs.is_none());
    assert_eq!(data.host.disks.len(), 1);
    assert!(data.host.disk_io.is_none());
    assert!(data.host.identity.is_some());

    let text = Presenter::render_text(data);
    assert!(text.contains("No data."));
    assert!(text.contains("TB5 Bus 0"));
}

#[test]
fn update_reuses_cached_inventory() {
    let mut m = monitor(false, vec![host(0x10)]);
    m.update();
    let first = Arc::clone(&m.last_data.as_ref().unwrap().inventory);
    m.update();
    let second = Arc::clone(&m.last_data.as_ref().unwrap().inventory);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(m.last_data.as_ref().unwrap().fabric_net.as_ref().unwrap().len(), 3);
}

#[test]
fn classifier_members_are_frozen() {
    let m = monitor(false, Vec::new());
    let mut members: Vec<String> = m.classifier().members().iter().cloned().collect();
    members.sort();
    assert_eq!(members, ["bridge0", "en2"]);
    assert!(m.classifier().is_member("thunderbolt0"));
    assert!(!m.classifier().is_member("en0"));
}

#[test]
fn no_interfaces_is_data_not_a_failure() {
    let (inv, _) = inventory(Vec::new(), false);
    let mut m = Monitor::with_sources(
        Box::new(FakeCounters { no_interfaces: true, ..Default::default() }),
        Box::new(FakeMembership),
        Box::new(inv),
        &Config::default(),
    );
    m.update();
    let data = m.last_data.as_ref().unwrap();
    assert_eq!(data.fabric_net.as_deref(), Some(&[][..]));
    let text = Presenter::render_text(data);
    assert!(text.contains("No Thunderbolt interfaces."));
    assert!(!text.contains("No data."));
}

// ── host section ────────────────────────────────────────────────────────────

#[test]
fn host_section_carries_identity_and_disk_rates() {
    let mut m = monitor(false, Vec::new());
    m.update();
    m.update();
    let host = &m.last_data.as_ref().unwrap().host;

    assert_eq!(host.identity.as_ref().unwrap().hostname, "studio.local");
    let io = host.disk_io.as_ref().unwrap();
    assert_eq!(io.len(), 1);
    assert_eq!(io[0].read_bytes, 4096);
    assert!(io[0].read_per_sec > 0.0);
    assert!(io[0].read_per_sec >= io[0].write_per_sec);

    let text = Presenter::render_host(host);
    assert!(text.contains("studio.local"));
    assert!(text.contains("kernel 24.1.0"));
    assert!(text.contains("Disk IO disk3"));
}
