//! Sampling context: owns every data source and every piece of state that
//! survives between ticks.

mod host;

use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use crate::classifier::InterfaceClassifier;
use crate::collectors::{
    CounterSource, InventorySource, MembershipSource, linux::LinuxCollector, mac::MacCollector,
    native::SysinfoCounters,
};
use crate::config::Config;
use crate::error::Result;
use crate::inventory::InventoryCache;
use crate::model::{InventorySnapshot, MonitorData, RateResult};
use crate::sampler::{DiskIoSampler, RateSampler};

pub struct Monitor {
    counters: Box<dyn CounterSource>,
    classifier: InterfaceClassifier,
    sampler: RateSampler,
    disk_sampler: DiskIoSampler,
    inventory: InventoryCache,
    pub last_data: Option<MonitorData>,
}

impl Monitor {
    /// Monitor wired to the collectors of the running platform.
    pub fn new(config: &Config) -> Self {
        let counters: Box<dyn CounterSource> = Box::new(SysinfoCounters::new());

        let (membership, inventory): (Box<dyn MembershipSource>, Box<dyn InventorySource>) =
            if cfg!(target_os = "macos") {
                (Box::new(MacCollector::new()), Box::new(MacCollector::new()))
            } else {
                (
                    Box::new(
                        LinuxCollector::new(&config.sysfs_root)
                            .with_member_marker(config.member_marker.as_str()),
                    ),
                    Box::new(LinuxCollector::new(&config.sysfs_root)),
                )
            };

        Self::with_sources(counters, membership, inventory, config)
    }

    pub fn with_sources(
        counters: Box<dyn CounterSource>,
        membership: Box<dyn MembershipSource>,
        inventory: Box<dyn InventorySource>,
        config: &Config,
    ) -> Self {
        Self {
            counters,
            classifier: InterfaceClassifier::new(membership, config),
            sampler: RateSampler::new(),
            disk_sampler: DiskIoSampler::new(),
            inventory: InventoryCache::new(inventory),
            last_data: None,
        }
    }

    pub fn inventory(&self) -> Arc<InventorySnapshot> {
        self.inventory.get()
    }

    pub fn classifier(&self) -> &InterfaceClassifier {
        &self.classifier
    }

    /// Throughput of every fabric interface since the previous call. When the
    /// counter source fails the sampler state is left as it was.
    pub fn fabric_rates(&self) -> Result<Vec<RateResult>> {
        let current = self.counters.net_metrics()?;
        Ok(self
            .sampler
            .sample(&current, |name| self.classifier.is_member(name)))
    }

    pub fn update(&mut self) {
        let fabric_net = match self.fabric_rates() {
            Ok(rates) => Some(rates),
            Err(e) => {
                debug!(error = %e, "no fabric network data this tick");
                None
            }
        };

        self.last_data = Some(MonitorData {
            time: Local::now().format("%H:%M:%S").to_string(),
            host: host::collect(self.counters.as_ref(), &self.disk_sampler),
            inventory: self.inventory.get(),
            fabric_net,
        });
    }
}
