//! Decides which network interfaces belong to the Thunderbolt fabric.
//!
//! Membership is computed once from the bridge and hardware-port listings and
//! then frozen: interfaces created or re-plugged after the first query are only
//! recognized through the naming heuristic.

use std::collections::HashSet;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::collectors::MembershipSource;
use crate::config::Config;

/// Names that identify fabric members without consulting any source.
#[derive(Clone, Debug)]
pub struct NamingRules {
    pub fabric_label: String,
    pub prefixes: Vec<String>,
}

impl NamingRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fabric_label: config.fabric_label.clone(),
            prefixes: config.interface_prefixes.clone(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.prefixes.iter().any(|p| !p.is_empty() && name.starts_with(p.as_str())) {
            return true;
        }
        !self.fabric_label.is_empty()
            && name.to_lowercase().contains(&self.fabric_label.to_lowercase())
    }
}

/// Collect members listed in a bridge query. Lines are trimmed before the
/// marker check; the member name is the first token after the marker.
pub fn parse_bridge_members(output: &str, marker: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(marker))
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Collect the device names of every hardware port whose label mentions the
/// fabric. The `Device:` line must immediately follow the label line.
pub fn parse_hardware_ports(output: &str, fabric_label: &str) -> Vec<String> {
    let lines: Vec<&str> = output.lines().collect();
    let mut devices = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(fabric_label) {
            continue;
        }
        let Some(next) = lines.get(i + 1) else {
            continue;
        };
        if next.starts_with("Device:") {
            if let Some(dev) = next.split_whitespace().nth(1) {
                devices.push(dev.to_string());
            }
        }
    }
    devices
}

pub struct InterfaceClassifier {
    source: Box<dyn MembershipSource>,
    bridge_interface: String,
    member_marker: String,
    rules: NamingRules,
    members: OnceLock<HashSet<String>>,
}

impl InterfaceClassifier {
    pub fn new(source: Box<dyn MembershipSource>, config: &Config) -> Self {
        Self {
            source,
            bridge_interface: config.bridge_interface.clone(),
            member_marker: config.member_marker.clone(),
            rules: NamingRules::from_config(config),
            members: OnceLock::new(),
        }
    }

    /// The frozen membership set. The first caller queries the sources;
    /// concurrent callers block until that query finishes.
    pub fn members(&self) -> &HashSet<String> {
        self.members.get_or_init(|| self.query_members())
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.members().contains(name) || self.rules.matches(name)
    }

    fn query_members(&self) -> HashSet<String> {
        let mut members = HashSet::new();

        match self.source.bridge_membership(&self.bridge_interface) {
            Ok(output) => {
                members.insert(self.bridge_interface.clone());
                members.extend(parse_bridge_members(&output, &self.member_marker));
            }
            Err(e) => debug!(bridge = %self.bridge_interface, error = %e, "bridge membership unavailable"),
        }

        match self.source.hardware_ports() {
            Ok(output) => members.extend(parse_hardware_ports(&output, &self.rules.fabric_label)),
            Err(e) if e.is_unavailable() => debug!(error = %e, "hardware port listing unavailable"),
            Err(e) => warn!(error = %e, "hardware port listing rejected"),
        }

        debug!(count = members.len(), "fabric interface set frozen");
        members
    }
}
