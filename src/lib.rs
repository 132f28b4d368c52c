//! Boltwatch: Thunderbolt topology, fabric network throughput and static
//! hardware inventory.
//!
//! This library exposes the core modules for use by the binary and by tests.

pub mod classifier;
pub mod collectors;
pub mod config;
pub mod controller;
pub mod error;
pub mod inventory;
pub mod model;
pub mod sampler;
pub mod topology;
pub mod view;
