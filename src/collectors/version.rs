//! Daemon identity reporting.
//!
//! Emits a single info-style sample per scrape: the value is a constant `1`
//! and the identity lives entirely in the labels (driver name, hypervisor
//! version, daemon library version).

use std::sync::Arc;

use crate::connection::ConnectionManager;
use crate::hypervisor::Connection;
use crate::metrics::{Collector, MetricDesc, MetricSample};

use super::DescriptorCatalog;

pub struct VersionCollector<C: Connection> {
    manager: Arc<ConnectionManager<C>>,
    descs: Arc<DescriptorCatalog>,
}

impl<C: Connection> VersionCollector<C> {
    pub fn new(manager: Arc<ConnectionManager<C>>, descs: Arc<DescriptorCatalog>) -> Self {
        Self { manager, descs }
    }
}

impl<C: Connection> Collector for VersionCollector<C> {
    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.descs.version_info]
    }

    fn collect(&self) -> Vec<MetricSample> {
        let conn = match self.manager.ensure_live() {
            Ok(conn) => conn,
            Err(err) => {
                super::log_connection_unavailable("version collector", &err);
                return Vec::new();
            }
        };

        let driver = match conn.driver_type() {
            Ok(driver) => driver,
            Err(err) => {
                log::error!("version collector: failed to read driver type: {err}");
                return Vec::new();
            }
        };
        let hypervisor = match conn.hypervisor_version() {
            Ok(version) => version,
            Err(err) => {
                log::error!("version collector: failed to read hypervisor version: {err}");
                return Vec::new();
            }
        };
        let library = match conn.library_version() {
            Ok(version) => version,
            Err(err) => {
                log::error!("version collector: failed to read library version: {err}");
                return Vec::new();
            }
        };

        vec![self.descs.version_info.sample(
            vec![driver, format_version(hypervisor), format_version(library)],
            1.0,
        )]
    }
}

/// Formats a version encoded as `major * 1_000_000 + minor * 1_000 + release`
/// as a dotted `major.minor.release` string.
fn format_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version / 1_000_000,
        version / 1_000 % 1_000,
        version % 1_000
    )
}
