//! Hand-rolled hypervisor fakes for collector tests.

use std::sync::Arc;

use crate::connection::ConnectionManager;
use crate::hypervisor::{
    self, Connection, DomainRef, DomainStats, DomainStatsRecord, StatCategories,
};

#[derive(Debug, Clone)]
pub struct FakeDomain {
    /// `None` makes UUID resolution fail.
    pub uuid: Option<&'static str>,
    /// `None` makes the metadata lookup fail.
    pub metadata_xml: Option<String>,
}

impl FakeDomain {
    pub fn new(uuid: &'static str) -> Self {
        Self {
            uuid: Some(uuid),
            metadata_xml: None,
        }
    }
}

impl DomainRef for FakeDomain {
    fn uuid_string(&self) -> hypervisor::Result<String> {
        self.uuid
            .map(str::to_owned)
            .ok_or_else(|| hypervisor::Error::api("virDomainGetUUIDString", "domain went away"))
    }

    fn metadata_xml(&self, _namespace_uri: &str) -> hypervisor::Result<String> {
        self.metadata_xml
            .clone()
            .ok_or_else(|| hypervisor::Error::api("virDomainGetMetadata", "metadata not found"))
    }
}

pub struct FakeConnection {
    /// `None` makes the liveness check itself fail.
    pub alive: Option<bool>,
    pub driver: &'static str,
    pub hyp_version: u32,
    pub lib_version: u32,
    pub fail_versions: bool,
    pub fail_stats: bool,
    pub domains: Vec<(FakeDomain, DomainStats)>,
}

impl FakeConnection {
    pub fn healthy() -> Self {
        Self {
            alive: Some(true),
            driver: "QEMU",
            hyp_version: 0,
            lib_version: 0,
            fail_versions: false,
            fail_stats: false,
            domains: Vec::new(),
        }
    }

    pub fn into_manager(self) -> Arc<ConnectionManager<Self>> {
        Arc::new(ConnectionManager::new(self))
    }
}

impl Connection for FakeConnection {
    type Domain = FakeDomain;

    fn connect(_uri: &str) -> hypervisor::Result<Self> {
        Ok(Self::healthy())
    }

    fn is_alive(&self) -> hypervisor::Result<bool> {
        self.alive
            .ok_or_else(|| hypervisor::Error::api("virConnectIsAlive", "i/o timeout"))
    }

    fn uri(&self) -> hypervisor::Result<String> {
        Ok("test:///default".to_owned())
    }

    fn driver_type(&self) -> hypervisor::Result<String> {
        if self.fail_versions {
            return Err(hypervisor::Error::api("virConnectGetType", "not connected"));
        }
        Ok(self.driver.to_owned())
    }

    fn hypervisor_version(&self) -> hypervisor::Result<u32> {
        if self.fail_versions {
            return Err(hypervisor::Error::api("virConnectGetVersion", "not connected"));
        }
        Ok(self.hyp_version)
    }

    fn library_version(&self) -> hypervisor::Result<u32> {
        if self.fail_versions {
            return Err(hypervisor::Error::api(
                "virConnectGetLibVersion",
                "not connected",
            ));
        }
        Ok(self.lib_version)
    }

    fn all_domain_stats(
        &self,
        _categories: StatCategories,
    ) -> hypervisor::Result<Vec<DomainStatsRecord<FakeDomain>>> {
        if self.fail_stats {
            return Err(hypervisor::Error::api(
                "virConnectGetAllDomainStats",
                "daemon restarting",
            ));
        }
        Ok(self
            .domains
            .iter()
            .map(|(domain, stats)| DomainStatsRecord {
                domain: domain.clone(),
                stats: stats.clone(),
            })
            .collect())
    }
}
