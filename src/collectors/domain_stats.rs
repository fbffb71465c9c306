//! Per-domain statistics collection.
//!
//! All six statistics categories are fetched for every active domain in a
//! single batched call, so each scrape sees one consistent point-in-time
//! view per domain instead of six drifting round trips. The raw bundles are
//! then mapped to samples by pure functions: feeding the same bundle twice
//! yields the same sample sequence.
//!
//! Failures are contained per domain: a domain whose UUID cannot be
//! resolved, or whose workload metadata is missing or malformed, only loses
//! its own samples.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};

use crate::connection::ConnectionManager;
use crate::hypervisor::{Connection, DomainRef, DomainStats, StatCategories};
use crate::metrics::{Collector, MetricDesc, MetricSample};

use super::{DescriptorCatalog, nova};

pub struct DomainStatsCollector<C: Connection> {
    manager: Arc<ConnectionManager<C>>,
    descs: Arc<DescriptorCatalog>,
    /// Whether to read and report orchestration-layer instance metadata.
    workload_metadata: bool,
}

impl<C: Connection> DomainStatsCollector<C> {
    pub fn new(
        manager: Arc<ConnectionManager<C>>,
        descs: Arc<DescriptorCatalog>,
        workload_metadata: bool,
    ) -> Self {
        Self {
            manager,
            descs,
            workload_metadata,
        }
    }

    fn collect_workload_metadata(
        &self,
        uuid: &str,
        domain: &C::Domain,
        now: NaiveDateTime,
        out: &mut Vec<MetricSample>,
    ) {
        let xml = match domain.metadata_xml(nova::METADATA_NAMESPACE) {
            Ok(xml) => xml,
            Err(err) => {
                log::warn!("domain {uuid}: failed to read instance metadata: {err}");
                return;
            }
        };
        let meta = match nova::InstanceMetadata::parse(&xml) {
            Ok(meta) => meta,
            Err(err) => {
                log::warn!("domain {uuid}: {err}");
                return;
            }
        };

        out.push(self.descs.domain_seconds.sample(
            vec![
                uuid.to_owned(),
                meta.instance_type.clone(),
                meta.user_id.clone(),
                meta.project_id.clone(),
            ],
            meta.age_seconds(now),
        ));
    }
}

impl<C: Connection> Collector for DomainStatsCollector<C> {
    fn describe(&self) -> Vec<&MetricDesc> {
        let descs = &*self.descs;
        let mut all = vec![
            &descs.domain_state,
            &descs.domain_state_reason,
            &descs.cpu_time,
            &descs.cpu_user,
            &descs.cpu_system,
            &descs.balloon_current,
            &descs.balloon_maximum,
            &descs.vcpu_state,
            &descs.vcpu_time,
            &descs.net_rx_bytes,
            &descs.net_rx_packets,
            &descs.net_rx_errors,
            &descs.net_rx_drop,
            &descs.net_tx_bytes,
            &descs.net_tx_packets,
            &descs.net_tx_errors,
            &descs.net_tx_drop,
            &descs.block_rd_reqs,
            &descs.block_rd_bytes,
            &descs.block_rd_times,
            &descs.block_wr_reqs,
            &descs.block_wr_bytes,
            &descs.block_wr_times,
            &descs.block_fl_reqs,
            &descs.block_fl_times,
            &descs.block_allocation,
            &descs.block_capacity,
            &descs.block_physical,
        ];
        if self.workload_metadata {
            all.push(&descs.domain_seconds);
        }
        all
    }

    fn collect(&self) -> Vec<MetricSample> {
        let conn = match self.manager.ensure_live() {
            Ok(conn) => conn,
            Err(err) => {
                super::log_connection_unavailable("domain stats collector", &err);
                return Vec::new();
            }
        };

        let records = match conn.all_domain_stats(StatCategories::scrape()) {
            Ok(records) => records,
            Err(err) => {
                log::error!("domain stats collector: batched stats call failed: {err}");
                return Vec::new();
            }
        };

        let now = Utc::now().naive_utc();
        let mut out = Vec::new();
        for record in &records {
            let uuid = match record.domain.uuid_string() {
                Ok(uuid) => uuid,
                Err(err) => {
                    log::error!("skipping domain with unresolvable UUID: {err}");
                    continue;
                }
            };
            if self.workload_metadata {
                self.collect_workload_metadata(&uuid, &record.domain, now, &mut out);
            }
            map_domain_stats(&self.descs, &uuid, &record.stats, &mut out);
        }
        out
    }
}

/// Maps one domain's stat bundle to samples. Pure: no I/O, no clock.
///
/// Categories absent from the bundle contribute nothing; the empty arrays
/// behave the same way.
fn map_domain_stats(
    descs: &DescriptorCatalog,
    uuid: &str,
    stats: &DomainStats,
    out: &mut Vec<MetricSample>,
) {
    if let Some(state) = &stats.state {
        out.push(
            descs
                .domain_state
                .sample(vec![uuid.to_owned()], f64::from(state.state)),
        );
        out.push(
            descs
                .domain_state_reason
                .sample(vec![uuid.to_owned()], f64::from(state.reason)),
        );
    }

    if let Some(cpu) = &stats.cpu {
        out.push(descs.cpu_time.sample(vec![uuid.to_owned()], cpu.time as f64));
        out.push(descs.cpu_user.sample(vec![uuid.to_owned()], cpu.user as f64));
        out.push(
            descs
                .cpu_system
                .sample(vec![uuid.to_owned()], cpu.system as f64),
        );
    }

    if let Some(balloon) = &stats.balloon {
        out.push(
            descs
                .balloon_current
                .sample(vec![uuid.to_owned()], balloon.current as f64),
        );
        out.push(
            descs
                .balloon_maximum
                .sample(vec![uuid.to_owned()], balloon.maximum as f64),
        );
    }

    for (index, vcpu) in stats.vcpus.iter().enumerate() {
        let labels = vec![uuid.to_owned(), index.to_string()];
        out.push(
            descs
                .vcpu_state
                .sample(labels.clone(), f64::from(vcpu.state)),
        );
        out.push(descs.vcpu_time.sample(labels, vcpu.time as f64));
    }

    for net in &stats.nets {
        let sample = |value: u64, desc: &MetricDesc| {
            desc.sample(vec![uuid.to_owned(), net.name.clone()], value as f64)
        };
        out.push(sample(net.rx_bytes, &descs.net_rx_bytes));
        out.push(sample(net.rx_packets, &descs.net_rx_packets));
        out.push(sample(net.rx_errs, &descs.net_rx_errors));
        out.push(sample(net.rx_drop, &descs.net_rx_drop));
        out.push(sample(net.tx_bytes, &descs.net_tx_bytes));
        out.push(sample(net.tx_packets, &descs.net_tx_packets));
        out.push(sample(net.tx_errs, &descs.net_tx_errors));
        out.push(sample(net.tx_drop, &descs.net_tx_drop));
    }

    for (index, block) in stats.blocks.iter().enumerate() {
        let sample = |value: u64, desc: &MetricDesc| {
            desc.sample(
                vec![uuid.to_owned(), index.to_string(), block.path.clone()],
                value as f64,
            )
        };
        out.push(sample(block.rd_reqs, &descs.block_rd_reqs));
        out.push(sample(block.rd_bytes, &descs.block_rd_bytes));
        out.push(sample(block.rd_times, &descs.block_rd_times));
        out.push(sample(block.wr_reqs, &descs.block_wr_reqs));
        out.push(sample(block.wr_bytes, &descs.block_wr_bytes));
        out.push(sample(block.wr_times, &descs.block_wr_times));
        out.push(sample(block.fl_reqs, &descs.block_fl_reqs));
        out.push(sample(block.fl_times, &descs.block_fl_times));
        out.push(sample(block.allocation, &descs.block_allocation));
        out.push(sample(block.capacity, &descs.block_capacity));
        out.push(sample(block.physical, &descs.block_physical));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{FakeConnection, FakeDomain};
    use super::*;
    use crate::hypervisor::{
        BalloonStats, BlockDeviceStats, CpuStats, NetInterfaceStats, StateStats, VcpuStats,
    };
    use crate::metrics::MetricKind;

    const UUID_A: &str = "8b2a6b93-5d4e-4bb5-8a5c-1f8d0a5f9e01";
    const UUID_B: &str = "c3f0fe65-2a0c-4b90-9a2b-90c5f0c6de02";

    const NOVA_XML: &str = r#"
<instance xmlns="http://openstack.org/xmlns/libvirt/nova/1.0">
  <creationTime>2023-01-01 00:00:00</creationTime>
  <flavor name="m1.small"/>
  <owner>
    <user uuid="user-1">admin</user>
    <project uuid="project-1">demo</project>
  </owner>
</instance>
"#;

    fn full_bundle() -> DomainStats {
        DomainStats {
            state: Some(StateStats { state: 1, reason: 2 }),
            cpu: Some(CpuStats {
                time: 5_000,
                user: 3_000,
                system: 2_000,
            }),
            balloon: Some(BalloonStats {
                current: 1_048_576,
                maximum: 2_097_152,
            }),
            vcpus: vec![
                VcpuStats {
                    state: 1,
                    time: 100,
                },
                VcpuStats {
                    state: 1,
                    time: 200,
                },
            ],
            nets: vec![NetInterfaceStats {
                name: "vnet0".to_owned(),
                rx_bytes: 1,
                rx_packets: 2,
                rx_errs: 3,
                rx_drop: 4,
                tx_bytes: 5,
                tx_packets: 6,
                tx_errs: 7,
                tx_drop: 8,
            }],
            blocks: vec![
                BlockDeviceStats {
                    path: "/var/lib/images/disk.qcow2".to_owned(),
                    rd_reqs: 10,
                    ..Default::default()
                },
                // Same backing path in a second slot: only the ordinal
                // distinguishes them.
                BlockDeviceStats {
                    path: "/var/lib/images/disk.qcow2".to_owned(),
                    wr_reqs: 20,
                    ..Default::default()
                },
            ],
        }
    }

    fn map(stats: &DomainStats) -> Vec<MetricSample> {
        let descs = DescriptorCatalog::new();
        let mut out = Vec::new();
        map_domain_stats(&descs, UUID_A, stats, &mut out);
        out
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let bundle = full_bundle();
        assert_eq!(map(&bundle), map(&bundle));
    }

    #[test]
    fn test_full_bundle_sample_count() {
        // 2 state + 3 cpu + 2 balloon + 2*2 vcpu + 8 net + 2*11 block.
        assert_eq!(map(&full_bundle()).len(), 41);
    }

    #[test]
    fn test_absent_category_emits_no_samples() {
        let mut bundle = full_bundle();
        bundle.blocks.clear();
        bundle.cpu = None;

        let samples = map(&bundle);

        assert!(!samples.iter().any(|s| s.name().contains("_block_")));
        assert!(!samples.iter().any(|s| s.name().contains("_cpu_")));
        // The other categories are unaffected.
        assert!(samples.iter().any(|s| s.name().ends_with("_domain_state")));
        assert!(
            samples
                .iter()
                .any(|s| s.name().ends_with("_balloon_current"))
        );
    }

    #[test]
    fn test_block_samples_share_label_values() {
        let samples = map(&full_bundle());

        for device in ["0", "1"] {
            let block: Vec<_> = samples
                .iter()
                .filter(|s| s.name().contains("_block_") && s.label_values()[1] == device)
                .collect();
            assert_eq!(block.len(), 11);
            for sample in block {
                assert_eq!(
                    sample.label_values(),
                    &[
                        UUID_A.to_string(),
                        device.to_string(),
                        "/var/lib/images/disk.qcow2".to_string(),
                    ]
                );
            }
        }
    }

    #[test]
    fn test_drop_counters_keep_their_asymmetric_kinds() {
        let samples = map(&full_bundle());

        let kind_of = |name: &str| {
            samples
                .iter()
                .find(|s| s.name() == name)
                .map(MetricSample::kind)
                .unwrap()
        };
        assert_eq!(kind_of("libvirtd_domain_net_rx_drop"), MetricKind::Counter);
        assert_eq!(kind_of("libvirtd_domain_net_tx_drop"), MetricKind::Gauge);
    }

    #[test]
    fn test_state_maps_enum_ordinals() {
        let samples = map(&full_bundle());

        let state = samples
            .iter()
            .find(|s| s.name() == "libvirtd_domain_domain_state")
            .unwrap();
        assert_eq!(state.value(), 1.0);
        assert_eq!(state.label_values(), &[UUID_A.to_string()]);
        let reason = samples
            .iter()
            .find(|s| s.name() == "libvirtd_domain_domain_state_reason")
            .unwrap();
        assert_eq!(reason.value(), 2.0);
    }

    fn collector(conn: FakeConnection, workload_metadata: bool) -> DomainStatsCollector<FakeConnection> {
        DomainStatsCollector::new(
            conn.into_manager(),
            Arc::new(DescriptorCatalog::new()),
            workload_metadata,
        )
    }

    #[test]
    fn test_collect_skips_domain_without_uuid() {
        let mut conn = FakeConnection::healthy();
        let mut broken = FakeDomain::new(UUID_B);
        broken.uuid = None;
        conn.domains = vec![
            (FakeDomain::new(UUID_A), full_bundle()),
            (broken, full_bundle()),
        ];

        let samples = collector(conn, false).collect();

        assert_eq!(samples.len(), 41);
        assert!(
            samples
                .iter()
                .all(|s| s.label_values()[0] == UUID_A)
        );
    }

    #[test]
    fn test_collect_emits_workload_metadata_when_enabled() {
        let mut conn = FakeConnection::healthy();
        let mut domain = FakeDomain::new(UUID_A);
        domain.metadata_xml = Some(NOVA_XML.to_owned());
        conn.domains = vec![(domain, full_bundle())];

        let samples = collector(conn, true).collect();

        let seconds = samples
            .iter()
            .find(|s| s.name() == "libvirtd_domain_seconds")
            .expect("workload metadata sample");
        assert_eq!(seconds.kind(), MetricKind::Counter);
        assert_eq!(
            seconds.label_values(),
            &[
                UUID_A.to_string(),
                "m1.small".to_string(),
                "user-1".to_string(),
                "project-1".to_string(),
            ]
        );
        assert!(seconds.value() > 0.0);
        assert_eq!(samples.len(), 42);
    }

    #[test]
    fn test_malformed_metadata_only_skips_workload_metric() {
        let mut conn = FakeConnection::healthy();
        let mut domain = FakeDomain::new(UUID_A);
        domain.metadata_xml = Some("<instance><creationTime>bogus".to_owned());
        conn.domains = vec![(domain, full_bundle())];

        let samples = collector(conn, true).collect();

        assert!(!samples.iter().any(|s| s.name() == "libvirtd_domain_seconds"));
        assert_eq!(samples.len(), 41);
    }

    #[test]
    fn test_metadata_is_not_read_when_disabled() {
        let mut conn = FakeConnection::healthy();
        // No metadata on the domain: with the flag off this must not matter.
        conn.domains = vec![(FakeDomain::new(UUID_A), full_bundle())];

        let samples = collector(conn, false).collect();

        assert_eq!(samples.len(), 41);
    }

    #[test]
    fn test_batched_call_failure_emits_nothing() {
        let mut conn = FakeConnection::healthy();
        conn.fail_stats = true;
        conn.domains = vec![(FakeDomain::new(UUID_A), full_bundle())];

        assert!(collector(conn, false).collect().is_empty());
    }

    #[test]
    fn test_connection_unavailable_emits_nothing() {
        let mut conn = FakeConnection::healthy();
        conn.alive = None;

        assert!(collector(conn, false).collect().is_empty());
    }

    #[test]
    fn test_describe_is_stable_and_covers_collect() {
        let mut conn = FakeConnection::healthy();
        let mut domain = FakeDomain::new(UUID_A);
        domain.metadata_xml = Some(NOVA_XML.to_owned());
        conn.domains = vec![(domain, full_bundle())];
        let collector = collector(conn, true);

        let first: Vec<_> = collector.describe().iter().map(|d| d.name()).collect();
        let second: Vec<_> = collector.describe().iter().map(|d| d.name()).collect();
        assert_eq!(first, second);

        for sample in collector.collect() {
            assert!(
                first.contains(&sample.name()),
                "sample `{}` has no descriptor",
                sample.name()
            );
        }
    }

    #[test]
    fn test_describe_omits_workload_metric_when_disabled() {
        let collector = collector(FakeConnection::healthy(), false);
        assert!(
            !collector
                .describe()
                .iter()
                .any(|d| d.name() == "libvirtd_domain_seconds")
        );
    }
}
