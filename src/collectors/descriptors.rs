//! The descriptor catalog: every metric the exporter can emit, built once at
//! startup and shared by both collectors.
//!
//! Metric names form a flat, stable namespace under `libvirtd_`. Kinds
//! follow the accumulator-vs-point-in-time rule: cumulative counts and time
//! sums are counters, states and sizes are gauges.

use crate::metrics::{MetricDesc, MetricKind};

const UUID: &[&str] = &["uuid"];
const UUID_VCPU: &[&str] = &["uuid", "vcpu"];
const UUID_INTERFACE: &[&str] = &["uuid", "interface"];
// Device ordinal and backing path together: the ordinal is not stable
// across enumeration order changes and the path is not unique across slots.
const UUID_DEVICE_PATH: &[&str] = &["uuid", "device", "path"];
const WORKLOAD: &[&str] = &["uuid", "instance_type", "user_id", "project_id"];
const VERSION: &[&str] = &["driver", "driver_version", "version"];

/// Immutable table of every metric descriptor.
#[derive(Debug)]
pub struct DescriptorCatalog {
    pub(crate) domain_seconds: MetricDesc,

    pub(crate) domain_state: MetricDesc,
    pub(crate) domain_state_reason: MetricDesc,

    pub(crate) cpu_time: MetricDesc,
    pub(crate) cpu_user: MetricDesc,
    pub(crate) cpu_system: MetricDesc,

    pub(crate) balloon_current: MetricDesc,
    pub(crate) balloon_maximum: MetricDesc,

    pub(crate) vcpu_state: MetricDesc,
    pub(crate) vcpu_time: MetricDesc,

    pub(crate) net_rx_bytes: MetricDesc,
    pub(crate) net_rx_packets: MetricDesc,
    pub(crate) net_rx_errors: MetricDesc,
    pub(crate) net_rx_drop: MetricDesc,
    pub(crate) net_tx_bytes: MetricDesc,
    pub(crate) net_tx_packets: MetricDesc,
    pub(crate) net_tx_errors: MetricDesc,
    pub(crate) net_tx_drop: MetricDesc,

    pub(crate) block_rd_reqs: MetricDesc,
    pub(crate) block_rd_bytes: MetricDesc,
    pub(crate) block_rd_times: MetricDesc,
    pub(crate) block_wr_reqs: MetricDesc,
    pub(crate) block_wr_bytes: MetricDesc,
    pub(crate) block_wr_times: MetricDesc,
    pub(crate) block_fl_reqs: MetricDesc,
    pub(crate) block_fl_times: MetricDesc,
    pub(crate) block_allocation: MetricDesc,
    pub(crate) block_capacity: MetricDesc,
    pub(crate) block_physical: MetricDesc,

    pub(crate) version_info: MetricDesc,
}

impl DescriptorCatalog {
    pub fn new() -> Self {
        Self {
            domain_seconds: MetricDesc::new(
                "libvirtd_domain_seconds",
                "seconds since creation time",
                WORKLOAD,
                MetricKind::Counter,
            ),

            domain_state: MetricDesc::new(
                "libvirtd_domain_domain_state",
                "state of the VM (virDomainState enum)",
                UUID,
                MetricKind::Gauge,
            ),
            domain_state_reason: MetricDesc::new(
                "libvirtd_domain_domain_state_reason",
                "reason for entering given state (virDomain*Reason enum)",
                UUID,
                MetricKind::Gauge,
            ),

            cpu_time: MetricDesc::new(
                "libvirtd_domain_cpu_time",
                "total cpu time spent for this domain in nanoseconds",
                UUID,
                MetricKind::Counter,
            ),
            cpu_user: MetricDesc::new(
                "libvirtd_domain_cpu_user",
                "user cpu time spent in nanoseconds",
                UUID,
                MetricKind::Counter,
            ),
            cpu_system: MetricDesc::new(
                "libvirtd_domain_cpu_system",
                "system cpu time spent in nanoseconds",
                UUID,
                MetricKind::Counter,
            ),

            balloon_current: MetricDesc::new(
                "libvirtd_domain_balloon_current",
                "the memory in kiB currently used",
                UUID,
                MetricKind::Gauge,
            ),
            balloon_maximum: MetricDesc::new(
                "libvirtd_domain_balloon_maximum",
                "the maximum memory in kiB allowed",
                UUID,
                MetricKind::Gauge,
            ),

            vcpu_state: MetricDesc::new(
                "libvirtd_domain_vcpu_state",
                "state of the virtual CPU (virVcpuState enum)",
                UUID_VCPU,
                MetricKind::Gauge,
            ),
            vcpu_time: MetricDesc::new(
                "libvirtd_domain_vcpu_time",
                "virtual cpu time spent",
                UUID_VCPU,
                MetricKind::Counter,
            ),

            net_rx_bytes: MetricDesc::new(
                "libvirtd_domain_net_rx_bytes",
                "bytes received",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_rx_packets: MetricDesc::new(
                "libvirtd_domain_net_rx_packets",
                "packets received",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_rx_errors: MetricDesc::new(
                "libvirtd_domain_net_rx_errors",
                "receive errors",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_rx_drop: MetricDesc::new(
                "libvirtd_domain_net_rx_drop",
                "receive packets dropped",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_tx_bytes: MetricDesc::new(
                "libvirtd_domain_net_tx_bytes",
                "bytes transmitted",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_tx_packets: MetricDesc::new(
                "libvirtd_domain_net_tx_packets",
                "packets transmitted",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            net_tx_errors: MetricDesc::new(
                "libvirtd_domain_net_tx_errors",
                "transmission errors",
                UUID_INTERFACE,
                MetricKind::Counter,
            ),
            // tx_drop has historically been exported as a gauge, unlike its
            // rx sibling; the kind is kept stable for existing dashboards.
            net_tx_drop: MetricDesc::new(
                "libvirtd_domain_net_tx_drop",
                "transmit packets dropped",
                UUID_INTERFACE,
                MetricKind::Gauge,
            ),

            block_rd_reqs: MetricDesc::new(
                "libvirtd_domain_block_read_requests",
                "number of read requests",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_rd_bytes: MetricDesc::new(
                "libvirtd_domain_block_read_bytes",
                "number of read bytes",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_rd_times: MetricDesc::new(
                "libvirtd_domain_block_read_times",
                "total time (ns) spent on reads",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_wr_reqs: MetricDesc::new(
                "libvirtd_domain_block_write_requests",
                "number of written requests",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_wr_bytes: MetricDesc::new(
                "libvirtd_domain_block_write_bytes",
                "number of written bytes",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_wr_times: MetricDesc::new(
                "libvirtd_domain_block_write_times",
                "total time (ns) spent on writes",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_fl_reqs: MetricDesc::new(
                "libvirtd_domain_block_flush_requests",
                "total flush requests",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_fl_times: MetricDesc::new(
                "libvirtd_domain_block_flush_times",
                "total time (ns) spent on cache flushing",
                UUID_DEVICE_PATH,
                MetricKind::Counter,
            ),
            block_allocation: MetricDesc::new(
                "libvirtd_domain_block_allocation",
                "offset of the highest written sector",
                UUID_DEVICE_PATH,
                MetricKind::Gauge,
            ),
            block_capacity: MetricDesc::new(
                "libvirtd_domain_block_capacity",
                "logical size in bytes of the block device backing image",
                UUID_DEVICE_PATH,
                MetricKind::Gauge,
            ),
            block_physical: MetricDesc::new(
                "libvirtd_domain_block_physical",
                "physical size in bytes of the container of the backing image",
                UUID_DEVICE_PATH,
                MetricKind::Gauge,
            ),

            version_info: MetricDesc::new(
                "libvirtd_info",
                "Version details for LibvirtD",
                VERSION,
                MetricKind::Counter,
            ),
        }
    }
}

impl Default for DescriptorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_drop_kind_differs_from_rx_drop() {
        let catalog = DescriptorCatalog::new();
        assert_eq!(catalog.net_rx_drop.kind(), MetricKind::Counter);
        assert_eq!(catalog.net_tx_drop.kind(), MetricKind::Gauge);
    }

    #[test]
    fn test_block_descriptors_share_label_set() {
        let catalog = DescriptorCatalog::new();
        let block_descs = [
            &catalog.block_rd_reqs,
            &catalog.block_rd_bytes,
            &catalog.block_rd_times,
            &catalog.block_wr_reqs,
            &catalog.block_wr_bytes,
            &catalog.block_wr_times,
            &catalog.block_fl_reqs,
            &catalog.block_fl_times,
            &catalog.block_allocation,
            &catalog.block_capacity,
            &catalog.block_physical,
        ];
        for desc in block_descs {
            assert_eq!(desc.labels(), &["uuid", "device", "path"]);
        }
    }
}
