//! Plain-data statistics bundles returned by the batched domain-stats call.
//!
//! One [`DomainStatsRecord`] is produced per running domain and scrape. Every
//! category the daemon did not report stays `None` (or empty, for the
//! per-entity arrays); consumers must treat absence as "not reported", never
//! as zero. The arrays are rebuilt from scratch on each scrape, so their
//! indices are only meaningful within a single bundle.

use bitflags::bitflags;

bitflags! {
    /// Statistics categories requested from the daemon in one batched call.
    ///
    /// The bit values mirror the daemon's stats-group bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatCategories: u32 {
        const STATE     = 1 << 0;
        const CPU_TOTAL = 1 << 1;
        const BALLOON   = 1 << 2;
        const VCPU      = 1 << 3;
        const INTERFACE = 1 << 4;
        const BLOCK     = 1 << 5;
    }
}

impl StatCategories {
    /// Every category the exporter scrapes.
    pub fn scrape() -> Self {
        Self::STATE
            | Self::CPU_TOTAL
            | Self::BALLOON
            | Self::VCPU
            | Self::INTERFACE
            | Self::BLOCK
    }
}

/// Domain lifecycle state with the reason it was entered.
///
/// Both values are raw enum ordinals as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateStats {
    pub state: i32,
    pub reason: i32,
}

/// Cumulative CPU time consumed by the domain, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuStats {
    /// Total CPU time (user + system).
    pub time: u64,
    /// Time spent in user space.
    pub user: u64,
    /// Time spent in kernel space.
    pub system: u64,
}

/// Memory balloon readings, in kibibytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalloonStats {
    /// Memory currently used by the domain.
    pub current: u64,
    /// Maximum memory the domain is allowed.
    pub maximum: u64,
}

/// Per-virtual-CPU readings. The vCPU's ordinal is its position in the
/// bundle's array; the array length tracks the configured vCPU count at
/// scrape time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VcpuStats {
    /// Run state, as the daemon's raw enum ordinal.
    pub state: i32,
    /// Cumulative run time in nanoseconds.
    pub time: u64,
}

/// Per-network-interface counters. Interface names are unique within a
/// domain only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetInterfaceStats {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
}

/// Per-block-device counters and sizes. The device's ordinal is its position
/// in the bundle's array; neither the ordinal nor the backing path is unique
/// on its own, so consumers label by both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockDeviceStats {
    /// Path of the backing file or device.
    pub path: String,
    /// Read requests.
    pub rd_reqs: u64,
    /// Bytes read.
    pub rd_bytes: u64,
    /// Total time spent on reads, in nanoseconds.
    pub rd_times: u64,
    /// Write requests.
    pub wr_reqs: u64,
    /// Bytes written.
    pub wr_bytes: u64,
    /// Total time spent on writes, in nanoseconds.
    pub wr_times: u64,
    /// Flush requests.
    pub fl_reqs: u64,
    /// Total time spent on cache flushes, in nanoseconds.
    pub fl_times: u64,
    /// Offset of the highest written sector, in bytes.
    pub allocation: u64,
    /// Logical size of the backing image, in bytes.
    pub capacity: u64,
    /// Physical size of the backing image container, in bytes.
    pub physical: u64,
}

/// All statistics categories reported for one domain in one scrape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainStats {
    pub state: Option<StateStats>,
    pub cpu: Option<CpuStats>,
    pub balloon: Option<BalloonStats>,
    pub vcpus: Vec<VcpuStats>,
    pub nets: Vec<NetInterfaceStats>,
    pub blocks: Vec<BlockDeviceStats>,
}

/// A domain handle paired with the statistics reported for it.
///
/// The handle is released when the record is dropped.
#[derive(Debug)]
pub struct DomainStatsRecord<D> {
    pub domain: D,
    pub stats: DomainStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_categories_cover_all_six() {
        let categories = StatCategories::scrape();
        assert!(categories.contains(StatCategories::STATE));
        assert!(categories.contains(StatCategories::CPU_TOTAL));
        assert!(categories.contains(StatCategories::BALLOON));
        assert!(categories.contains(StatCategories::VCPU));
        assert!(categories.contains(StatCategories::INTERFACE));
        assert!(categories.contains(StatCategories::BLOCK));
        assert_eq!(categories.bits(), 0b11_1111);
    }
}
