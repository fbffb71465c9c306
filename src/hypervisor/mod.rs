//! Abstraction over the hypervisor management daemon.
//!
//! The collectors never talk to a concrete client library; they go through
//! the [`Connection`] and [`DomainRef`] traits defined here. A libvirt-backed
//! implementation lives in the `libvirt` submodule behind the cargo feature
//! of the same name, so the rest of the crate builds and tests without the
//! native library installed.
//!
//! # Resource handling
//!
//! Both the daemon connection and per-domain handles are released on drop.
//! This replaces the explicit `close()`/`release()` calls of the underlying
//! C-style API and guarantees cleanup even when a scrape bails out halfway
//! through a batch.

mod error;
pub mod params;
mod stats;

#[cfg(feature = "libvirt")]
mod libvirt;

pub use error::{Error, Result};
pub use stats::{
    BalloonStats, BlockDeviceStats, CpuStats, DomainStats, DomainStatsRecord, NetInterfaceStats,
    StatCategories, StateStats, VcpuStats,
};

#[cfg(feature = "libvirt")]
pub use libvirt::LibvirtConnection;

/// Handle to a single domain within a stats batch.
pub trait DomainRef {
    /// The domain's stable UUID in canonical string form.
    fn uuid_string(&self) -> Result<String>;

    /// XML metadata blob registered under the given namespace URI, if any.
    fn metadata_xml(&self, namespace_uri: &str) -> Result<String>;
}

/// A live connection to the hypervisor daemon.
///
/// Implementations must be safe to share across threads: the exporter holds
/// exactly one connection and both collectors issue calls on it, possibly
/// concurrently. Dropping the connection closes it.
pub trait Connection: Sized + Send + Sync {
    type Domain: DomainRef;

    /// Opens a new connection to the daemon at `uri`.
    fn connect(uri: &str) -> Result<Self>;

    /// Asks the daemon whether this handle is still usable.
    fn is_alive(&self) -> Result<bool>;

    /// The URI this connection was opened against.
    fn uri(&self) -> Result<String>;

    /// Name of the hypervisor driver (e.g. `QEMU`).
    fn driver_type(&self) -> Result<String>;

    /// Hypervisor version encoded as `major * 1_000_000 + minor * 1_000 + release`.
    fn hypervisor_version(&self) -> Result<u32>;

    /// Daemon library version, encoded like [`Connection::hypervisor_version`].
    fn library_version(&self) -> Result<u32>;

    /// Fetches the requested statistics categories for all active domains in
    /// one batched round trip, yielding a consistent point-in-time view
    /// across categories.
    fn all_domain_stats(
        &self,
        categories: StatCategories,
    ) -> Result<Vec<DomainStatsRecord<Self::Domain>>>;
}
