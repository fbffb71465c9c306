//! The two metric collectors and their shared descriptor catalog.
//!
//! Each scrape runs both collectors independently: [`VersionCollector`]
//! reports daemon identity, [`DomainStatsCollector`] enumerates every
//! active domain and maps its statistics categories to samples. They share
//! nothing but the connection manager and the immutable
//! [`DescriptorCatalog`], so a failure in one never affects the other.

mod descriptors;
mod domain_stats;
pub mod nova;
mod version;

#[cfg(test)]
mod testutil;

pub use descriptors::DescriptorCatalog;
pub use domain_stats::DomainStatsCollector;
pub use version::VersionCollector;

use crate::connection;

/// Logs a failed connection acquisition, calling out the unrecoverable case.
fn log_connection_unavailable(collector: &str, err: &connection::Error) {
    if err.is_fatal() {
        log::error!("{collector}: cannot recover the hypervisor connection, emitting nothing: {err}");
    } else {
        log::error!("{collector}: hypervisor connection unavailable, emitting nothing: {err}");
    }
}
