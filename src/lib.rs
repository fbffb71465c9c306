//! Virtd Exporter: a pull-based metrics exporter for a libvirt hypervisor
//! daemon.
//!
//! On every scrape the exporter asks the daemon for the statistics of all
//! active domains in one batched call and maps them to a flat metric
//! namespace, alongside a daemon-identity info metric. A dead connection is
//! detected and transparently reopened against its original URI.
//!
//! The collection pipeline is independent of both the concrete hypervisor
//! client (see [`hypervisor`]) and the exposition library (see [`server`]);
//! the `libvirt` cargo feature enables the real client backend and the
//! exporter binary.

pub mod collectors;
pub mod config;
pub mod connection;
pub mod hypervisor;
pub mod metrics;
pub mod server;

/// Runs the exporter: connects to the hypervisor, registers both
/// collectors, and serves the scrape endpoint until the process is stopped.
///
/// # Errors
///
/// Returns an error when the initial hypervisor connection cannot be
/// established. Later connection failures are handled per scrape and do not
/// terminate the process.
#[cfg(feature = "libvirt")]
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use collectors::{DescriptorCatalog, DomainStatsCollector, VersionCollector};
    use connection::ConnectionManager;
    use hypervisor::{Connection, LibvirtConnection};

    let config = config::Config::from_env();

    log::info!("connecting to hypervisor at `{}`", config.uri);
    let conn = LibvirtConnection::connect(&config.uri)?;
    let manager = Arc::new(ConnectionManager::new(conn));
    let descs = Arc::new(DescriptorCatalog::new());

    let mut renderer = server::MetricsRenderer::new();
    renderer.register(Box::new(VersionCollector::new(
        Arc::clone(&manager),
        Arc::clone(&descs),
    )));
    renderer.register(Box::new(DomainStatsCollector::new(
        manager,
        descs,
        config.nova_metadata,
    )));

    log::info!(
        "listening on {} (metrics at {})",
        config.listen_address,
        config.telemetry_path
    );
    server::ExporterServer::new(Arc::new(renderer), &config.telemetry_path)
        .listen(config.listen_address.as_str())
        .await;

    Ok(())
}
