/// Entry point for the Virtd Exporter binary.
///
/// Initializes logging, connects to the hypervisor daemon and serves the
/// Prometheus scrape endpoint until the process is stopped.
///
/// # Errors
///
/// Returns an error if the initial hypervisor connection cannot be
/// established or the listen address is unusable.
///
/// # Examples
///
/// ```bash
/// LIBVIRT_URI=qemu:///system LISTEN_ADDRESS=0.0.0.0:9474 virtd-exporter
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    virtd_exporter::run().await
}
