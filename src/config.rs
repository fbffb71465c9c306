//! Process configuration, read from environment variables.

use std::env;

pub const DEFAULT_URI: &str = "qemu:///system";
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9474";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

/// Runtime settings of the exporter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hypervisor connection URI (`LIBVIRT_URI`).
    pub uri: String,
    /// Whether to parse orchestration-layer instance metadata
    /// (`LIBVIRT_NOVA_METADATA`).
    pub nova_metadata: bool,
    /// Address the HTTP server binds to (`LISTEN_ADDRESS`).
    pub listen_address: String,
    /// Path the metrics are exposed under (`TELEMETRY_PATH`).
    pub telemetry_path: String,
}

impl Config {
    /// Reads the configuration from the environment, falling back to the
    /// defaults above for unset variables.
    pub fn from_env() -> Self {
        Self {
            uri: env::var("LIBVIRT_URI").unwrap_or_else(|_| DEFAULT_URI.to_owned()),
            nova_metadata: env::var("LIBVIRT_NOVA_METADATA").is_ok_and(|v| parse_bool(&v)),
            listen_address: env::var("LISTEN_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDRESS.to_owned()),
            telemetry_path: env::var("TELEMETRY_PATH")
                .unwrap_or_else(|_| DEFAULT_TELEMETRY_PATH.to_owned()),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
