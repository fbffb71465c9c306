//! The scrape endpoint: renders collector samples as Prometheus text format
//! and serves them over HTTP.
//!
//! The renderer is the only place that knows about the exposition library;
//! collectors hand over plain samples and descriptors. A fresh registry is
//! assembled per scrape so every response is a self-contained snapshot.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tokio::net::ToSocketAddrs;

use crate::metrics::{Collector, MetricDesc, MetricKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to assemble metrics snapshot: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("metrics encoding produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Turns collector samples into the text exposition format.
pub struct MetricsRenderer {
    collectors: Vec<Box<dyn Collector + Send + Sync>>,
    descs: HashMap<&'static str, MetricDesc>,
}

impl MetricsRenderer {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
            descs: HashMap::new(),
        }
    }

    /// Registers a collector, recording its descriptors. `describe` is
    /// invoked exactly once, here.
    pub fn register(&mut self, collector: Box<dyn Collector + Send + Sync>) {
        for desc in collector.describe() {
            self.descs.insert(desc.name(), desc.clone());
        }
        self.collectors.push(collector);
    }

    /// Runs every collector and renders the combined snapshot.
    ///
    /// Collector failures surface as missing samples, never as a render
    /// error; partial output is always preferred over none.
    pub fn render(&self) -> Result<String, Error> {
        let registry = Registry::new();
        let mut counters: HashMap<&'static str, CounterVec> = HashMap::new();
        let mut gauges: HashMap<&'static str, GaugeVec> = HashMap::new();

        for collector in &self.collectors {
            for sample in collector.collect() {
                let Some(desc) = self.descs.get(sample.name()) else {
                    log::error!("dropping sample `{}`: no registered descriptor", sample.name());
                    continue;
                };
                let values: Vec<&str> = sample.label_values().iter().map(String::as_str).collect();
                match desc.kind() {
                    MetricKind::Counter => {
                        let vec = match counters.entry(desc.name()) {
                            Entry::Occupied(entry) => entry.into_mut(),
                            Entry::Vacant(entry) => {
                                let vec = CounterVec::new(
                                    Opts::new(desc.name(), desc.help()),
                                    desc.labels(),
                                )?;
                                registry.register(Box::new(vec.clone()))?;
                                entry.insert(vec)
                            }
                        };
                        // The exposition library rejects negative counter
                        // increments; a sample below zero renders as 0.
                        vec.with_label_values(&values)
                            .inc_by(sample.value().max(0.0));
                    }
                    MetricKind::Gauge => {
                        let vec = match gauges.entry(desc.name()) {
                            Entry::Occupied(entry) => entry.into_mut(),
                            Entry::Vacant(entry) => {
                                let vec = GaugeVec::new(
                                    Opts::new(desc.name(), desc.help()),
                                    desc.labels(),
                                )?;
                                registry.register(Box::new(vec.clone()))?;
                                entry.insert(vec)
                            }
                        };
                        vec.with_label_values(&values).set(sample.value());
                    }
                }
            }
        }

        let mut buf = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Default for MetricsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

async fn serve_metrics(State(renderer): State<Arc<MetricsRenderer>>) -> Response {
    let rendered = tokio::task::spawn_blocking(move || renderer.render())
        .await
        .expect("metrics collection panicked");

    match rendered {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            log::error!("failed to render metrics: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to render metrics",
            )
                .into_response()
        }
    }
}

pub struct ExporterServer {
    router: axum::Router,
}

impl ExporterServer {
    pub fn new(renderer: Arc<MetricsRenderer>, metrics_path: &str) -> Self {
        let mut router = axum::Router::new()
            .route(metrics_path, get(serve_metrics))
            .with_state(renderer);

        if metrics_path != "/" {
            let page = landing_page(metrics_path);
            router = router.route("/", get(move || std::future::ready(Html(page.clone()))));
        }

        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("TCP Listener bind");
        axum::serve(listener, self.router.into_make_service())
            .await
            .expect("HTTP server failed")
    }
}

fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html><head><title>Virtd Exporter</title></head>\
         <body><h1>Virtd Exporter</h1>\
         <p><a href=\"{metrics_path}\">Metrics</a></p></body></html>"
    )
}
