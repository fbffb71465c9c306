//! Core metric model shared by every collector.
//!
//! A collector advertises a fixed set of [`MetricDesc`] descriptors up front
//! and emits [`MetricSample`] values for them on each scrape. The sink that
//! turns samples into an exposition format only ever sees these two types,
//! so the collection pipeline stays independent of any particular metrics
//! library.

/// Whether a metric is a monotonically increasing accumulator or a
/// point-in-time quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Immutable description of one metric: its name, help text, label names
/// and kind. Descriptors are built once at startup and shared by reference;
/// samples are tied to their descriptor through [`MetricDesc::sample`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    kind: MetricKind,
}

impl MetricDesc {
    pub const fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
        kind: MetricKind,
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Builds a sample for this descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the number of label values does not match the descriptor's
    /// label names. Label sets are fixed per descriptor, so a mismatch is a
    /// programming error rather than a runtime condition.
    pub fn sample(&self, label_values: Vec<String>, value: f64) -> MetricSample {
        assert_eq!(
            label_values.len(),
            self.labels.len(),
            "metric `{}` takes {} label value(s)",
            self.name,
            self.labels.len()
        );
        MetricSample {
            name: self.name,
            kind: self.kind,
            labels: self.labels,
            label_values,
            value,
        }
    }
}

/// One scraped value: metric identity, label values and the numeric reading.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    name: &'static str,
    kind: MetricKind,
    labels: &'static [&'static str],
    label_values: Vec<String>,
    value: f64,
}

impl MetricSample {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Label names, in the same order as [`MetricSample::label_values`].
    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A source of metric samples.
///
/// `describe` must be pure: no I/O, same descriptor set on every call.
/// `collect` performs the actual hypervisor round trips. Collectors never
/// fail outward; on error they log and return whatever samples they could
/// produce (possibly none).
pub trait Collector {
    fn describe(&self) -> Vec<&MetricDesc>;

    fn collect(&self) -> Vec<MetricSample>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DESC: MetricDesc = MetricDesc::new(
        "test_metric",
        "a metric for tests",
        &["uuid", "device"],
        MetricKind::Counter,
    );

    #[test]
    fn test_sample_pairs_labels_with_values() {
        let sample = TEST_DESC.sample(vec!["abc".into(), "0".into()], 42.0);

        assert_eq!(sample.name(), "test_metric");
        assert_eq!(sample.kind(), MetricKind::Counter);
        assert_eq!(sample.labels(), &["uuid", "device"]);
        assert_eq!(sample.label_values(), &["abc".to_string(), "0".to_string()]);
        assert_eq!(sample.value(), 42.0);
    }

    #[test]
    #[should_panic(expected = "takes 2 label value(s)")]
    fn test_sample_rejects_wrong_label_count() {
        TEST_DESC.sample(vec!["abc".into()], 1.0);
    }
}
