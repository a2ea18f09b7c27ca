use std::collections::HashMap;

use lazy_static::lazy_static;
use prometheus::{register_gauge_vec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::{CertMetricsError, Result};
use crate::labels::{LabelTuple, LABEL_NAMES};
use crate::metrics::ExpirationSink;
use crate::{METRIC_HELP, METRIC_NAME};

lazy_static! {
    static ref DEFAULT_SINK: PrometheusSink = PrometheusSink {
        gauge: register_gauge_vec!(METRIC_NAME, METRIC_HELP, &LABEL_NAMES)
            .expect("expiration gauge registers once in the default registry"),
    };
}

/// Expiration gauge backed by a prometheus [`GaugeVec`].
#[derive(Clone, Debug)]
pub struct PrometheusSink {
    gauge: GaugeVec,
}

impl PrometheusSink {
    /// Creates the expiration gauge and registers it in `registry`.
    ///
    /// Fails when the registry already holds a collector with the same name.
    pub fn new(registry: &Registry) -> Result<Self> {
        let gauge = GaugeVec::new(Opts::new(METRIC_NAME, METRIC_HELP), &LABEL_NAMES)?;
        registry.register(Box::new(gauge.clone()))?;
        Ok(PrometheusSink { gauge })
    }

    /// The gauge registered in the prometheus default registry.
    pub fn default_registry() -> &'static PrometheusSink {
        &DEFAULT_SINK
    }

    pub fn gauge(&self) -> &GaugeVec {
        &self.gauge
    }

    /// Drops the series for `labels`. Returns false if it did not exist.
    pub fn remove(&self, labels: &LabelTuple) -> bool {
        self.gauge.remove_label_values(&labels.values()).is_ok()
    }
}

impl ExpirationSink for PrometheusSink {
    fn set_value(&self, labels: &LabelTuple, value: f64) {
        // The label set always has exactly LABEL_NAMES.len() values.
        self.gauge.with_label_values(&labels.values()).set(value);
    }
}

/// Renders `registry` in the Prometheus text exposition format.
pub fn encode_text(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| CertMetricsError::Encoding {
            details: e.to_string(),
        })?;
    String::from_utf8(buffer).map_err(|e| CertMetricsError::Encoding {
        details: e.to_string(),
    })
}

/// Pushgateway destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushTarget {
    /// Gateway base address, e.g. `http://localhost:9091`
    pub address: String,
    pub job: String,
    pub instance: String,
}

impl PushTarget {
    pub fn new(address: impl Into<String>, job: impl Into<String>) -> Self {
        let job = job.into();
        PushTarget {
            address: address.into(),
            instance: job.clone(),
            job,
        }
    }

    /// push_metrics appends `/metrics/job/<job>` itself.
    fn url(&self) -> &str {
        self.address.trim_end_matches('/')
    }

    fn grouping(&self) -> HashMap<String, String> {
        let mut grouping = HashMap::new();
        grouping.insert("instance".to_owned(), self.instance.to_owned());
        grouping
    }
}

/// Pushes every metric family of `registry` to a Pushgateway.
pub fn push(registry: &Registry, target: &PushTarget) -> Result<()> {
    let metric_families = registry.gather();
    debug!(
        address = %target.address,
        job = %target.job,
        families = metric_families.len(),
        "pushing metrics"
    );
    prometheus::push_metrics(
        &target.job,
        target.grouping(),
        target.url(),
        metric_families,
        None,
    )
    .map_err(|e| CertMetricsError::Push {
        address: target.address.clone(),
        details: e.to_string(),
    })
}
