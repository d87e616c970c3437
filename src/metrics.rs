//! Reconcile-outcome counters, exposed over the REST API's `/metrics`
//! endpoint when the `metrics` feature is enabled. Kept separate from
//! `tracing` output: logs answer "what happened on this one pass", metrics
//! answer "how often does this happen".

use once_cell::sync::Lazy;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use std::sync::Mutex;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReconcileLabels {
    pub controller: &'static str,
    pub outcome: &'static str,
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::default()));
static RECONCILES: Lazy<Family<ReconcileLabels, Counter>> = Lazy::new(|| {
    let family = Family::<ReconcileLabels, Counter>::default();
    REGISTRY
        .lock()
        .unwrap()
        .register("reconciles_total", "Total reconcile passes by controller and outcome", family.clone());
    family
});

/// Records one reconcile pass's outcome (`"ok"`, `"requeue"`, or `"error"`)
/// for either `"cluster"` or `"machine"`.
pub fn record_reconcile(controller: &'static str, outcome: &'static str) {
    RECONCILES.get_or_create(&ReconcileLabels { controller, outcome }).inc();
}

/// Renders the registry in Prometheus text exposition format.
pub fn encode_metrics() -> String {
    let mut buf = String::new();
    encode(&mut buf, &REGISTRY.lock().unwrap()).expect("metrics encoding is infallible for in-memory buffers");
    buf
}
