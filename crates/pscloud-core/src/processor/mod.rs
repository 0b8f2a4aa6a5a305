//! Domain processors: one response document in, gauge values out.
//!
//! Every processor follows the same steps: locate its container with the
//! navigator (failing with [`ProcessError::MissingContainer`] before writing
//! anything), walk the items, fall back to `"unknown"` for missing identity
//! labels, classify status strings, and omit absent numeric fields.

mod balance;
mod cloud;
mod domains;
mod invoices;
mod k8s;
mod lbaas;
mod projects;
mod servers;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use prometheus::GaugeVec;
use serde_json::Value;
use thiserror::Error;

use crate::document::Node;
use crate::metrics::MetricSet;
use crate::source::SourceKind;

/// Identity label value used when a document omits the field.
pub const UNKNOWN: &str = "unknown";

/// Label value of the aggregate series in `*_count{status}` vectors.
const TOTAL: &str = "total";

/// Healthy Kubernetes cluster and node group states.
pub const K8S_HEALTHY: &[&str] = &["CREATE_COMPLETE", "UPDATE_COMPLETE"];

/// Healthy state of servers, instances, load balancers and their children.
pub const ACTIVE: &[&str] = &["ACTIVE"];

/// Healthy domain state.
pub const DOMAIN_ACTIVE: &[&str] = &["active"];

/// Processor failure. Never aborts a cycle; the orchestrator logs it and flags
/// the source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// The document lacks the object or list the processor reads from.
    #[error("container `{path}` missing or of the wrong kind")]
    MissingContainer { path: String },
    /// A gauge rejected a write.
    #[error("metric update failed: {0}")]
    Metric(String),
}

impl From<prometheus::Error> for ProcessError {
    fn from(e: prometheus::Error) -> Self {
        ProcessError::Metric(e.to_string())
    }
}

/// Per-cycle inputs shared by all processors.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext {
    /// Reference instant for relative values such as days to domain expiry.
    pub now: DateTime<Utc>,
}

impl ProcessContext {
    pub fn now() -> Self {
        Self { now: Utc::now() }
    }
}

/// Runs the processor of `kind` over `doc`.
///
/// Returns the number of items written (1 for scalar documents).
pub fn process(
    kind: SourceKind,
    doc: &Value,
    metrics: &mut MetricSet,
    ctx: &ProcessContext,
) -> Result<usize, ProcessError> {
    match kind {
        SourceKind::Balance => balance::process(doc, metrics),
        SourceKind::DomainCounters => domains::process_counters(doc, metrics),
        SourceKind::Domains => domains::process_list(doc, metrics, ctx),
        SourceKind::Projects => projects::process(doc, metrics),
        SourceKind::Invoices => invoices::process(doc, metrics),
        SourceKind::CloudResources => cloud::process_resources(doc, metrics),
        SourceKind::CloudInstances => cloud::process_instances(doc, metrics),
        SourceKind::VpsServers => servers::process_vps(doc, metrics),
        SourceKind::VpcServersByService => servers::process_service(doc, metrics, "vpc"),
        SourceKind::VpsServersByService => servers::process_service(doc, metrics, "vps"),
        SourceKind::K8sClusters => k8s::process_clusters(doc, metrics),
        SourceKind::K8sProjects => k8s::process_projects(doc, metrics),
        SourceKind::LbaasLoadBalancers => lbaas::process(doc, metrics),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Resolves an object container.
fn object_at<'a>(doc: &'a Value, path: &[&str]) -> Result<Node<'a>, ProcessError> {
    let node = path.iter().fold(Node::new(doc), |n, key| n.key(key));
    match node.object() {
        Some(_) => Ok(node),
        None => Err(missing(path)),
    }
}

/// Resolves an item list container.
fn items_at<'a>(doc: &'a Value, path: &[&str]) -> Result<Node<'a>, ProcessError> {
    let node = path.iter().fold(Node::new(doc), |n, key| n.key(key));
    match node.array() {
        Some(_) => Ok(node),
        None => Err(missing(path)),
    }
}

/// The `count` reported next to an item list, if any.
fn reported_count(doc: &Value, items_path: &[&str]) -> Option<f64> {
    let (_, parent) = items_path.split_last()?;
    parent
        .iter()
        .fold(Node::new(doc), |n, key| n.key(key))
        .key("count")
        .f64()
}

fn missing(path: &[&str]) -> ProcessError {
    ProcessError::MissingContainer {
        path: path.join("."),
    }
}

/// Identity label with the `"unknown"` fallback.
fn identity(node: Node<'_>) -> String {
    node.non_empty_label().unwrap_or_else(|| UNKNOWN.to_string())
}

/// Status or type label with the `"unknown"` fallback. An empty string counts
/// as missing.
fn status_label(node: Node<'_>) -> String {
    node.non_empty_label().unwrap_or_else(|| UNKNOWN.to_string())
}

/// 1 for a healthy status, 0 for anything else.
fn status_value(status: &str, healthy: &[&str]) -> f64 {
    if healthy.contains(&status) { 1.0 } else { 0.0 }
}

fn put(vec: &GaugeVec, labels: &[&str], value: f64) -> Result<(), ProcessError> {
    vec.get_metric_with_label_values(labels)?.set(value);
    Ok(())
}

/// Per-value counter feeding the `*_count{status}` style vectors.
#[derive(Debug, Default)]
struct Tally(BTreeMap<String, u64>);

impl Tally {
    fn add(&mut self, value: &str) {
        *self.0.entry(value.to_string()).or_default() += 1;
    }

    /// Writes one series per counted value.
    fn write(&self, vec: &GaugeVec) -> Result<(), ProcessError> {
        for (value, count) in &self.0 {
            put(vec, &[value], *count as f64)?;
        }
        Ok(())
    }

    /// Like [`Tally::write`], plus a `total` series from the pagination count,
    /// falling back to the number of items seen. The `total` series is reserved:
    /// items whose own status is `"total"` only count towards it.
    fn write_with_total(
        &self,
        vec: &GaugeVec,
        reported: Option<f64>,
        seen: usize,
    ) -> Result<(), ProcessError> {
        put(vec, &[TOTAL], reported.unwrap_or(seen as f64))?;
        for (value, count) in self.0.iter().filter(|(value, _)| value.as_str() != TOTAL) {
            put(vec, &[value], *count as f64)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn status_classification() {
        assert_eq!(status_value("CREATE_COMPLETE", K8S_HEALTHY), 1.0);
        assert_eq!(status_value("UPDATE_COMPLETE", K8S_HEALTHY), 1.0);
        assert_eq!(status_value("CREATE_FAILED", K8S_HEALTHY), 0.0);
        assert_eq!(status_value("ACTIVE", ACTIVE), 1.0);
        assert_eq!(status_value("active", ACTIVE), 0.0);
        assert_eq!(status_value(UNKNOWN, ACTIVE), 0.0);
    }

    #[test]
    fn tally_writes_total_from_reported_count() {
        let m = metric_set();
        let mut tally = Tally::default();
        tally.add("ACTIVE");
        tally.add("ACTIVE");
        tally.add("ERROR");
        tally.write_with_total(&m.vps_server_count, Some(5.0), 3).unwrap();
        assert_eq!(value(&m.vps_server_count, &["ACTIVE"]), Some(2.0));
        assert_eq!(value(&m.vps_server_count, &["ERROR"]), Some(1.0));
        assert_eq!(value(&m.vps_server_count, &["total"]), Some(5.0));

        let m = metric_set();
        tally.write_with_total(&m.vps_server_count, None, 3).unwrap();
        assert_eq!(value(&m.vps_server_count, &["total"]), Some(3.0));
    }

    #[test]
    fn status_label_treats_empty_as_unknown() {
        let doc = json!({"a": "", "b": "ACTIVE", "c": null});
        let node = Node::new(&doc);
        assert_eq!(status_label(node.key("a")), UNKNOWN);
        assert_eq!(status_label(node.key("b")), "ACTIVE");
        assert_eq!(status_label(node.key("c")), UNKNOWN);
        assert_eq!(status_label(node.key("missing")), UNKNOWN);
    }

    #[test]
    fn tally_total_is_reserved() {
        let m = metric_set();
        let mut tally = Tally::default();
        tally.add(TOTAL);
        tally.add("ACTIVE");
        tally.write_with_total(&m.vps_server_count, Some(3.0), 2).unwrap();
        assert_eq!(value(&m.vps_server_count, &["total"]), Some(3.0));
        assert_eq!(value(&m.vps_server_count, &["ACTIVE"]), Some(1.0));
        assert_eq!(count(&m.vps_server_count), 2);
    }

    #[test]
    fn every_kind_rejects_an_empty_document() {
        let ctx = ProcessContext::now();
        for kind in SourceKind::ALL {
            let mut m = metric_set();
            let err = process(kind, &json!({}), &mut m, &ctx).unwrap_err();
            assert!(
                matches!(err, ProcessError::MissingContainer { .. }),
                "{kind}: {err:?}"
            );
            let written: usize = m
                .families()
                .iter()
                .filter(|f| !f.get_name().starts_with("pskz_scrape_"))
                .map(|f| f.get_metric().len())
                .sum();
            assert_eq!(written, 0, "{kind} wrote before failing");
        }
    }

    #[test]
    fn missing_container_names_the_path() {
        let mut m = metric_set();
        let err = process(
            SourceKind::K8sClusters,
            &json!({"data": {"k8saas": {"cluster": {}}}}),
            &mut m,
            &ProcessContext::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProcessError::MissingContainer {
                path: "data.k8saas.cluster.pagination.items".into()
            }
        );
    }
}
