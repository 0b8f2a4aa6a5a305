//! Scrape orchestrator.
//!
//! [`Exporter`] is a prometheus [`Collector`]: every `collect` runs one full
//! scrape cycle against the source adapter, builds a fresh [`MetricSet`] and
//! returns its families. Cycles are serialized; a collect that arrives while
//! another is running waits for it and then runs its own.

mod fetch;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use prometheus::GaugeVec;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::metrics::{MetricSet, QuotaRegistry};
use crate::processor::{self, ProcessContext, ProcessError};
use crate::source::{SourceAdapter, SourceError, SourceKind};

/// Default metric namespace.
pub const DEFAULT_NAMESPACE: &str = "pskz";

/// Default per-source deadline.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("invalid metric catalogue: {0}")]
    Metric(#[from] prometheus::Error),
    #[error("max_parallel_fetches must be at least 1")]
    NoFetchSlots,
}

/// Scrape behaviour of an [`Exporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    /// Prefix of every metric name.
    pub namespace: String,
    /// Deadline handed to the adapter for each source call.
    pub source_timeout: Duration,
    /// Upper bound of concurrent adapter calls within one cycle.
    pub max_parallel_fetches: usize,
    /// Sources whose fetch failure flips `scrape_success` to 0.
    pub critical_sources: Vec<SourceKind>,
    /// Sources fetched each cycle. Always visited in [`SourceKind::ALL`] order.
    pub sources: Vec<SourceKind>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            max_parallel_fetches: 1,
            critical_sources: vec![SourceKind::Balance],
            sources: SourceKind::enabled(false),
        }
    }
}

/// What happened to one source during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// Fetched and processed; carries the number of items written.
    Processed(usize),
    /// The backend does not offer this source.
    Unsupported,
    /// The fetch failed.
    Failed(SourceError),
    /// The document was fetched but did not have the expected shape.
    Rejected(ProcessError),
}

impl SourceOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_) | SourceOutcome::Rejected(_))
    }
}

/// Per-source record of a cycle.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub kind: SourceKind,
    pub outcome: SourceOutcome,
    pub elapsed: Duration,
}

/// Result of one completed cycle.
pub struct MetricSnapshot {
    /// Sequence number, starting at 1. Zero marks the empty startup snapshot.
    pub cycle: u64,
    pub success: bool,
    pub duration: Duration,
    pub reports: Vec<SourceReport>,
    pub metrics: MetricSet,
}

impl MetricSnapshot {
    pub fn families(&self) -> Vec<MetricFamily> {
        self.metrics.families()
    }
}

pub struct Exporter<S> {
    source: S,
    config: ScrapeConfig,
    sources: Vec<SourceKind>,
    quotas: Arc<QuotaRegistry>,
    /// Descriptor source for `Collector::desc`; never receives values.
    template: MetricSet,
    cycle_lock: Mutex<()>,
    last: RwLock<Arc<MetricSnapshot>>,
    cycles: AtomicU64,
}

impl<S: SourceAdapter> Exporter<S> {
    pub fn new(source: S, config: ScrapeConfig) -> Result<Self, ExporterError> {
        if config.max_parallel_fetches == 0 {
            return Err(ExporterError::NoFetchSlots);
        }
        let quotas = Arc::new(QuotaRegistry::new(&config.namespace));
        let template = MetricSet::new(&config.namespace, quotas.clone())?;
        let empty = MetricSnapshot {
            cycle: 0,
            success: false,
            duration: Duration::ZERO,
            reports: Vec::new(),
            metrics: MetricSet::new(&config.namespace, quotas.clone())?,
        };
        let sources = SourceKind::ALL
            .into_iter()
            .filter(|k| config.sources.contains(k))
            .collect();

        Ok(Self {
            source,
            config,
            sources,
            quotas,
            template,
            cycle_lock: Mutex::new(()),
            last: RwLock::new(Arc::new(empty)),
            cycles: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sources fetched each cycle, in visiting order.
    pub fn sources(&self) -> &[SourceKind] {
        &self.sources
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// The most recently completed cycle, without running a new one.
    pub fn last_snapshot(&self) -> Arc<MetricSnapshot> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one scrape cycle and publishes its snapshot.
    pub fn scrape(&self) -> Arc<MetricSnapshot> {
        let _guard = self.cycle_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let start = Instant::now();
        let mut metrics = match MetricSet::new(&self.config.namespace, self.quotas.clone()) {
            Ok(metrics) => metrics,
            Err(e) => {
                // Namespace was validated in `new`.
                error!(error = %e, "failed to build metric set");
                return self.last_snapshot();
            }
        };
        let ctx = ProcessContext::now();

        let fetched = fetch::fetch_all(
            &self.source,
            &self.sources,
            self.config.source_timeout,
            self.config.max_parallel_fetches,
        );

        let mut reports = Vec::with_capacity(fetched.len());
        for f in fetched {
            let outcome = match f.result {
                Ok(doc) => match processor::process(f.kind, &doc, &mut metrics, &ctx) {
                    Ok(items) => SourceOutcome::Processed(items),
                    Err(e) => {
                        warn!(source = %f.kind, error = %e, "unexpected response shape");
                        SourceOutcome::Rejected(e)
                    }
                },
                Err(SourceError::Unsupported) => {
                    debug!(source = %f.kind, "source not supported by backend");
                    SourceOutcome::Unsupported
                }
                Err(e) => {
                    warn!(source = %f.kind, kind = e.kind(), error = %e, "fetch failed");
                    SourceOutcome::Failed(e)
                }
            };
            record(&metrics, f.kind, &outcome, f.elapsed);
            reports.push(SourceReport {
                kind: f.kind,
                outcome,
                elapsed: f.elapsed,
            });
        }

        let success = !reports.iter().any(|r| {
            matches!(r.outcome, SourceOutcome::Failed(_))
                && self.config.critical_sources.contains(&r.kind)
        });
        let duration = start.elapsed();
        metrics.scrape_success.set(if success { 1.0 } else { 0.0 });
        metrics.scrape_duration_seconds.set(duration.as_secs_f64());

        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let failed = reports.iter().filter(|r| r.outcome.is_error()).count();
        if cycle == 1 {
            info!(
                sources = reports.len(),
                failed,
                duration_ms = duration.as_millis() as u64,
                "first scrape completed"
            );
        } else {
            debug!(
                cycle,
                failed,
                duration_ms = duration.as_millis() as u64,
                "scrape completed"
            );
        }
        let budget = slow_scrape_budget(self.config.source_timeout, self.sources.len());
        if let Some(budget) = budget.filter(|budget| duration > *budget) {
            warn!(
                duration_ms = duration.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "scrape is slow, consider raising max_parallel_fetches"
            );
        }

        let snapshot = Arc::new(MetricSnapshot {
            cycle,
            success,
            duration,
            reports,
            metrics,
        });
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }
}

/// Self-observability series of one source.
fn record(metrics: &MetricSet, kind: SourceKind, outcome: &SourceOutcome, elapsed: Duration) {
    let unsupported = matches!(outcome, SourceOutcome::Unsupported);
    set(&metrics.source_fetch_duration_seconds, kind.name(), elapsed.as_secs_f64());
    set(
        &metrics.last_scrape_error,
        &kind.error_type(),
        if outcome.is_error() { 1.0 } else { 0.0 },
    );
    set(
        &metrics.source_unsupported,
        kind.name(),
        if unsupported { 1.0 } else { 0.0 },
    );
}

fn set(vec: &GaugeVec, label: &str, value: f64) {
    match vec.get_metric_with_label_values(&[label]) {
        Ok(gauge) => gauge.set(value),
        Err(e) => error!(label, error = %e, "failed to record self metric"),
    }
}

impl<S: SourceAdapter + 'static> Collector for Exporter<S> {
    fn desc(&self) -> Vec<&Desc> {
        self.template.descs()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.scrape().families()
    }
}

/// Half of the worst-case sequential cycle. `None` when there is nothing to
/// compare against or the product does not fit a `Duration`.
fn slow_scrape_budget(source_timeout: Duration, sources: usize) -> Option<Duration> {
    let sources = u32::try_from(sources).ok()?;
    let budget = source_timeout.checked_mul(sources)? / 2;
    (!budget.is_zero()).then_some(budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockSource, SourceResult};
    use prometheus::Registry;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn exporter(source: MockSource) -> Exporter<MockSource> {
        let config = ScrapeConfig {
            sources: SourceKind::enabled(true),
            ..ScrapeConfig::default()
        };
        Exporter::new(source, config).unwrap()
    }

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> Option<&'a MetricFamily> {
        families.iter().find(|f| f.get_name() == name)
    }

    /// Value of the series whose labels contain every `(name, value)` pair.
    fn sample(families: &[MetricFamily], name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        family(families, name)?
            .get_metric()
            .iter()
            .find(|m| {
                labels.iter().all(|(k, v)| {
                    m.get_label()
                        .iter()
                        .any(|l| l.get_name() == *k && l.get_value() == *v)
                })
            })
            .map(|m| m.get_gauge().get_value())
    }

    fn gathered(exporter: Exporter<MockSource>) -> Vec<MetricFamily> {
        let registry = Registry::new();
        registry.register(Box::new(exporter)).unwrap();
        registry.gather()
    }

    fn label_sets(families: &[MetricFamily]) -> Vec<(String, Vec<(String, String)>)> {
        let mut out: Vec<_> = families
            .iter()
            .filter(|f| !f.get_name().ends_with("duration_seconds"))
            .flat_map(|f| {
                f.get_metric().iter().map(move |m| {
                    let labels = m
                        .get_label()
                        .iter()
                        .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                        .collect();
                    (f.get_name().to_string(), labels)
                })
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn default_config() {
        let config = ScrapeConfig::default();
        assert_eq!(config.namespace, "pskz");
        assert_eq!(config.source_timeout, Duration::from_secs(10));
        assert_eq!(config.critical_sources, vec![SourceKind::Balance]);
        assert!(!config.sources.contains(&SourceKind::VpcServersByService));
    }

    #[test]
    fn rejects_bad_config() {
        let bad_ns = ScrapeConfig {
            namespace: "ps-kz".to_string(),
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            Exporter::new(MockSource::new(), bad_ns),
            Err(ExporterError::Metric(_))
        ));

        let no_slots = ScrapeConfig {
            max_parallel_fetches: 0,
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            Exporter::new(MockSource::new(), no_slots),
            Err(ExporterError::NoFetchSlots)
        ));
    }

    #[test]
    fn sources_follow_fixed_order() {
        let config = ScrapeConfig {
            sources: vec![SourceKind::LbaasLoadBalancers, SourceKind::Balance],
            ..ScrapeConfig::default()
        };
        let exporter = Exporter::new(MockSource::typical_account(), config).unwrap();
        assert_eq!(
            exporter.sources(),
            &[SourceKind::Balance, SourceKind::LbaasLoadBalancers]
        );
        exporter.scrape();
        assert_eq!(exporter.source().calls(), exporter.sources().to_vec());
    }

    #[test]
    fn full_account_scrape() {
        let families = gathered(exporter(MockSource::typical_account()));

        assert_eq!(sample(&families, "pskz_scrape_success", &[]), Some(1.0));
        assert_eq!(
            sample(&families, "pskz_prepay_balance", &[("account", "account")]),
            Some(15230.5)
        );
        assert_eq!(
            sample(&families, "pskz_k8s_cluster_nodes", &[("cluster_id", "c-01")]),
            Some(3.0)
        );
        assert_eq!(
            sample(
                &families,
                "pskz_server_ram_mb",
                &[("service_type", "vpc"), ("instance_name", "vpc-app")]
            ),
            Some(8192.0)
        );
        assert!(family(&families, "pskz_k8s_project_quota_compute_ram_limit").is_some());
        for kind in SourceKind::ALL {
            assert_eq!(
                sample(
                    &families,
                    "pskz_last_scrape_error",
                    &[("error_type", &kind.error_type())]
                ),
                Some(0.0),
                "{kind}"
            );
        }
    }

    #[test]
    fn partial_failure_keeps_other_sources() {
        let mock = MockSource::typical_account().with_failure(
            SourceKind::K8sClusters,
            SourceError::Transport("connection reset".to_string()),
        );
        let families = gathered(exporter(mock));

        assert_eq!(sample(&families, "pskz_scrape_success", &[]), Some(1.0));
        assert!(sample(&families, "pskz_prepay_balance", &[]).is_some());
        assert!(sample(&families, "pskz_vps_server_count", &[("status", "total")]).is_some());
        assert_eq!(
            sample(
                &families,
                "pskz_last_scrape_error",
                &[("error_type", "k8s_clusters_fetch_error")]
            ),
            Some(1.0)
        );
        assert!(family(&families, "pskz_k8s_cluster_status").is_none());
        assert!(family(&families, "pskz_k8s_nodegroup_nodes").is_none());
        // Projects come from their own source.
        assert!(family(&families, "pskz_k8s_project_status_count").is_some());
    }

    #[test]
    fn critical_failure_flips_success() {
        let mock = MockSource::typical_account().with_failure(
            SourceKind::Balance,
            SourceError::Authentication("token expired".to_string()),
        );
        let exporter = exporter(mock);
        let snapshot = exporter.scrape();
        let families = snapshot.families();

        assert!(!snapshot.success);
        assert_eq!(sample(&families, "pskz_scrape_success", &[]), Some(0.0));
        assert_eq!(
            sample(
                &families,
                "pskz_last_scrape_error",
                &[("error_type", "balance_fetch_error")]
            ),
            Some(1.0)
        );
        assert!(family(&families, "pskz_prepay_balance").is_some_and(|f| f.get_metric().is_empty()));
        assert!(sample(&families, "pskz_lbaas_floating_ip", &[]).is_some());
    }

    #[test]
    fn unreachable_backend_exports_only_self_metrics() {
        let families = gathered(exporter(MockSource::unreachable()));
        let mut names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "pskz_last_scrape_error",
                "pskz_scrape_duration_seconds",
                "pskz_scrape_success",
                "pskz_source_fetch_duration_seconds",
                "pskz_source_unsupported",
            ]
        );
        assert_eq!(sample(&families, "pskz_scrape_success", &[]), Some(0.0));
        let errors = family(&families, "pskz_last_scrape_error").unwrap();
        assert_eq!(errors.get_metric().len(), SourceKind::ALL.len());
        assert!(errors.get_metric().iter().all(|m| m.get_gauge().get_value() == 1.0));
    }

    #[test]
    fn unsupported_source_is_not_an_error() {
        let mock = MockSource::typical_account()
            .with_failure(SourceKind::Domains, SourceError::Unsupported);
        let exporter = exporter(mock);
        let snapshot = exporter.scrape();
        let families = snapshot.families();

        assert!(snapshot.success);
        assert_eq!(
            sample(&families, "pskz_source_unsupported", &[("source", "domains")]),
            Some(1.0)
        );
        assert_eq!(
            sample(&families, "pskz_source_unsupported", &[("source", "balance")]),
            Some(0.0)
        );
        assert_eq!(
            sample(
                &families,
                "pskz_last_scrape_error",
                &[("error_type", "domains_fetch_error")]
            ),
            Some(0.0)
        );
        let report = snapshot
            .reports
            .iter()
            .find(|r| r.kind == SourceKind::Domains)
            .unwrap();
        assert_eq!(report.outcome, SourceOutcome::Unsupported);
    }

    #[test]
    fn malformed_document_flags_only_its_source() {
        let mock = MockSource::typical_account()
            .with_document(SourceKind::Invoices, json!({"data": {"invoices": "oops"}}))
            .with_document(SourceKind::Balance, json!({"errors": []}));
        let exporter = exporter(mock);
        let snapshot = exporter.scrape();
        let families = snapshot.families();

        // Shape problems never count as critical fetch failures.
        assert!(snapshot.success);
        for error_type in ["invoices_fetch_error", "balance_fetch_error"] {
            assert_eq!(
                sample(&families, "pskz_last_scrape_error", &[("error_type", error_type)]),
                Some(1.0)
            );
        }
        assert!(family(&families, "pskz_invoice_amount").is_some_and(|f| f.get_metric().is_empty()));
        assert!(sample(&families, "pskz_domain_counters", &[]).is_some());
        assert!(matches!(
            snapshot.reports[0].outcome,
            SourceOutcome::Rejected(ProcessError::MissingContainer { .. })
        ));
    }

    #[test]
    fn repeated_cycles_are_idempotent() {
        let exporter = exporter(MockSource::typical_account());
        let first = label_sets(&exporter.collect());
        let second = label_sets(&exporter.collect());
        assert_eq!(first, second);
        assert_eq!(exporter.cycles(), 2);
        assert_eq!(exporter.last_snapshot().cycle, 2);
    }

    /// Serves `before` for the first cycle and `after` afterwards.
    struct Changing {
        before: MockSource,
        after: MockSource,
        balance_calls: AtomicUsize,
    }

    impl SourceAdapter for Changing {
        fn fetch(&self, kind: SourceKind, deadline: Duration) -> SourceResult {
            if kind == SourceKind::Balance {
                self.balance_calls.fetch_add(1, Ordering::SeqCst);
            }
            if self.balance_calls.load(Ordering::SeqCst) <= 1 {
                self.before.fetch(kind, deadline)
            } else {
                self.after.fetch(kind, deadline)
            }
        }
    }

    #[test]
    fn vanished_items_leave_no_stale_series() {
        let shrunk = json!({"data": {"lbaas": {"loadBalancer": {"pagination": {"items": []}}}}});
        let source = Changing {
            before: MockSource::typical_account(),
            after: MockSource::typical_account()
                .with_document(SourceKind::LbaasLoadBalancers, shrunk)
                .with_failure(
                    SourceKind::K8sProjects,
                    SourceError::Backend("internal error".to_string()),
                ),
            balance_calls: AtomicUsize::new(0),
        };
        let exporter = Exporter::new(
            source,
            ScrapeConfig {
                sources: SourceKind::enabled(true),
                ..ScrapeConfig::default()
            },
        )
        .unwrap();

        let first = exporter.collect();
        assert!(sample(&first, "pskz_lbaas_floating_ip", &[("loadbalancer_id", "lb-01")]).is_some());
        assert!(family(&first, "pskz_k8s_project_quota_compute_cores_used").is_some());

        let second = exporter.collect();
        assert!(sample(&second, "pskz_lbaas_floating_ip", &[]).is_none());
        assert_eq!(
            sample(&second, "pskz_lbaas_loadbalancer_count", &[("status", "total")]),
            Some(0.0)
        );
        assert!(family(&second, "pskz_k8s_project_quota_compute_cores_used").is_none());
        assert!(sample(&second, "pskz_k8s_project_type_count", &[]).is_none());
    }

    #[test]
    fn parallel_fetch_matches_sequential_output() {
        let slow = || {
            SourceKind::ALL.into_iter().fold(MockSource::typical_account(), |mock, kind| {
                mock.with_delay(kind, Duration::from_millis(20))
            })
        };
        let sequential = exporter(slow());
        let parallel = Exporter::new(
            slow(),
            ScrapeConfig {
                max_parallel_fetches: 4,
                sources: SourceKind::enabled(true),
                ..ScrapeConfig::default()
            },
        )
        .unwrap();

        let a = sequential.scrape();
        let b = parallel.scrape();
        assert_eq!(label_sets(&a.families()), label_sets(&b.families()));
        assert_eq!(sequential.source().max_concurrency(), 1);
        assert!(parallel.source().max_concurrency() > 1);

        let order: Vec<SourceKind> = b.reports.iter().map(|r| r.kind).collect();
        assert_eq!(order, SourceKind::ALL.to_vec());
    }

    #[test]
    fn concurrent_collects_are_serialized() {
        let mock = MockSource::typical_account()
            .with_delay(SourceKind::Balance, Duration::from_millis(30))
            .with_delay(SourceKind::Invoices, Duration::from_millis(30));
        let exporter = exporter(mock);

        std::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| exporter.collect());
            }
        });
        assert_eq!(exporter.cycles(), 3);
        assert_eq!(exporter.source().max_concurrency(), 1);
        assert_eq!(exporter.source().calls().len(), 3 * SourceKind::ALL.len());
    }

    #[test]
    fn timed_out_source_is_a_transport_failure() {
        let mock = MockSource::typical_account()
            .with_delay(SourceKind::Projects, Duration::from_secs(30));
        let exporter = Exporter::new(
            mock,
            ScrapeConfig {
                source_timeout: Duration::from_millis(20),
                ..ScrapeConfig::default()
            },
        )
        .unwrap();

        let snapshot = exporter.scrape();
        let report = snapshot
            .reports
            .iter()
            .find(|r| r.kind == SourceKind::Projects)
            .unwrap();
        assert!(matches!(report.outcome, SourceOutcome::Failed(SourceError::Transport(_))));
        assert!(snapshot.duration < Duration::from_secs(5));
        assert!(snapshot.success);
    }

    #[test]
    fn descriptors_cover_emitted_static_families() {
        let exporter = exporter(MockSource::typical_account());
        let described: Vec<String> = exporter.desc().iter().map(|d| d.fq_name.clone()).collect();
        for f in exporter.collect() {
            if !f.get_name().starts_with("pskz_k8s_project_quota_") {
                assert!(described.iter().any(|d| d == f.get_name()), "{}", f.get_name());
            }
        }
    }

    #[test]
    fn last_snapshot_before_first_cycle_is_empty() {
        let exporter = exporter(MockSource::typical_account());
        let snapshot = exporter.last_snapshot();
        assert_eq!(snapshot.cycle, 0);
        assert!(snapshot.reports.is_empty());
        assert!(exporter.source().calls().is_empty());
    }

    #[test]
    fn processed_item_counts_are_reported() {
        let exporter = exporter(MockSource::typical_account());
        let snapshot = exporter.scrape();
        let vps = snapshot
            .reports
            .iter()
            .find(|r| r.kind == SourceKind::VpsServers)
            .unwrap();
        assert_eq!(vps.outcome, SourceOutcome::Processed(2));
    }

    #[test]
    fn slow_scrape_budget_saturates_to_none() {
        assert_eq!(
            slow_scrape_budget(Duration::from_secs(10), 13),
            Some(Duration::from_secs(65))
        );
        assert_eq!(slow_scrape_budget(Duration::from_secs(10), 0), None);
        assert_eq!(slow_scrape_budget(Duration::ZERO, 13), None);
        assert_eq!(slow_scrape_budget(Duration::from_secs(u64::MAX / 4), 13), None);
    }

    #[test]
    fn huge_source_timeout_does_not_abort_the_cycle() {
        let config = ScrapeConfig {
            source_timeout: Duration::from_secs(u64::MAX / 4),
            sources: SourceKind::enabled(true),
            ..ScrapeConfig::default()
        };
        let exporter = Exporter::new(MockSource::typical_account(), config).unwrap();
        let snapshot = exporter.scrape();
        assert!(snapshot.success);
        assert_eq!(snapshot.reports.len(), SourceKind::ALL.len());
    }
}
