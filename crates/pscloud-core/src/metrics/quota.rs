//! Dynamically named Kubernetes project quota families.
//!
//! Each `(service, key)` quota pair observed in a project becomes two families,
//! `<ns>_k8s_project_quota_<service>_<key>_limit` and `..._used`. The names are
//! synthesized once per family name and cached for the process lifetime; a
//! cycle only exposes the pairs it observed. Distinct raw pairs that map to the
//! same name (`a_b`/`c` and `a`/`b_c`) share one family, owned by the first pair
//! seen in the cycle.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use tracing::warn;

use super::QUOTA_LABELS;

/// Maps every character outside `[a-zA-Z0-9_]` to `_`. Empty input becomes `unknown`.
pub fn sanitize_segment(raw: &str) -> String {
    if raw.is_empty() {
        return "unknown".to_string();
    }
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Family name segment of a pair, before the `_limit`/`_used` suffix.
pub fn family_name(service: &str, key: &str) -> String {
    format!("{}_{}", sanitize_segment(service), sanitize_segment(key))
}

/// Metric options of one quota pair.
#[derive(Debug, Clone)]
pub struct QuotaDescriptors {
    pub limit: Opts,
    pub used: Opts,
}

/// Process-wide cache of quota descriptors, keyed by [`family_name`].
pub struct QuotaRegistry {
    namespace: String,
    cache: Mutex<HashMap<String, Arc<QuotaDescriptors>>>,
}

impl QuotaRegistry {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached descriptors of a pair, synthesizing them on first sight.
    pub fn descriptors(&self, service: &str, key: &str) -> Arc<QuotaDescriptors> {
        let service = sanitize_segment(service);
        let key = sanitize_segment(key);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(format!("{service}_{key}"))
            .or_insert_with(|| {
                let base = format!("k8s_project_quota_{service}_{key}");
                Arc::new(QuotaDescriptors {
                    limit: Opts::new(
                        format!("{base}_limit"),
                        format!("Quota limit for {service} {key}"),
                    )
                    .namespace(self.namespace.clone()),
                    used: Opts::new(
                        format!("{base}_used"),
                        format!("Quota usage for {service} {key}"),
                    )
                    .namespace(self.namespace.clone()),
                })
            })
            .clone()
    }

    /// Number of distinct family names seen since start.
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct QuotaPair {
    /// Raw `(service, key)` that claimed the name this cycle.
    owner: (String, String),
    limit: GaugeVec,
    used: GaugeVec,
}

/// Quota families of one scrape cycle, keyed by [`family_name`].
pub struct QuotaFamilies {
    registry: Arc<QuotaRegistry>,
    pairs: BTreeMap<String, QuotaPair>,
}

impl QuotaFamilies {
    pub fn new(registry: Arc<QuotaRegistry>) -> Self {
        Self {
            registry,
            pairs: BTreeMap::new(),
        }
    }

    /// Records one quota entry. `labels` follow [`QUOTA_LABELS`]; absent values
    /// are not written. An entry whose name is already owned by another raw pair
    /// this cycle is dropped.
    pub fn observe(
        &mut self,
        service: &str,
        key: &str,
        labels: [&str; 3],
        limit: Option<f64>,
        used: Option<f64>,
    ) -> prometheus::Result<()> {
        let name = family_name(service, key);
        if !self.pairs.contains_key(&name) {
            let descriptors = self.registry.descriptors(service, key);
            let pair = QuotaPair {
                owner: (service.to_string(), key.to_string()),
                limit: GaugeVec::new(descriptors.limit.clone(), &QUOTA_LABELS)?,
                used: GaugeVec::new(descriptors.used.clone(), &QUOTA_LABELS)?,
            };
            self.pairs.insert(name.clone(), pair);
        }
        let Some(pair) = self.pairs.get(&name) else {
            return Ok(());
        };
        if pair.owner.0 != service || pair.owner.1 != key {
            warn!(
                service,
                key,
                owner_service = %pair.owner.0,
                owner_key = %pair.owner.1,
                family = %name,
                "quota family name already taken, entry dropped"
            );
            return Ok(());
        }
        if let Some(limit) = limit {
            pair.limit.get_metric_with_label_values(&labels)?.set(limit);
        }
        if let Some(used) = used {
            pair.used.get_metric_with_label_values(&labels)?.set(used);
        }
        Ok(())
    }

    /// Number of quota families observed this cycle.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn families(&self) -> Vec<MetricFamily> {
        self.pairs
            .values()
            .flat_map(|pair| {
                let mut families = pair.limit.collect();
                families.extend(pair.used.collect());
                families
            })
            .collect()
    }
}
