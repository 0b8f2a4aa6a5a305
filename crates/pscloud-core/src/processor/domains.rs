//! Domain counters and the domain list.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use super::{
    DOMAIN_ACTIVE, ProcessContext, ProcessError, identity, items_at, object_at, put,
    status_label, status_value,
};
use crate::metrics::MetricSet;

const STATS: &[&str] = &["data", "account", "domains", "stats"];
const ITEMS: &[&str] = &["data", "domains", "items"];

const BUCKETS: [&str; 4] = ["total", "active", "expired", "pending"];

const SECONDS_PER_DAY: f64 = 86_400.0;

pub(super) fn process_counters(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let stats = object_at(doc, STATS)?;
    for bucket in BUCKETS {
        if let Some(v) = stats.key(bucket).f64() {
            put(&m.domain_counters, &[bucket], v)?;
        }
    }
    Ok(1)
}

pub(super) fn process_list(
    doc: &Value,
    m: &mut MetricSet,
    ctx: &ProcessContext,
) -> Result<usize, ProcessError> {
    let items = items_at(doc, ITEMS)?;
    let mut seen = 0;

    for domain in items.objects() {
        seen += 1;
        let name = identity(domain.key("name"));
        let status = status_label(domain.key("status"));
        put(
            &m.domain_status,
            &[&name, &status],
            status_value(&status, DOMAIN_ACTIVE),
        )?;

        let Some(raw) = domain.key("expiryDate").str() else {
            continue;
        };
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => {
                let expiry = date.and_time(chrono::NaiveTime::MIN).and_utc();
                let days = (expiry - ctx.now).num_seconds() as f64 / SECONDS_PER_DAY;
                put(&m.domain_expiry_days, &[&name], days)?;
            }
            Err(e) => debug!(domain = %name, expiry = raw, error = %e, "unparseable expiry date"),
        }
    }

    Ok(seen)
}
