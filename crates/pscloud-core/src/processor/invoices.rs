//! Invoices: account-wide counters and the filtered invoice list.

use serde_json::Value;

use super::{ProcessError, Tally, identity, object_at, put, status_label};
use crate::metrics::MetricSet;

const INVOICE: &[&str] = &["data", "account", "invoice"];

const BUCKETS: [&str; 4] = ["total", "unpaid", "paid", "cancelled"];

pub(super) fn process(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let invoice = object_at(doc, INVOICE)?;

    let counters = invoice.key("counters");
    for bucket in BUCKETS {
        if let Some(v) = counters.key(bucket).f64() {
            put(&m.invoice_counters, &[bucket], v)?;
        }
    }

    let items = invoice.key("pagination").key("items");
    let mut statuses = Tally::default();
    let mut seen = 0;
    for item in items.objects() {
        seen += 1;
        let id = identity(item.key("id"));
        statuses.add(&status_label(item.key("status")));
        if let Some(total) = item.key("total").f64() {
            put(&m.invoice_amount, &[&id], total)?;
        }
    }
    statuses.write(&m.invoice_status_count)?;

    Ok(seen)
}
