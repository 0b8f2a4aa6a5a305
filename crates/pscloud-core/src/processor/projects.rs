//! Hosting projects (account services).

use serde_json::Value;

use super::{ProcessError, identity, items_at, put};
use crate::metrics::MetricSet;

const ITEMS: &[&str] = &["data", "account", "services", "pagination", "items"];

pub(super) fn process(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, ITEMS)?;
    let mut seen = 0;

    for project in items.objects() {
        seen += 1;
        let id = identity(project.key("id"));
        let label = match project.key("domain").non_empty_label() {
            Some(domain) => format!("{domain}-{id}"),
            None => id,
        };

        for (field, vec) in [
            ("price", &m.project_amount),
            ("diskUsage", &m.project_disk_usage_gb),
            ("diskLimit", &m.project_disk_limit_gb),
            ("bandwidthUsage", &m.project_bw_usage_gb),
            ("bandwidthLimit", &m.project_bw_limit_gb),
        ] {
            if let Some(v) = project.key(field).f64() {
                put(vec, &[&label], v)?;
            }
        }
    }

    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;
    use serde_json::json;

    #[test]
    fn labels_by_domain_and_id() {
        let mut m = metric_set();
        let doc = json!({"data": {"account": {"services": {"pagination": {"items": [
            {"id": 73519, "domain": "example.kz", "price": 2490, "diskUsage": 3.2, "diskLimit": 10},
            {"id": "88", "bandwidthUsage": 1.5, "bandwidthLimit": 100},
            {"domain": "", "price": 10}
        ]}}}}});
        assert_eq!(process(&doc, &mut m).unwrap(), 3);

        assert_eq!(value(&m.project_amount, &["example.kz-73519"]), Some(2490.0));
        assert_eq!(value(&m.project_disk_usage_gb, &["example.kz-73519"]), Some(3.2));
        assert_eq!(value(&m.project_bw_limit_gb, &["88"]), Some(100.0));
        assert_eq!(value(&m.project_amount, &["unknown"]), Some(10.0));
        // Absent numeric fields are omitted.
        assert_eq!(value(&m.project_bw_usage_gb, &["example.kz-73519"]), None);
        assert_eq!(count(&m.project_disk_limit_gb), 1);
    }
}
