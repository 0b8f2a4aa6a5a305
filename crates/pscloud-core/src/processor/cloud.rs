//! Cloud (VPC) service resources and instances.

use serde_json::Value;

use super::{
    ACTIVE, ProcessError, Tally, identity, items_at, object_at, put, reported_count,
    status_label, status_value,
};
use crate::metrics::MetricSet;

const SERVICE: &[&str] = &["data", "vpc", "service"];
const INSTANCES: &[&str] = &["data", "vpc", "instance", "pagination", "items"];

/// Summary fields and the `resource` label they are exposed under.
const SUMMARY: [(&str, &str); 9] = [
    ("cpuCores", "cpu_cores"),
    ("ramSizeGb", "ram_gb"),
    ("instancesCount", "instances_count"),
    ("volumesCount", "volumes_count"),
    ("volumesSizeGb", "volumes_size_gb"),
    ("networksCount", "networks_count"),
    ("floatingIpsCount", "floating_ips_count"),
    ("securityGroupsCount", "security_groups_count"),
    ("routersCount", "routers_count"),
];

pub(super) fn process_resources(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let service = object_at(doc, SERVICE)?;
    let mut seen = 0;

    for resource in service.key("quotas").key("resources").objects() {
        seen += 1;
        let name = identity(resource.key("name"));
        if let Some(used) = resource.key("used").f64() {
            put(&m.cloud_quota, &[&format!("{name}_used")], used)?;
        }
        if let Some(limit) = resource.key("limit").f64() {
            put(&m.cloud_quota, &[&format!("{name}_limit")], limit)?;
        }
    }

    let summary = service.key("summary");
    for (field, label) in SUMMARY {
        if let Some(v) = summary.key(field).f64() {
            put(&m.cloud_summary, &[label], v)?;
        }
    }

    Ok(seen)
}

pub(super) fn process_instances(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, INSTANCES)?;
    let mut statuses = Tally::default();
    let mut seen = 0;

    for instance in items.objects() {
        seen += 1;
        let name = identity(instance.key("instanceName"));
        let status = status_label(instance.key("status"));
        statuses.add(&status);
        put(
            &m.cloud_instance_info,
            &[&name, "status"],
            status_value(&status, ACTIVE),
        )?;

        if let Some(flavor) = instance.key("flavorName").non_empty_label() {
            put(&m.cloud_instance_flavor, &[&name, &flavor], 1.0)?;
        }

        if let Some(volumes) = instance.key("volumesAttached").array() {
            put(&m.cloud_instance_info, &[&name, "volumes_count"], volumes.len() as f64)?;
            let total: f64 = instance
                .key("volumesAttached")
                .objects()
                .filter_map(|v| v.key("volumeSize").f64())
                .sum();
            put(&m.cloud_instance_info, &[&name, "volumes_total_size"], total)?;
        }

        if let Some(ips) = instance.key("floatingIpsArray").array() {
            put(&m.cloud_instance_info, &[&name, "floating_ips_count"], ips.len() as f64)?;
        }
    }

    let reported = reported_count(doc, INSTANCES);
    statuses.write_with_total(&m.cloud_instance_count, reported, seen)?;
    Ok(seen)
}
