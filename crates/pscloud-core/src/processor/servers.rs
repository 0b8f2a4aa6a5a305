//! VPS servers and service-scoped server info.

use serde_json::Value;

use super::{
    ACTIVE, ProcessError, Tally, identity, items_at, put, reported_count, status_label,
    status_value,
};
use crate::metrics::MetricSet;

const VPS_ITEMS: &[&str] = &["data", "vps", "server", "pagination", "items"];

/// The VPC and VPS endpoints answer service-scoped queries with the same shape.
const SERVICE_ITEMS: &[&str] = &["data", "vpc", "instance", "pagination", "items"];

pub(super) fn process_vps(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, VPS_ITEMS)?;
    let mut statuses = Tally::default();
    let mut seen = 0;

    for server in items.objects() {
        seen += 1;
        let id = identity(server.key("serverId"));
        let name = identity(server.key("name"));
        let status = status_label(server.key("status"));
        statuses.add(&status);
        put(
            &m.vps_server_status,
            &[&id, &name, &status],
            status_value(&status, ACTIVE),
        )?;

        let region = identity(server.key("regionId"));
        let labels = [id.as_str(), name.as_str(), region.as_str()];
        let tariff = server.key("tariff");
        for (field, vec) in [
            ("ramGb", &m.vps_server_ram_gb),
            ("cores", &m.vps_server_cores),
            ("bootDiskSizeGb", &m.vps_server_disk_gb),
        ] {
            if let Some(v) = tariff.key(field).f64() {
                put(vec, &labels, v)?;
            }
        }
        if let Some(amount) = server.key("finances").key("amount").f64() {
            put(&m.vps_server_amount, &labels, amount)?;
        }
    }

    statuses.write_with_total(&m.vps_server_count, reported_count(doc, VPS_ITEMS), seen)?;
    Ok(seen)
}

pub(super) fn process_service(
    doc: &Value,
    m: &mut MetricSet,
    service_type: &str,
) -> Result<usize, ProcessError> {
    let items = items_at(doc, SERVICE_ITEMS)?;
    let mut seen = 0;

    for server in items.objects() {
        seen += 1;
        let name = identity(server.key("instanceName"));
        let labels = [service_type, name.as_str()];

        if let Some(ram) = server.key("ram").f64() {
            put(&m.server_ram_mb, &labels, ram)?;
        }
        if let Some(cores) = server.key("cores").f64() {
            put(&m.server_cores, &labels, cores)?;
        }
        if let Some(ips) = server.key("floatingIpsArray").array() {
            put(&m.server_ip_count, &labels, ips.len() as f64)?;
        }
        let status = status_label(server.key("status"));
        put(
            &m.server_status,
            &[service_type, &name, &status],
            status_value(&status, ACTIVE),
        )?;
    }

    Ok(seen)
}
