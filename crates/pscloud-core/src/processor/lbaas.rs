//! Load balancers with their listeners, pools and members.

use serde_json::Value;

use super::{
    ACTIVE, ProcessError, Tally, identity, items_at, put, reported_count, status_label,
    status_value,
};
use crate::document::Node;
use crate::metrics::MetricSet;

const ITEMS: &[&str] = &["data", "lbaas", "loadBalancer", "pagination", "items"];

pub(super) fn process(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, ITEMS)?;
    let mut statuses = Tally::default();
    let mut seen = 0;

    for lb in items.objects() {
        seen += 1;
        let id = identity(lb.key("_id"));
        let name = identity(lb.key("name"));
        let region = identity(lb.key("regionId"));
        let vip = identity(lb.key("vipAddress"));
        let cluster = identity(lb.key("cluster").key("name"));
        let status = provisioning_status(lb);
        statuses.add(&status);

        let floating_ip = lb.key("floatingIpAddress").non_empty_label();
        put(
            &m.lbaas_loadbalancer_status,
            &[
                &id,
                &name,
                &region,
                &cluster,
                &status,
                &vip,
                floating_ip.as_deref().unwrap_or(""),
            ],
            status_value(&status, ACTIVE),
        )?;

        let parent = [id.as_str(), name.as_str()];
        put(
            &m.lbaas_floating_ip,
            &parent,
            if floating_ip.is_some() { 1.0 } else { 0.0 },
        )?;
        if let Some(flavor) = lb.key("flavorName").non_empty_label() {
            put(&m.lbaas_flavor, &[&id, &name, &flavor], 1.0)?;
        }

        if let Some(listeners) = lb.key("listeners").array() {
            put(&m.lbaas_listeners_count, &parent, listeners.len() as f64)?;
        }
        for listener in lb.key("listeners").objects() {
            let status = provisioning_status(listener);
            put(
                &m.lbaas_listener_status,
                &[
                    &id,
                    &identity(listener.key("_id")),
                    &identity(listener.key("name")),
                    &identity(listener.key("protocol")),
                    &status,
                ],
                status_value(&status, ACTIVE),
            )?;
        }

        if let Some(pools) = lb.key("pools").array() {
            put(&m.lbaas_pools_count, &parent, pools.len() as f64)?;
        }
        for pool in lb.key("pools").objects() {
            let status = provisioning_status(pool);
            put(
                &m.lbaas_pool_status,
                &[
                    &id,
                    &identity(pool.key("_id")),
                    &identity(pool.key("name")),
                    &identity(pool.key("lbAlgorithm")),
                    &status,
                ],
                status_value(&status, ACTIVE),
            )?;
        }

        if let Some(members) = lb.key("members").array() {
            put(&m.lbaas_members_count, &parent, members.len() as f64)?;
        }
        for member in lb.key("members").objects() {
            let status = provisioning_status(member);
            put(
                &m.lbaas_member_status,
                &[
                    &id,
                    &identity(member.key("_id")),
                    &identity(member.key("address")),
                    &status,
                ],
                status_value(&status, ACTIVE),
            )?;
        }
    }

    statuses.write_with_total(&m.lbaas_loadbalancer_count, reported_count(doc, ITEMS), seen)?;
    Ok(seen)
}

fn provisioning_status(node: Node<'_>) -> String {
    status_label(node.key("provisioningStatus"))
}
