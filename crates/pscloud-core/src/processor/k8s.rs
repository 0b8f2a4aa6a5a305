//! Kubernetes-as-a-service: clusters with their node groups, and projects with
//! their OpenStack quotas.

use serde_json::Value;

use super::{
    K8S_HEALTHY, ProcessError, Tally, UNKNOWN, identity, items_at, put, reported_count,
    status_label, status_value,
};
use crate::metrics::MetricSet;

const CLUSTERS: &[&str] = &["data", "k8saas", "cluster", "pagination", "items"];
const PROJECTS: &[&str] = &["data", "k8saas", "project", "pagination", "items"];

pub(super) fn process_clusters(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, CLUSTERS)?;
    let mut statuses = Tally::default();
    let mut seen = 0;

    for cluster in items.objects() {
        seen += 1;
        let id = identity(cluster.key("_id"));
        let name = identity(cluster.key("name"));
        let status = status_label(cluster.key("status"));
        statuses.add(&status);

        let endpoint = identity(cluster.key("endpointId"));
        let region = identity(cluster.key("regionId"));
        let project = identity(cluster.key("projectId"));
        let template = identity(cluster.key("clusterTemplate").key("name"));
        put(
            &m.k8s_cluster_status,
            &[&id, &name, &status, &endpoint, &region, &project, &template],
            status_value(&status, K8S_HEALTHY),
        )?;

        if let Some(nodes) = cluster.key("nodeCount").f64() {
            put(&m.k8s_cluster_nodes, &[&id, &name], nodes)?;
        }
        if let Some(masters) = cluster.key("masterCount").f64() {
            put(&m.k8s_cluster_masters, &[&id, &name], masters)?;
        }

        for group in cluster.key("clusterNodeGroups").objects() {
            let group_id = identity(group.key("_id"));
            let group_name = identity(group.key("name"));
            let group_status = status_label(group.key("status"));
            put(
                &m.k8s_nodegroup_status,
                &[&id, &name, &group_id, &group_name, &group_status],
                status_value(&group_status, K8S_HEALTHY),
            )?;

            let labels = [id.as_str(), name.as_str(), group_id.as_str(), group_name.as_str()];
            if let Some(nodes) = group.key("nodeCount").f64() {
                put(&m.k8s_nodegroup_nodes, &labels, nodes)?;
            }
            let flavor = group.key("flavorDetailed");
            if let Some(vcpus) = flavor.key("vcpus").f64() {
                put(&m.k8s_nodegroup_cores, &labels, vcpus)?;
            }
            if let Some(ram) = flavor.key("ram").f64() {
                put(&m.k8s_nodegroup_ram_mb, &labels, ram)?;
            }
        }
    }

    statuses.write_with_total(&m.k8s_cluster_count, reported_count(doc, CLUSTERS), seen)?;
    Ok(seen)
}

pub(super) fn process_projects(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let items = items_at(doc, PROJECTS)?;
    let mut statuses = Tally::default();
    let mut types = Tally::default();
    let mut seen = 0;

    for project in items.objects() {
        seen += 1;
        let id = identity(project.key("projectId"));
        let name = project
            .key("projectName")
            .non_empty_label()
            .unwrap_or_else(|| id.clone());
        statuses.add(&status_label(project.key("status")));
        types.add(&status_label(project.key("type")));

        for service in project.key("openstackServices").objects() {
            let service_name = service.key("name").str().unwrap_or(UNKNOWN);
            let region = identity(service.key("regionId"));
            for quota in service.key("quota").objects() {
                let key = quota.key("key").str().unwrap_or(UNKNOWN);
                m.k8s_project_quotas.observe(
                    service_name,
                    key,
                    [&id, &name, &region],
                    quota.key("limit").f64(),
                    quota.key("inUse").f64(),
                )?;
            }
        }
    }

    statuses.write(&m.k8s_project_status_count)?;
    types.write(&m.k8s_project_type_count)?;
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;
    use crate::source::SourceKind;
    use crate::source::mock::typical_document;
    use serde_json::json;

    #[test]
    fn healthy_cluster_with_node_group() {
        let mut m = metric_set();
        let doc = typical_document(SourceKind::K8sClusters);
        assert_eq!(process_clusters(&doc, &mut m).unwrap(), 1);

        assert_eq!(
            value(
                &m.k8s_cluster_status,
                &["c-01", "prod", "CREATE_COMPLETE", "ep-9", "kz-ala-1", "3141", "k8s-1.29"]
            ),
            Some(1.0)
        );
        assert_eq!(value(&m.k8s_cluster_nodes, &["c-01", "prod"]), Some(3.0));
        assert_eq!(value(&m.k8s_cluster_masters, &["c-01", "prod"]), Some(1.0));
        assert_eq!(
            value(
                &m.k8s_nodegroup_status,
                &["c-01", "prod", "ng-01", "default", "UPDATE_COMPLETE"]
            ),
            Some(1.0)
        );
        let ng = ["c-01", "prod", "ng-01", "default"];
        assert_eq!(value(&m.k8s_nodegroup_nodes, &ng), Some(3.0));
        assert_eq!(value(&m.k8s_nodegroup_cores, &ng), Some(4.0));
        assert_eq!(value(&m.k8s_nodegroup_ram_mb, &ng), Some(8192.0));
        assert_eq!(value(&m.k8s_cluster_count, &["CREATE_COMPLETE"]), Some(1.0));
        assert_eq!(value(&m.k8s_cluster_count, &["total"]), Some(1.0));
    }

    #[test]
    fn failed_cluster_and_sparse_fields() {
        let mut m = metric_set();
        let doc = json!({"data": {"k8saas": {"cluster": {"pagination": {
            "count": 7,
            "items": [
                {"_id": "c-02", "name": "staging", "status": "CREATE_FAILED", "nodeCount": 0},
                {"name": "orphan", "clusterNodeGroups": [{"name": "workers"}, "junk"]}
            ]
        }}}}});
        assert_eq!(process_clusters(&doc, &mut m).unwrap(), 2);

        assert_eq!(
            value(
                &m.k8s_cluster_status,
                &["c-02", "staging", "CREATE_FAILED", "unknown", "unknown", "unknown", "unknown"]
            ),
            Some(0.0)
        );
        assert_eq!(value(&m.k8s_cluster_nodes, &["c-02", "staging"]), Some(0.0));
        assert_eq!(count(&m.k8s_cluster_masters), 0);
        assert_eq!(
            value(
                &m.k8s_nodegroup_status,
                &["unknown", "orphan", "unknown", "workers", "unknown"]
            ),
            Some(0.0)
        );
        assert_eq!(count(&m.k8s_nodegroup_nodes), 0);
        // Pagination count wins over the number of listed items.
        assert_eq!(value(&m.k8s_cluster_count, &["total"]), Some(7.0));
        assert_eq!(value(&m.k8s_cluster_count, &["unknown"]), Some(1.0));
    }

    #[test]
    fn projects_counts_and_quota_families() {
        let mut m = metric_set();
        let doc = typical_document(SourceKind::K8sProjects);
        assert_eq!(process_projects(&doc, &mut m).unwrap(), 1);

        assert_eq!(value(&m.k8s_project_status_count, &["ACTIVE"]), Some(1.0));
        assert_eq!(value(&m.k8s_project_type_count, &["standard"]), Some(1.0));

        let families = m.k8s_project_quotas.families();
        let sample = |name: &str| {
            families
                .iter()
                .find(|f| f.get_name() == name)
                .map(|f| f.get_metric()[0].get_gauge().get_value())
        };
        assert_eq!(sample("pskz_k8s_project_quota_compute_ram_limit"), Some(100.0));
        assert_eq!(sample("pskz_k8s_project_quota_compute_ram_used"), Some(40.0));
        assert_eq!(sample("pskz_k8s_project_quota_compute_cores_used"), Some(12.0));
        assert_eq!(m.k8s_project_quotas.len(), 2);
    }

    #[test]
    fn project_name_falls_back_to_id() {
        let mut m = metric_set();
        let doc = json!({"data": {"k8saas": {"project": {"pagination": {"items": [{
            "projectId": 77,
            "projectName": "",
            "openstackServices": [{"name": "network", "quota": [{"key": "ports", "inUse": 3}]}]
        }]}}}}});
        process_projects(&doc, &mut m).unwrap();

        let families = m.k8s_project_quotas.families();
        let used = families
            .iter()
            .find(|f| f.get_name() == "pskz_k8s_project_quota_network_ports_used")
            .unwrap();
        let labels: Vec<(&str, &str)> = used.get_metric()[0]
            .get_label()
            .iter()
            .map(|l| (l.get_name(), l.get_value()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("project_id", "77"),
                ("project_name", "77"),
                ("region_id", "unknown")
            ]
        );
        assert_eq!(value(&m.k8s_project_status_count, &["unknown"]), Some(1.0));
    }

    #[test]
    fn empty_status_and_type_count_as_unknown() {
        let mut m = metric_set();
        let doc = json!({"data": {"k8saas": {"project": {"pagination": {"items": [
            {"projectId": "p1", "status": "", "type": ""},
            {"projectId": "p2", "status": "ACTIVE", "type": "standard"}
        ]}}}}});
        assert_eq!(process_projects(&doc, &mut m).unwrap(), 2);

        assert_eq!(value(&m.k8s_project_status_count, &["unknown"]), Some(1.0));
        assert_eq!(value(&m.k8s_project_type_count, &["unknown"]), Some(1.0));
        assert_eq!(value(&m.k8s_project_status_count, &[""]), None);
        assert_eq!(value(&m.k8s_project_type_count, &[""]), None);
        assert_eq!(count(&m.k8s_project_status_count), 2);

        let mut m = metric_set();
        let doc = json!({"data": {"k8saas": {"cluster": {"pagination": {"items": [
            {"_id": "c-03", "name": "dev", "status": "", "clusterNodeGroups": [
                {"_id": "ng-3", "name": "pool", "status": ""}
            ]}
        ]}}}}});
        process_clusters(&doc, &mut m).unwrap();
        assert_eq!(
            value(
                &m.k8s_cluster_status,
                &["c-03", "dev", "unknown", "unknown", "unknown", "unknown", "unknown"]
            ),
            Some(0.0)
        );
        assert_eq!(
            value(&m.k8s_nodegroup_status, &["c-03", "dev", "ng-3", "pool", "unknown"]),
            Some(0.0)
        );
        assert_eq!(value(&m.k8s_cluster_count, &["unknown"]), Some(1.0));
    }
}
