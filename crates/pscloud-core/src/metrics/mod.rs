//! Metric catalogue.
//!
//! A [`MetricSet`] holds every gauge vector of one scrape cycle. The orchestrator
//! builds a fresh set per cycle, so a vector never carries label combinations
//! from an earlier cycle. Label names and arity per metric name are fixed here
//! for the lifetime of the process.

mod quota;

use std::sync::Arc;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, Opts};

pub use quota::{QuotaDescriptors, QuotaFamilies, QuotaRegistry, sanitize_segment};

/// Label set of the dynamic Kubernetes quota families.
pub const QUOTA_LABELS: [&str; 3] = ["project_id", "project_name", "region_id"];

fn gauge_vec(namespace: &str, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(Opts::new(name, help).namespace(namespace), labels)
}

/// All gauges of one scrape cycle.
pub struct MetricSet {
    // ========================================================================
    // Self-observability
    // ========================================================================
    pub scrape_duration_seconds: Gauge,
    pub scrape_success: Gauge,
    pub last_scrape_error: GaugeVec,
    pub source_unsupported: GaugeVec,
    pub source_fetch_duration_seconds: GaugeVec,

    // ========================================================================
    // Account
    // ========================================================================
    pub prepay_balance: GaugeVec,
    pub credit_balance: GaugeVec,
    pub debt_balance: GaugeVec,
    pub bonus_balance: GaugeVec,
    pub blocked_balance: GaugeVec,

    pub domain_counters: GaugeVec,
    pub domain_expiry_days: GaugeVec,
    pub domain_status: GaugeVec,

    pub project_amount: GaugeVec,
    pub project_disk_usage_gb: GaugeVec,
    pub project_disk_limit_gb: GaugeVec,
    pub project_bw_usage_gb: GaugeVec,
    pub project_bw_limit_gb: GaugeVec,

    pub invoice_counters: GaugeVec,
    pub invoice_amount: GaugeVec,
    pub invoice_status_count: GaugeVec,

    // ========================================================================
    // Cloud (VPC) and servers
    // ========================================================================
    pub cloud_quota: GaugeVec,
    pub cloud_summary: GaugeVec,
    pub cloud_instance_info: GaugeVec,
    pub cloud_instance_flavor: GaugeVec,
    pub cloud_instance_count: GaugeVec,

    pub server_ram_mb: GaugeVec,
    pub server_cores: GaugeVec,
    pub server_ip_count: GaugeVec,
    pub server_status: GaugeVec,

    pub vps_server_status: GaugeVec,
    pub vps_server_ram_gb: GaugeVec,
    pub vps_server_cores: GaugeVec,
    pub vps_server_disk_gb: GaugeVec,
    pub vps_server_amount: GaugeVec,
    pub vps_server_count: GaugeVec,

    // ========================================================================
    // Kubernetes
    // ========================================================================
    pub k8s_cluster_count: GaugeVec,
    pub k8s_cluster_status: GaugeVec,
    pub k8s_cluster_nodes: GaugeVec,
    pub k8s_cluster_masters: GaugeVec,
    pub k8s_nodegroup_status: GaugeVec,
    pub k8s_nodegroup_nodes: GaugeVec,
    pub k8s_nodegroup_cores: GaugeVec,
    pub k8s_nodegroup_ram_mb: GaugeVec,
    pub k8s_project_status_count: GaugeVec,
    pub k8s_project_type_count: GaugeVec,
    pub k8s_project_quotas: QuotaFamilies,

    // ========================================================================
    // Load balancers
    // ========================================================================
    pub lbaas_loadbalancer_count: GaugeVec,
    pub lbaas_loadbalancer_status: GaugeVec,
    pub lbaas_listeners_count: GaugeVec,
    pub lbaas_pools_count: GaugeVec,
    pub lbaas_members_count: GaugeVec,
    pub lbaas_flavor: GaugeVec,
    pub lbaas_floating_ip: GaugeVec,
    pub lbaas_listener_status: GaugeVec,
    pub lbaas_pool_status: GaugeVec,
    pub lbaas_member_status: GaugeVec,
}

impl MetricSet {
    /// Builds an empty set under `namespace`.
    ///
    /// Fails only on an invalid namespace; every name and label below is valid.
    pub fn new(namespace: &str, quotas: Arc<QuotaRegistry>) -> prometheus::Result<Self> {
        let ns = namespace;
        let server = ["service_type", "instance_name"];
        let vps = ["server_id", "name", "region_id"];
        let cluster = ["cluster_id", "name"];
        let nodegroup = ["cluster_id", "cluster_name", "nodegroup_id", "nodegroup_name"];
        let lb = ["loadbalancer_id", "loadbalancer_name"];

        Ok(Self {
            scrape_duration_seconds: Gauge::with_opts(
                Opts::new("scrape_duration_seconds", "Duration of the last scrape in seconds")
                    .namespace(ns),
            )?,
            scrape_success: Gauge::with_opts(
                Opts::new(
                    "scrape_success",
                    "Whether the last scrape was successful (1 for success, 0 for failure)",
                )
                .namespace(ns),
            )?,
            last_scrape_error: gauge_vec(
                ns,
                "last_scrape_error",
                "Error status of last scrape attempt (1 if error occurred, with error type label)",
                &["error_type"],
            )?,
            source_unsupported: gauge_vec(
                ns,
                "source_unsupported",
                "Whether the source is not supported by the backend (1 = unsupported)",
                &["source"],
            )?,
            source_fetch_duration_seconds: gauge_vec(
                ns,
                "source_fetch_duration_seconds",
                "Duration of the last fetch of each source in seconds",
                &["source"],
            )?,

            prepay_balance: gauge_vec(ns, "prepay_balance", "Current prepay balance", &["account"])?,
            credit_balance: gauge_vec(ns, "credit_balance", "Current credit balance", &["account"])?,
            debt_balance: gauge_vec(ns, "debt_balance", "Current debt balance", &["account"])?,
            bonus_balance: gauge_vec(ns, "bonus_balance", "Current bonus balance", &["account"])?,
            blocked_balance: gauge_vec(ns, "blocked_balance", "Current blocked balance", &["account"])?,

            domain_counters: gauge_vec(ns, "domain_counters", "Domain counters", &["bucket"])?,
            domain_expiry_days: gauge_vec(ns, "domain_expiry_days", "Days until domain expiry", &["domain"])?,
            domain_status: gauge_vec(
                ns,
                "domain_status",
                "Domain status (1 = active, 0 = inactive)",
                &["domain", "status"],
            )?,

            project_amount: gauge_vec(ns, "project_amount", "Project amount", &["project"])?,
            project_disk_usage_gb: gauge_vec(ns, "project_disk_usage_gb", "Project disk usage in GB", &["project"])?,
            project_disk_limit_gb: gauge_vec(ns, "project_disk_limit_gb", "Project disk limit in GB", &["project"])?,
            project_bw_usage_gb: gauge_vec(ns, "project_bw_usage_gb", "Project bandwidth usage in GB", &["project"])?,
            project_bw_limit_gb: gauge_vec(ns, "project_bw_limit_gb", "Project bandwidth limit in GB", &["project"])?,

            invoice_counters: gauge_vec(ns, "invoice_counters", "Invoice counters", &["bucket"])?,
            invoice_amount: gauge_vec(ns, "invoice_amount", "Invoice amount", &["invoice_id"])?,
            invoice_status_count: gauge_vec(
                ns,
                "invoice_status_count",
                "Number of listed invoices by status",
                &["status"],
            )?,

            cloud_quota: gauge_vec(ns, "cloud_quota", "Cloud quota", &["resource"])?,
            cloud_summary: gauge_vec(ns, "cloud_summary", "Cloud summary", &["resource"])?,
            cloud_instance_info: gauge_vec(
                ns,
                "cloud_instance_info",
                "Cloud instance info",
                &["instance_name", "info"],
            )?,
            cloud_instance_flavor: gauge_vec(
                ns,
                "cloud_instance_flavor",
                "Cloud instance flavor (always 1)",
                &["instance_name", "flavor"],
            )?,
            cloud_instance_count: gauge_vec(
                ns,
                "cloud_instance_count",
                "Count of cloud instances by status",
                &["status"],
            )?,

            server_ram_mb: gauge_vec(ns, "server_ram_mb", "Server RAM in MB", &server)?,
            server_cores: gauge_vec(ns, "server_cores", "Server CPU cores", &server)?,
            server_ip_count: gauge_vec(ns, "server_ip_count", "Number of IPs associated with server", &server)?,
            server_status: gauge_vec(
                ns,
                "server_status",
                "Server status (1 = active, 0 = inactive)",
                &["service_type", "instance_name", "status"],
            )?,

            vps_server_status: gauge_vec(
                ns,
                "vps_server_status",
                "VPS server status (1 = active, 0 = inactive)",
                &["server_id", "name", "status"],
            )?,
            vps_server_ram_gb: gauge_vec(ns, "vps_server_ram_gb", "VPS server RAM in GB", &vps)?,
            vps_server_cores: gauge_vec(ns, "vps_server_cores", "VPS server CPU cores", &vps)?,
            vps_server_disk_gb: gauge_vec(ns, "vps_server_disk_gb", "VPS server boot disk size in GB", &vps)?,
            vps_server_amount: gauge_vec(ns, "vps_server_amount", "VPS server amount", &vps)?,
            vps_server_count: gauge_vec(ns, "vps_server_count", "Count of VPS servers by status", &["status"])?,

            k8s_cluster_count: gauge_vec(ns, "k8s_cluster_count", "Number of Kubernetes clusters", &["status"])?,
            k8s_cluster_status: gauge_vec(
                ns,
                "k8s_cluster_status",
                "Status of Kubernetes cluster (1=active, 0=inactive)",
                &[
                    "cluster_id",
                    "name",
                    "status",
                    "endpoint_id",
                    "region_id",
                    "project_id",
                    "template_name",
                ],
            )?,
            k8s_cluster_nodes: gauge_vec(
                ns,
                "k8s_cluster_nodes",
                "Number of worker nodes in Kubernetes cluster",
                &cluster,
            )?,
            k8s_cluster_masters: gauge_vec(
                ns,
                "k8s_cluster_masters",
                "Number of master nodes in Kubernetes cluster",
                &cluster,
            )?,
            k8s_nodegroup_status: gauge_vec(
                ns,
                "k8s_nodegroup_status",
                "Status of Kubernetes node group (1=active, 0=inactive)",
                &["cluster_id", "cluster_name", "nodegroup_id", "nodegroup_name", "status"],
            )?,
            k8s_nodegroup_nodes: gauge_vec(
                ns,
                "k8s_nodegroup_nodes",
                "Number of nodes in Kubernetes node group",
                &nodegroup,
            )?,
            k8s_nodegroup_cores: gauge_vec(
                ns,
                "k8s_nodegroup_cores",
                "Number of CPU cores per node in Kubernetes node group",
                &nodegroup,
            )?,
            k8s_nodegroup_ram_mb: gauge_vec(
                ns,
                "k8s_nodegroup_ram_mb",
                "Amount of RAM per node in Kubernetes node group (MB)",
                &nodegroup,
            )?,
            k8s_project_status_count: gauge_vec(
                ns,
                "k8s_project_status_count",
                "Number of Kubernetes projects by status",
                &["status"],
            )?,
            k8s_project_type_count: gauge_vec(
                ns,
                "k8s_project_type_count",
                "Number of Kubernetes projects by type",
                &["type"],
            )?,
            k8s_project_quotas: QuotaFamilies::new(quotas),

            lbaas_loadbalancer_count: gauge_vec(
                ns,
                "lbaas_loadbalancer_count",
                "Count of LBaaS load balancers by status",
                &["status"],
            )?,
            lbaas_loadbalancer_status: gauge_vec(
                ns,
                "lbaas_loadbalancer_status",
                "Status of LBaaS load balancer (1 = active, 0 = inactive)",
                &["id", "name", "region_id", "cluster", "status", "vip_address", "floating_ip"],
            )?,
            lbaas_listeners_count: gauge_vec(
                ns,
                "lbaas_listeners_count",
                "Count of LBaaS listeners per load balancer",
                &lb,
            )?,
            lbaas_pools_count: gauge_vec(ns, "lbaas_pools_count", "Count of LBaaS pools per load balancer", &lb)?,
            lbaas_members_count: gauge_vec(
                ns,
                "lbaas_members_count",
                "Count of LBaaS members per load balancer",
                &lb,
            )?,
            lbaas_flavor: gauge_vec(
                ns,
                "lbaas_flavor",
                "LBaaS flavor information",
                &["loadbalancer_id", "loadbalancer_name", "flavor"],
            )?,
            lbaas_floating_ip: gauge_vec(
                ns,
                "lbaas_floating_ip",
                "Whether the LBaaS has a floating IP (1 = yes, 0 = no)",
                &lb,
            )?,
            lbaas_listener_status: gauge_vec(
                ns,
                "lbaas_listener_status",
                "Status of LBaaS listener (1 = active, 0 = inactive)",
                &["loadbalancer_id", "listener_id", "listener_name", "protocol", "status"],
            )?,
            lbaas_pool_status: gauge_vec(
                ns,
                "lbaas_pool_status",
                "Status of LBaaS pool (1 = active, 0 = inactive)",
                &["loadbalancer_id", "pool_id", "pool_name", "lb_algorithm", "status"],
            )?,
            lbaas_member_status: gauge_vec(
                ns,
                "lbaas_member_status",
                "Status of LBaaS pool member (1 = active, 0 = inactive)",
                &["loadbalancer_id", "member_id", "address", "status"],
            )?,
        })
    }

    /// Every static collector, in exposition order.
    fn collectors(&self) -> Vec<&dyn Collector> {
        vec![
            &self.scrape_duration_seconds,
            &self.scrape_success,
            &self.last_scrape_error,
            &self.source_unsupported,
            &self.source_fetch_duration_seconds,
            &self.prepay_balance,
            &self.credit_balance,
            &self.debt_balance,
            &self.bonus_balance,
            &self.blocked_balance,
            &self.domain_counters,
            &self.domain_expiry_days,
            &self.domain_status,
            &self.project_amount,
            &self.project_disk_usage_gb,
            &self.project_disk_limit_gb,
            &self.project_bw_usage_gb,
            &self.project_bw_limit_gb,
            &self.invoice_counters,
            &self.invoice_amount,
            &self.invoice_status_count,
            &self.cloud_quota,
            &self.cloud_summary,
            &self.cloud_instance_info,
            &self.cloud_instance_flavor,
            &self.cloud_instance_count,
            &self.server_ram_mb,
            &self.server_cores,
            &self.server_ip_count,
            &self.server_status,
            &self.vps_server_status,
            &self.vps_server_ram_gb,
            &self.vps_server_cores,
            &self.vps_server_disk_gb,
            &self.vps_server_amount,
            &self.vps_server_count,
            &self.k8s_cluster_count,
            &self.k8s_cluster_status,
            &self.k8s_cluster_nodes,
            &self.k8s_cluster_masters,
            &self.k8s_nodegroup_status,
            &self.k8s_nodegroup_nodes,
            &self.k8s_nodegroup_cores,
            &self.k8s_nodegroup_ram_mb,
            &self.k8s_project_status_count,
            &self.k8s_project_type_count,
            &self.lbaas_loadbalancer_count,
            &self.lbaas_loadbalancer_status,
            &self.lbaas_listeners_count,
            &self.lbaas_pools_count,
            &self.lbaas_members_count,
            &self.lbaas_flavor,
            &self.lbaas_floating_ip,
            &self.lbaas_listener_status,
            &self.lbaas_pool_status,
            &self.lbaas_member_status,
        ]
    }

    /// Descriptors of the static catalogue. Quota families are dynamic and not
    /// part of it.
    pub fn descs(&self) -> Vec<&Desc> {
        self.collectors()
            .into_iter()
            .flat_map(|c| c.desc())
            .collect()
    }

    /// Every family of the set, quota families last. Vectors without series
    /// yield families without metrics, which the registry drops on gather.
    pub fn families(&self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> = self
            .collectors()
            .into_iter()
            .flat_map(|c| c.collect())
            .collect();
        families.extend(self.k8s_project_quotas.families());
        families
    }
}
