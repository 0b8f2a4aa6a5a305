//! Pre-built account states for testing.
//!
//! Documents mirror real provider responses, including the quirks processors have
//! to cope with: numeric ids next to string ids, missing optional blocks, and
//! non-healthy statuses.

use serde_json::{Value, json};

use super::MockSource;
use crate::source::{SourceError, SourceKind};

impl MockSource {
    /// An account using every product: balance with credit, two domains, one
    /// hosting project, unpaid invoices, a small VPC, two VPS servers, one
    /// healthy Kubernetes cluster and one load balancer.
    pub fn typical_account() -> Self {
        SourceKind::ALL
            .into_iter()
            .fold(Self::new(), |mock, kind| {
                mock.with_document(kind, typical_document(kind))
            })
    }

    /// Every source fails with a transport error.
    pub fn unreachable() -> Self {
        SourceKind::ALL.into_iter().fold(Self::new(), |mock, kind| {
            mock.with_failure(
                kind,
                SourceError::Transport("connection refused".to_string()),
            )
        })
    }
}

/// The document [`MockSource::typical_account`] serves for `kind`.
pub fn typical_document(kind: SourceKind) -> Value {
    match kind {
        SourceKind::Balance => json!({
            "data": {"account": {"current": {"info": {
                "balance": 15230.5,
                "bonuses": 500,
                "blocked": 120.25,
                "credit": {
                    "credit": 0,
                    "maxCredit": 50000,
                    "availableCredit": 50000,
                    "mustPaidTill": null
                }
            }}}}
        }),
        SourceKind::DomainCounters => json!({
            "data": {"account": {"domains": {"stats": {
                "total": 2, "active": 1, "expired": 1, "pending": 0
            }}}}
        }),
        SourceKind::Domains => json!({
            "data": {"domains": {"items": [
                {"name": "example.kz", "status": "active", "expiryDate": "2030-01-15"},
                {"name": "old-brand.kz", "status": "expired", "expiryDate": "2020-06-01"}
            ]}}
        }),
        SourceKind::Projects => json!({
            "data": {"account": {"services": {"pagination": {
                "count": 1,
                "items": [{
                    "id": 73519,
                    "category": "hosting",
                    "domain": "example.kz",
                    "status": "Active",
                    "price": 2490,
                    "diskUsage": 3.2,
                    "diskLimit": 10,
                    "bandwidthUsage": 41.7,
                    "bandwidthLimit": 1000
                }]
            }}}}
        }),
        SourceKind::Invoices => json!({
            "data": {"account": {"invoice": {
                "counters": {"total": 42, "unpaid": 2, "paid": 39, "cancelled": 1},
                "pagination": {
                    "count": 2,
                    "items": [
                        {"id": 900101, "invoicenum": "PS-900101", "total": 2490, "status": "Unpaid"},
                        {"id": 900102, "invoicenum": "PS-900102", "total": 11800.5, "status": "Unpaid"}
                    ]
                }
            }}}
        }),
        SourceKind::CloudResources => json!({
            "data": {"vpc": {"service": {
                "quotas": {"resources": [
                    {"name": "cores", "used": 6, "limit": 20},
                    {"name": "ram", "used": 12288, "limit": 51200}
                ]},
                "summary": {
                    "cpuCores": 6,
                    "ramSizeGb": 12,
                    "instancesCount": 2,
                    "volumesCount": 3,
                    "volumesSizeGb": 120,
                    "networksCount": 1,
                    "floatingIpsCount": 1,
                    "securityGroupsCount": 2,
                    "routersCount": 1
                }
            }}}
        }),
        SourceKind::CloudInstances => json!({
            "data": {"vpc": {"instance": {"pagination": {
                "count": 2,
                "items": [
                    {
                        "id": "7c1f",
                        "instanceName": "web-1",
                        "flavorName": "d1.standard.4",
                        "status": "ACTIVE",
                        "floatingIpsArray": ["185.22.64.10"],
                        "volumesAttached": [
                            {"id": "v1", "volumeSize": 40},
                            {"id": "v2", "volumeSize": 60}
                        ]
                    },
                    {
                        "id": "8d2e",
                        "instanceName": "batch-1",
                        "flavorName": "d1.standard.2",
                        "status": "SHUTOFF",
                        "floatingIpsArray": [],
                        "volumesAttached": [{"id": "v3", "volumeSize": 20}]
                    }
                ]
            }}}}
        }),
        SourceKind::VpsServers => json!({
            "data": {"vps": {"server": {"pagination": {
                "count": 2,
                "items": [
                    {
                        "serverId": 5501,
                        "name": "mail",
                        "status": "ACTIVE",
                        "regionId": "kz-ala-1",
                        "tariff": {"ramGb": 4, "cores": 2, "bootDiskSizeGb": 50, "name": "VPS-4"},
                        "finances": {"amount": 6990, "billingcycle": "Monthly"}
                    },
                    {
                        "serverId": 5502,
                        "name": "legacy",
                        "status": "SUSPENDED",
                        "regionId": "kz-ast-1",
                        "tariff": {"ramGb": 2, "cores": 1, "bootDiskSizeGb": 25, "name": "VPS-2"}
                    }
                ]
            }}}}
        }),
        SourceKind::VpcServersByService => servers_by_service("vpc-app", 8192, 4),
        SourceKind::VpsServersByService => servers_by_service("vps-app", 4096, 2),
        SourceKind::K8sClusters => json!({
            "data": {"k8saas": {"cluster": {"pagination": {
                "count": 1,
                "items": [{
                    "_id": "c-01",
                    "name": "prod",
                    "status": "CREATE_COMPLETE",
                    "nodeCount": 3,
                    "masterCount": 1,
                    "projectId": 3141,
                    "endpointId": "ep-9",
                    "regionId": "kz-ala-1",
                    "clusterTemplate": {"name": "k8s-1.29"},
                    "clusterNodeGroups": [
                        {
                            "_id": "ng-01",
                            "name": "default",
                            "nodeCount": 3,
                            "status": "UPDATE_COMPLETE",
                            "flavorDetailed": {"vcpus": 4, "ram": 8192}
                        }
                    ]
                }]
            }}}}
        }),
        SourceKind::K8sProjects => json!({
            "data": {"k8saas": {"project": {"pagination": {
                "count": 1,
                "items": [{
                    "projectId": "3141",
                    "projectName": "platform",
                    "status": "ACTIVE",
                    "type": "standard",
                    "openstackServices": [{
                        "name": "compute",
                        "regionId": "kz-ala-1",
                        "quota": [
                            {"key": "ram", "limit": 100, "inUse": 40},
                            {"key": "cores", "limit": 32, "inUse": 12}
                        ]
                    }]
                }]
            }}}}
        }),
        SourceKind::LbaasLoadBalancers => json!({
            "data": {"lbaas": {"loadBalancer": {"pagination": {
                "count": 1,
                "items": [{
                    "_id": "lb-01",
                    "name": "ingress",
                    "regionId": "kz-ala-1",
                    "vipAddress": "10.0.0.5",
                    "provisioningStatus": "ACTIVE",
                    "operatingStatus": "ONLINE",
                    "cluster": {"_id": "c-01", "name": "prod"},
                    "flavorName": "lb.small",
                    "floatingIpAddress": "185.22.64.20",
                    "listeners": [
                        {"_id": "ls-1", "name": "https", "protocol": "HTTPS", "protocolPort": 443, "provisioningStatus": "ACTIVE"}
                    ],
                    "pools": [
                        {"_id": "pl-1", "name": "web", "protocol": "HTTP", "lbAlgorithm": "ROUND_ROBIN", "provisioningStatus": "ACTIVE"}
                    ],
                    "members": [
                        {"_id": "m-1", "address": "10.0.0.11", "protocolPort": 8080, "provisioningStatus": "ACTIVE"},
                        {"_id": "m-2", "address": "10.0.0.12", "protocolPort": 8080, "provisioningStatus": "ERROR"}
                    ]
                }]
            }}}}
        }),
    }
}

fn servers_by_service(name: &str, ram: u64, cores: u64) -> Value {
    json!({
        "data": {"vpc": {"instance": {"pagination": {"items": [{
            "instanceName": name,
            "floatingIpsArray": ["185.22.64.30", "185.22.64.31"],
            "ram": ram,
            "cores": cores,
            "status": "ACTIVE"
        }]}}}}
    })
}
