//! GraphQL query builders for the provider's product endpoints.

/// Product endpoint a query is posted to, relative to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Product {
    Account,
    Cloud,
    Vps,
    K8saas,
    Lbaas,
}

impl Product {
    pub(super) fn path(self) -> &'static str {
        match self {
            Product::Account => "/account/graphql",
            Product::Cloud => "/cloud/graphql",
            Product::Vps => "/vps/graphql",
            Product::K8saas => "/k8saas/graphql",
            Product::Lbaas => "/lbaas/graphql",
        }
    }
}

pub(super) const PROJECTS_PER_PAGE: u32 = 100;
pub(super) const INVOICES_PER_PAGE: u32 = 20;

/// Renders a GraphQL string literal. JSON string syntax is a valid subset.
fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Keeps only characters valid in a GraphQL enum value.
fn enum_literal(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

pub(super) const AUTH_CHECK: &str = r#"
    query {
        account {
            current {
                info {
                    id
                    email
                }
            }
        }
    }
"#;

pub(super) const BALANCE: &str = r#"
    query {
        account {
            current {
                info {
                    balance
                    bonuses
                    blocked
                    credit {
                        availableCredit
                        credit
                        maxCredit
                        mustPaidTill
                    }
                }
            }
        }
    }
"#;

pub(super) fn projects(statuses: &[String], per_page: u32) -> String {
    let statuses = statuses
        .iter()
        .map(|s| enum_literal(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
    query {{
        account {{
            services {{
                pagination(perPage: {per_page}, filter: {{ statuses: [{statuses}] }}) {{
                    items {{
                        id
                        category
                        domain
                        status
                        price
                        diskUsage
                        diskLimit
                        bandwidthUsage
                        bandwidthLimit
                    }}
                    count
                }}
            }}
        }}
    }}
"#
    )
}

pub(super) fn invoices(status: &str, per_page: u32) -> String {
    let status = string_literal(status);
    format!(
        r#"
    query {{
        account {{
            invoice {{
                counters {{
                    total
                    unpaid
                    paid
                    cancelled
                }}
                pagination(perPage: {per_page}, filter: {{ status: {status} }}) {{
                    items {{
                        id
                        invoicenum
                        date
                        duedate
                        total
                        status
                    }}
                    count
                }}
            }}
        }}
    }}
"#
    )
}

pub(super) const CLOUD_RESOURCES: &str = r#"
    query {
        vpc {
            service {
                quotas {
                    resources {
                        used
                        limit
                        name
                    }
                }
                summary {
                    cpuCores
                    ramSizeGb
                    instancesCount
                    volumesCount
                    volumesSizeGb
                    networksCount
                    floatingIpsCount
                    securityGroupsCount
                    routersCount
                }
            }
        }
    }
"#;

pub(super) const CLOUD_INSTANCES: &str = r#"
    query {
        vpc {
            instance {
                pagination(perPage: 1000) {
                    items {
                        id
                        instanceName
                        flavorName
                        status
                        floatingIpsArray
                        volumesAttached {
                            id
                            volumeSize
                        }
                    }
                    count
                }
            }
        }
    }
"#;

pub(super) const VPS_SERVERS: &str = r#"
    query {
        vps {
            server {
                pagination(perPage: 100) {
                    items {
                        serverId
                        name
                        status
                        regionId
                        tariff {
                            ramGb
                            cores
                            bootDiskSizeGb
                            name
                        }
                        finances {
                            amount
                            billingcycle
                            nextduedate
                        }
                    }
                    count
                }
            }
        }
    }
"#;

/// Active instances of one service. The VPC and VPS endpoints share this shape.
pub(super) fn servers_by_service(service_id: &str) -> String {
    let service_id = string_literal(service_id);
    format!(
        r#"
    query {{
        vpc {{
            instance {{
                pagination(perPage: 1000, filter: {{ serviceId: {service_id}, status: ACTIVE }}) {{
                    items {{
                        instanceName
                        floatingIpsArray
                        ram
                        cores
                        status
                    }}
                }}
            }}
        }}
    }}
"#
    )
}

pub(super) const K8S_CLUSTERS: &str = r#"
    query {
        k8saas {
            cluster {
                pagination {
                    count
                    items {
                        _id
                        name
                        status
                        nodeCount
                        masterCount
                        projectId
                        endpointId
                        regionId
                        clusterTemplate {
                            name
                        }
                        clusterNodeGroups {
                            _id
                            name
                            nodeCount
                            flavorDetailed {
                                vcpus
                                ram
                            }
                            status
                        }
                    }
                }
            }
        }
    }
"#;

pub(super) const K8S_PROJECTS: &str = r#"
    query {
        k8saas {
            project {
                pagination {
                    count
                    items {
                        projectId
                        projectName
                        status
                        type
                        openstackServices {
                            name
                            regionId
                            quota {
                                key
                                limit
                                inUse
                            }
                        }
                    }
                }
            }
        }
    }
"#;

pub(super) const LBAAS_LOADBALANCERS: &str = r#"
    query {
        lbaas {
            loadBalancer {
                pagination(first: 100) {
                    count
                    items {
                        _id
                        name
                        regionId
                        vipAddress
                        provisioningStatus
                        operatingStatus
                        cluster {
                            _id
                            name
                        }
                        listeners {
                            _id
                            name
                            protocol
                            protocolPort
                            provisioningStatus
                            operatingStatus
                        }
                        pools {
                            _id
                            name
                            protocol
                            lbAlgorithm
                            provisioningStatus
                            operatingStatus
                        }
                        members {
                            _id
                            address
                            protocolPort
                            provisioningStatus
                            operatingStatus
                        }
                        flavorName
                        floatingIpAddress
                    }
                }
            }
        }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_query_filters_statuses() {
        let q = projects(&["Active".into(), "Suspended\"}".into(), "".into()], 100);
        assert!(q.contains("statuses: [Active, Suspended]"));
        assert!(q.contains("perPage: 100"));
    }

    #[test]
    fn service_id_is_quoted() {
        let q = servers_by_service(r#"12"} evil"#);
        assert!(q.contains(r#"serviceId: "12\"} evil""#));
    }

    #[test]
    fn invoices_query_quotes_status() {
        let q = invoices("Unpaid", 20);
        assert!(q.contains(r#"filter: { status: "Unpaid" }"#));
    }
}
