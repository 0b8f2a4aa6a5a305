//! Backend source boundary.
//!
//! A source is one logical query against the provider (account balance, VPS
//! servers, Kubernetes clusters, ...). The scrape orchestrator only ever talks to
//! [`SourceAdapter`]; the production implementation is [`GraphQlSource`], tests
//! use [`MockSource`].

mod graphql;
pub mod mock;
mod queries;

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub use graphql::{AccountIdentity, GraphQlConfig, GraphQlSource};
pub use mock::MockSource;

/// Raw nested response document, consumed once by one processor.
pub type RawSourceDocument = Value;

/// Outcome of one fetch.
pub type SourceResult = Result<RawSourceDocument, SourceError>;

/// Classified fetch failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Connection failure, non-success HTTP status, undecodable body, or deadline exceeded.
    #[error("transport: {0}")]
    Transport(String),
    /// The provider rejected the token.
    #[error("authentication: {0}")]
    Authentication(String),
    /// The provider answered with a GraphQL error payload.
    #[error("backend: {0}")]
    Backend(String),
    /// The adapter has no way to serve this source.
    #[error("source not supported by this adapter")]
    Unsupported,
}

impl SourceError {
    /// Short classification used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport(_) => "transport",
            SourceError::Authentication(_) => "authentication",
            SourceError::Backend(_) => "backend",
            SourceError::Unsupported => "unsupported",
        }
    }
}

/// Logical backend sources, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Balance,
    DomainCounters,
    Domains,
    Projects,
    Invoices,
    CloudResources,
    CloudInstances,
    VpsServers,
    /// VPC instances of the configured service id.
    VpcServersByService,
    /// VPS instances of the configured service id.
    VpsServersByService,
    K8sClusters,
    K8sProjects,
    LbaasLoadBalancers,
}

impl SourceKind {
    /// Every source in the fixed processing order.
    pub const ALL: [SourceKind; 13] = [
        SourceKind::Balance,
        SourceKind::DomainCounters,
        SourceKind::Domains,
        SourceKind::Projects,
        SourceKind::Invoices,
        SourceKind::CloudResources,
        SourceKind::CloudInstances,
        SourceKind::VpsServers,
        SourceKind::VpcServersByService,
        SourceKind::VpsServersByService,
        SourceKind::K8sClusters,
        SourceKind::K8sProjects,
        SourceKind::LbaasLoadBalancers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Balance => "balance",
            SourceKind::DomainCounters => "domain_counters",
            SourceKind::Domains => "domains",
            SourceKind::Projects => "projects",
            SourceKind::Invoices => "invoices",
            SourceKind::CloudResources => "cloud_resources",
            SourceKind::CloudInstances => "cloud_instances",
            SourceKind::VpsServers => "vps_servers",
            SourceKind::VpcServersByService => "vpc_servers",
            SourceKind::VpsServersByService => "vps_service_servers",
            SourceKind::K8sClusters => "k8s_clusters",
            SourceKind::K8sProjects => "k8s_projects",
            SourceKind::LbaasLoadBalancers => "lbaas_loadbalancers",
        }
    }

    /// Label value of `last_scrape_error{error_type}` for this source.
    pub fn error_type(self) -> String {
        format!("{}_fetch_error", self.name())
    }

    /// Sources that only make sense when a service id is configured.
    pub fn requires_service_id(self) -> bool {
        matches!(
            self,
            SourceKind::VpcServersByService | SourceKind::VpsServersByService
        )
    }

    /// Sources enabled for a deployment, in processing order.
    pub fn enabled(has_service_id: bool) -> Vec<SourceKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| has_service_id || !kind.requires_service_id())
            .collect()
    }

    /// Parses a source by its [`SourceKind::name`].
    pub fn from_name(name: &str) -> Option<SourceKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One fetch per logical source.
///
/// Implementations are called from the scrape thread, or from scoped worker
/// threads when parallel fetching is enabled, and must honor `deadline` for the
/// whole call.
pub trait SourceAdapter: Send + Sync {
    fn fetch(&self, kind: SourceKind, deadline: Duration) -> SourceResult;
}

impl<T: SourceAdapter + ?Sized> SourceAdapter for std::sync::Arc<T> {
    fn fetch(&self, kind: SourceKind, deadline: Duration) -> SourceResult {
        (**self).fetch(kind, deadline)
    }
}
