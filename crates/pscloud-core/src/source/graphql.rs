//! Production source adapter: the provider's per-product GraphQL endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::queries::{self, Product};
use super::{SourceAdapter, SourceError, SourceKind, SourceResult};
use crate::document::Node;

/// Default provider console URL.
pub const DEFAULT_BASE_URL: &str = "https://console.ps.kz";

/// Longest response excerpt carried in an error message.
const BODY_EXCERPT_LEN: usize = 256;

/// Connection settings and query parameters for [`GraphQlSource`].
#[derive(Debug, Clone)]
pub struct GraphQlConfig {
    pub base_url: String,
    pub token: String,
    /// Enables the service-scoped VPC/VPS sources.
    pub service_id: Option<String>,
    /// Service statuses included in the projects query.
    pub project_statuses: Vec<String>,
    /// Invoice status included in the invoices query.
    pub invoice_status: String,
}

impl GraphQlConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            service_id: None,
            project_statuses: vec!["Active".to_string()],
            invoice_status: "Unpaid".to_string(),
        }
    }
}

/// Identity returned by the token check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
}

/// Blocking GraphQL client, one POST per source per cycle.
pub struct GraphQlSource {
    client: Client,
    config: GraphQlConfig,
}

impl GraphQlSource {
    /// Builds the HTTP client. Must not be called from inside an async runtime.
    pub fn new(mut config: GraphQlConfig) -> Result<Self, SourceError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("pscloud-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GraphQlConfig {
        &self.config
    }

    /// Validates the token against the account endpoint.
    pub fn test_auth(&self, deadline: Duration) -> Result<AccountIdentity, SourceError> {
        let doc = self.execute(Product::Account, queries::AUTH_CHECK, deadline)?;
        let info = Node::new(&doc).key("data").key("account").key("current").key("info");
        if info.object().is_none() {
            return Err(SourceError::Authentication(
                "account info missing from response".to_string(),
            ));
        }
        Ok(AccountIdentity {
            id: info.key("id").label(),
            email: info.key("email").str().map(str::to_string),
        })
    }

    fn request_for(&self, kind: SourceKind) -> Result<(Product, String), SourceError> {
        let cfg = &self.config;
        let request = match kind {
            SourceKind::Balance => (Product::Account, queries::BALANCE.to_string()),
            SourceKind::Projects => (
                Product::Account,
                queries::projects(&cfg.project_statuses, queries::PROJECTS_PER_PAGE),
            ),
            SourceKind::Invoices => (
                Product::Account,
                queries::invoices(&cfg.invoice_status, queries::INVOICES_PER_PAGE),
            ),
            SourceKind::CloudResources => (Product::Cloud, queries::CLOUD_RESOURCES.to_string()),
            SourceKind::CloudInstances => (Product::Cloud, queries::CLOUD_INSTANCES.to_string()),
            SourceKind::VpsServers => (Product::Vps, queries::VPS_SERVERS.to_string()),
            SourceKind::VpcServersByService => {
                let id = cfg.service_id.as_deref().ok_or(SourceError::Unsupported)?;
                (Product::Cloud, queries::servers_by_service(id))
            }
            SourceKind::VpsServersByService => {
                let id = cfg.service_id.as_deref().ok_or(SourceError::Unsupported)?;
                (Product::Vps, queries::servers_by_service(id))
            }
            SourceKind::K8sClusters => (Product::K8saas, queries::K8S_CLUSTERS.to_string()),
            SourceKind::K8sProjects => (Product::K8saas, queries::K8S_PROJECTS.to_string()),
            SourceKind::LbaasLoadBalancers => {
                (Product::Lbaas, queries::LBAAS_LOADBALANCERS.to_string())
            }
            // The console API exposes no domain listing for token holders.
            SourceKind::DomainCounters | SourceKind::Domains => {
                return Err(SourceError::Unsupported);
            }
        };
        Ok(request)
    }

    fn execute(&self, product: Product, query: &str, deadline: Duration) -> SourceResult {
        let url = format!("{}{}", self.config.base_url, product.path());
        debug!(url = %url, "posting GraphQL query");

        let response = self
            .client
            .post(&url)
            .timeout(deadline)
            .header("X-User-Token", &self.config.token)
            .bearer_auth(&self.config.token)
            .json(&Request { query })
            .send()
            .map_err(|e| transport_error(&e, deadline))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| transport_error(&e, deadline))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Authentication(format!(
                "HTTP {status}: {}",
                excerpt(&body)
            )));
        }
        if status != StatusCode::OK {
            return Err(SourceError::Transport(format!(
                "unexpected status {status}: {}",
                excerpt(&body)
            )));
        }

        let doc: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::Transport(format!("failed to decode response: {e}")))?;

        if let Some(error) = Node::new(&doc).key("errors").index(0).value() {
            return Err(classify_graphql_error(Node::new(error)));
        }
        Ok(doc)
    }
}

impl SourceAdapter for GraphQlSource {
    fn fetch(&self, kind: SourceKind, deadline: Duration) -> SourceResult {
        let (product, query) = self.request_for(kind)?;
        self.execute(product, &query, deadline)
    }
}

fn transport_error(e: &reqwest::Error, deadline: Duration) -> SourceError {
    if e.is_timeout() {
        SourceError::Transport(format!("deadline of {deadline:?} exceeded"))
    } else {
        SourceError::Transport(e.to_string())
    }
}

fn classify_graphql_error(error: Node<'_>) -> SourceError {
    let message = error
        .key("message")
        .str()
        .unwrap_or("unknown GraphQL error")
        .to_string();
    let extensions = error.key("extensions");

    if extensions.key("code").str() == Some("UNAUTHENTICATED") {
        return match extensions.key("authUrl").str().filter(|u| !u.is_empty()) {
            Some(url) => SourceError::Authentication(format!(
                "authentication required: please authenticate at {url}"
            )),
            None => SourceError::Authentication(message),
        };
    }
    SourceError::Backend(message)
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
