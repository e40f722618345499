//! Service instances and the registry query trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Service discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Registry returned status {status}: {message}")]
    RegistryStatus { status: u16, message: String },

    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DiscoveryError {
    /// Build a status error from a registry response, keeping its body as the message.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        DiscoveryError::RegistryStatus { status, message }
    }
}

/// One registered, addressable endpoint of a logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Logical service name this instance belongs to
    pub service_id: String,

    /// Host/IP address
    pub host: String,

    /// Port number
    pub port: u16,

    /// Registry-assigned instance id, when the registry provides one
    pub instance_id: Option<String>,

    /// Metadata
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    /// Create new service instance
    pub fn new(service_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_id: service_id.into(),
            host: host.into(),
            port,
            instance_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the registry instance id
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Plain-HTTP base URI, e.g. `http://10.0.0.1:8081`. IPv6 hosts are bracketed.
    pub fn uri(&self) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// Read-only view of a service registry.
///
/// Implementations query the registry on every call; nothing is cached
/// between lookups. They must be safe to share across concurrent requests.
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Short name of the backing registry, for diagnostics.
    fn description(&self) -> &str;

    /// All live instances registered under `service_name`.
    ///
    /// An unknown service, or one without healthy instances, yields an empty
    /// list rather than an error.
    async fn get_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError>;

    /// Every service name currently known to the registry.
    async fn get_services(&self) -> Result<Vec<String>, DiscoveryError>;
}

#[async_trait]
impl<D: DiscoveryClient + ?Sized> DiscoveryClient for Arc<D> {
    fn description(&self) -> &str {
        (**self).description()
    }

    async fn get_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        (**self).get_instances(service_name).await
    }

    async fn get_services(&self) -> Result<Vec<String>, DiscoveryError> {
        (**self).get_services().await
    }
}

/// Normalize a registry address: add `http://` when no scheme is given and
/// drop trailing slashes.
pub(crate) fn normalize_base_url(addr: &str) -> Result<String, DiscoveryError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(DiscoveryError::InvalidConfiguration(
            "registry address is empty".to_string(),
        ));
    }

    let with_scheme = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    };

    url::Url::parse(&with_scheme)
        .map_err(|e| DiscoveryError::InvalidConfiguration(format!("{}: {}", addr, e)))?;

    Ok(with_scheme.trim_end_matches('/').to_string())
}
