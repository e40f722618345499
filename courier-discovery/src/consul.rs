//! Consul service discovery implementation

use crate::service::{DiscoveryClient, DiscoveryError, ServiceInstance, normalize_base_url};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Consul service discovery client
pub struct ConsulDiscovery {
    base_url: String,
    client: reqwest::Client,
}

impl ConsulDiscovery {
    /// Create new Consul discovery client
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use courier_discovery::ConsulDiscovery;
    ///
    /// let consul = ConsulDiscovery::new("http://localhost:8500")?;
    /// ```
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, DiscoveryError> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            client: reqwest::Client::new(),
        })
    }
}

#[derive(Deserialize)]
struct ConsulHealthEntry {
    #[serde(rename = "Node")]
    node: ConsulNode,
    #[serde(rename = "Service")]
    service: ConsulServiceDetail,
}

#[derive(Deserialize)]
struct ConsulNode {
    #[serde(rename = "Address")]
    address: String,
}

#[derive(Deserialize)]
struct ConsulServiceDetail {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Meta")]
    meta: Option<HashMap<String, String>>,
}

#[async_trait]
impl DiscoveryClient for ConsulDiscovery {
    fn description(&self) -> &str {
        "Consul catalog"
    }

    async fn get_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let mut url = url::Url::parse(&format!("{}/v1/health/service/", self.base_url))
            .and_then(|base| base.join(service_name))
            .map_err(|e| DiscoveryError::InvalidConfiguration(e.to_string()))?;
        url.query_pairs_mut().append_pair("passing", "true");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::from_response(response).await);
        }

        let entries: Vec<ConsulHealthEntry> = serde_json::from_str(&response.text().await?)
            .map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))?;

        let instances: Vec<ServiceInstance> = entries
            .into_iter()
            .map(|entry| {
                // An empty service address means "use the node address".
                let host = if entry.service.address.is_empty() {
                    entry.node.address
                } else {
                    entry.service.address
                };
                let mut instance = ServiceInstance::new(service_name, host, entry.service.port)
                    .with_instance_id(entry.service.id);
                instance.metadata = entry.service.meta.unwrap_or_default();
                instance
            })
            .collect();

        debug!(
            "Discovered {} instances of service {}",
            instances.len(),
            service_name
        );
        Ok(instances)
    }

    async fn get_services(&self) -> Result<Vec<String>, DiscoveryError> {
        let url = format!("{}/v1/catalog/services", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::from_response(response).await);
        }

        let services: HashMap<String, Vec<String>> = serde_json::from_str(&response.text().await?)
            .map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))?;

        let mut names: Vec<String> = services.into_keys().collect();
        names.sort();
        Ok(names)
    }
}
