//! Nacos naming service client (open API v1)

use crate::service::{DiscoveryClient, DiscoveryError, ServiceInstance, normalize_base_url};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Default Nacos group.
pub const DEFAULT_GROUP: &str = "DEFAULT_GROUP";

/// Connection settings for a Nacos server.
#[derive(Debug, Clone)]
pub struct NacosConfig {
    /// Server address, e.g. `127.0.0.1:8848` or `http://nacos:8848`
    pub server_addr: String,
    /// Web context of the Nacos server
    pub context_path: String,
    /// Namespace id; the server default namespace when unset
    pub namespace: Option<String>,
    /// Service group
    pub group: String,
}

impl NacosConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            context_path: "/nacos".to_string(),
            namespace: None,
            group: DEFAULT_GROUP.to_string(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }
}

/// Nacos discovery client
pub struct NacosDiscovery {
    base_url: String,
    config: NacosConfig,
    client: reqwest::Client,
}

impl NacosDiscovery {
    /// Create new Nacos discovery client
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use courier_discovery::{NacosConfig, NacosDiscovery};
    ///
    /// let nacos = NacosDiscovery::new(NacosConfig::new("127.0.0.1:8848"))?;
    /// let instances = nacos.get_instances("nacos-service-provider").await?;
    /// ```
    pub fn new(config: NacosConfig) -> Result<Self, DiscoveryError> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(config: NacosConfig, client: reqwest::Client) -> Result<Self, DiscoveryError> {
        let context = config.context_path.trim_matches('/');
        let base = normalize_base_url(&config.server_addr)?;
        let base_url = if context.is_empty() {
            base
        } else {
            format!("{}/{}", base, context)
        };

        Ok(Self {
            base_url,
            config,
            client,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<url::Url, DiscoveryError> {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| DiscoveryError::InvalidConfiguration(e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("groupName", &self.config.group);
            if let Some(namespace) = &self.config.namespace {
                pairs.append_pair("namespaceId", namespace);
            }
        }

        Ok(url)
    }
}

#[derive(Deserialize)]
struct NacosInstanceList {
    #[serde(default)]
    hosts: Vec<NacosHost>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NacosHost {
    ip: String,
    port: u16,
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default = "default_true")]
    healthy: bool,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
struct NacosServiceList {
    #[serde(default)]
    doms: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, DiscoveryError> {
    serde_json::from_str(body).map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl DiscoveryClient for NacosDiscovery {
    fn description(&self) -> &str {
        "Nacos naming service"
    }

    async fn get_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let url = self.endpoint(
            "/v1/ns/instance/list",
            &[("serviceName", service_name), ("healthyOnly", "true")],
        )?;

        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Service {} is unknown to Nacos", service_name);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(DiscoveryError::from_response(response).await);
        }

        let list: NacosInstanceList = decode(&response.text().await?)?;

        // Nacos reports group-qualified names; the queried name is the service id.
        let instances: Vec<ServiceInstance> = list
            .hosts
            .into_iter()
            .filter(|h| h.enabled && h.healthy)
            .map(|h| {
                let mut instance = ServiceInstance::new(service_name, h.ip, h.port);
                instance.instance_id = h.instance_id;
                instance.metadata = h.metadata;
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
        let page_size = i32::MAX.to_string();
        let url = self.endpoint(
            "/v1/ns/service/list",
            &[("pageNo", "1"), ("pageSize", &page_size)],
        )?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::from_response(response).await);
        }

        let list: NacosServiceList = decode(&response.text().await?)?;
        Ok(list.doms)
    }
}
