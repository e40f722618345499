//! The two request handlers: instance listing and the echo call.

use crate::error::Result;
use crate::invoker::{Invoker, SelectionPolicy};
use crate::transport::HttpTransport;
use courier_discovery::{DiscoveryClient, ServiceInstance};
use std::sync::Arc;
use tracing::debug;

/// The service this consumer calls, and what it calls on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetService {
    pub service_name: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl TargetService {
    /// `/echo?name=nacos` on `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            path: "/echo".to_string(),
            query: vec![("name".to_string(), "nacos".to_string())],
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Replace the query with a form-encoded string such as `name=nacos&x=1`.
    pub fn query_string(mut self, query: &str) -> Self {
        self.query = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        self
    }
}

/// Discovery and invocation handles shared by every request.
pub struct ConsumerService {
    discovery: Arc<dyn DiscoveryClient>,
    invoker: Invoker<Arc<dyn HttpTransport>>,
    target: TargetService,
}

impl ConsumerService {
    pub fn new(
        discovery: Arc<dyn DiscoveryClient>,
        transport: Arc<dyn HttpTransport>,
        target: TargetService,
    ) -> Self {
        Self {
            discovery,
            invoker: Invoker::new(transport),
            target,
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.invoker = self.invoker.with_policy(policy);
        self
    }

    pub fn target(&self) -> &TargetService {
        &self.target
    }

    /// All registry service names plus every instance of the target.
    pub async fn info(&self) -> Result<String> {
        let name = &self.target.service_name;
        let instances = self.discovery.get_instances(name).await?;
        let services = self.discovery.get_services().await?;

        Ok(render_info(&services, name, &instances))
    }

    /// Call the target's endpoint on one discovered instance and return its body.
    pub async fn hello(&self) -> Result<String> {
        let name = &self.target.service_name;
        let instances = self.discovery.get_instances(name).await?;
        debug!(
            service = %name,
            registry = self.discovery.description(),
            count = instances.len(),
            "Resolved instances"
        );

        let query = self.target.query.iter().map(|(k, v)| (k, v));
        self.invoker
            .call(name, &instances, &self.target.path, query)
            .await
    }
}

/// Render the listing served at `/info`.
pub fn render_info(services: &[String], target: &str, instances: &[ServiceInstance]) -> String {
    let mut out = format!(
        "Allin Services: [{}]<br/>{} instance list : <br/>",
        services.join(", "),
        target
    );

    for instance in instances {
        out.push_str(&format!(
            "serviceId: {}, host: {}, port: {}<br/>",
            instance.service_id, instance.host, instance.port
        ));
    }
    out
}
