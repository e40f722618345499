//! In-memory registry snapshot (for development and testing)

use crate::service::{DiscoveryClient, DiscoveryError, ServiceInstance};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory registry keyed by service name.
///
/// Instances are returned in registration order.
#[derive(Clone)]
pub struct InMemoryDiscovery {
    services: Arc<RwLock<HashMap<String, Vec<ServiceInstance>>>>,
}

impl InMemoryDiscovery {
    /// Create new in-memory discovery
    pub fn new() -> Self {
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add an instance under its `service_id`.
    ///
    /// Registering the same host and port twice replaces the earlier entry.
    pub async fn register(&self, instance: ServiceInstance) {
        let mut services = self.services.write().await;
        let instances = services.entry(instance.service_id.clone()).or_default();

        match instances
            .iter_mut()
            .find(|i| i.host == instance.host && i.port == instance.port)
        {
            Some(existing) => *existing = instance,
            None => instances.push(instance),
        }
    }

    /// Remove one instance. Returns whether anything was removed.
    pub async fn deregister(&self, service_name: &str, host: &str, port: u16) -> bool {
        let mut services = self.services.write().await;
        let Some(instances) = services.get_mut(service_name) else {
            return false;
        };

        let before = instances.len();
        instances.retain(|i| !(i.host == host && i.port == port));
        let removed = instances.len() != before;

        if instances.is_empty() {
            services.remove(service_name);
        }
        removed
    }

    /// Clear all registered services
    pub async fn clear(&self) {
        self.services.write().await.clear();
    }

    /// Total number of registered instances
    pub async fn count(&self) -> usize {
        self.services.read().await.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoveryClient for InMemoryDiscovery {
    fn description(&self) -> &str {
        "in-memory registry"
    }

    async fn get_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .services
            .read()
            .await
            .get(service_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_services(&self) -> Result<Vec<String>, DiscoveryError> {
        let mut names: Vec<String> = self.services.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_discovery() {
        let discovery = InMemoryDiscovery::new();

        discovery
            .register(ServiceInstance::new("api", "10.0.0.1", 8080))
            .await;
        discovery
            .register(ServiceInstance::new("api", "10.0.0.2", 8080))
            .await;
        assert_eq!(discovery.count().await, 2);

        let instances = discovery.get_instances("api").await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].host, "10.0.0.1");
        assert_eq!(instances[1].host, "10.0.0.2");
        assert!(instances.iter().all(|i| i.service_id == "api"));

        assert!(discovery.deregister("api", "10.0.0.1", 8080).await);
        assert!(!discovery.deregister("api", "10.0.0.1", 8080).await);
        assert_eq!(discovery.count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_service_is_empty() {
        let discovery = InMemoryDiscovery::new();

        let instances = discovery.get_instances("nonexistent").await.unwrap();
        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn test_reregister_replaces() {
        let discovery = InMemoryDiscovery::new();

        discovery
            .register(ServiceInstance::new("api", "10.0.0.1", 8080))
            .await;
        discovery
            .register(ServiceInstance::new("api", "10.0.0.1", 8080).with_metadata("v", "2"))
            .await;

        let instances = discovery.get_instances("api").await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].metadata.get("v").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_list_services_sorted() {
        let discovery = InMemoryDiscovery::new();
        discovery.register(ServiceInstance::new("orders", "h", 1)).await;
        discovery.register(ServiceInstance::new("api", "h", 2)).await;
        discovery.register(ServiceInstance::new("api", "h", 3)).await;

        assert_eq!(discovery.get_services().await.unwrap(), vec!["api", "orders"]);

        discovery.clear().await;
        assert!(discovery.get_services().await.unwrap().is_empty());
    }
}
