//! Runtime settings, layered from defaults, a config file and `COURIER_*` variables.

use crate::consumer::TargetService;
use crate::error::{ConsumerError, Result};
use crate::invoker::SelectionPolicy;
use crate::logging::LogFormat;
use courier_config::{ConfigManager, ConfigValidator, Validate};
use courier_discovery::{
    ConsulDiscovery, DiscoveryClient, InMemoryDiscovery, NacosConfig, NacosDiscovery,
    ServiceInstance,
};
use courier_http_client::HttpClientConfig;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of the environment variables read by [`ConsumerSettings::load`].
pub const ENV_PREFIX: &str = "COURIER";

/// Which registry backend answers discovery queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    #[default]
    Nacos,
    Consul,
    /// Fixed instance list from `static_instances`
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerSettings {
    pub server_host: String,
    pub server_port: u16,
    pub registry_kind: RegistryKind,
    pub registry_addr: String,
    pub registry_namespace: Option<String>,
    pub registry_group: String,
    /// Comma-separated `host:port` list, used with `registry_kind = "static"`
    pub static_instances: String,
    pub target_service: String,
    pub target_path: String,
    pub target_query: String,
    pub selection: SelectionPolicy,
    #[serde(deserialize_with = "optional_millis")]
    pub request_timeout_ms: Option<u64>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            registry_kind: RegistryKind::Nacos,
            registry_addr: "http://127.0.0.1:8848".to_string(),
            registry_namespace: None,
            registry_group: courier_discovery::nacos::DEFAULT_GROUP.to_string(),
            static_instances: String::new(),
            target_service: "nacos-service-provider".to_string(),
            target_path: "/echo".to_string(),
            target_query: "name=nacos".to_string(),
            selection: SelectionPolicy::First,
            request_timeout_ms: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl Validate for ConsumerSettings {
    fn validate(&self) -> courier_config::Result<()> {
        ConfigValidator::not_empty(&self.target_service, "target_service")?;
        ConfigValidator::is_path(&self.target_path, "target_path")?;
        ConfigValidator::non_zero(self.server_port, "server_port")?;
        if let Some(ms) = self.request_timeout_ms {
            ConfigValidator::non_zero(ms, "request_timeout_ms")?;
        }
        match self.registry_kind {
            RegistryKind::Static => {
                ConfigValidator::not_empty(&self.static_instances, "static_instances")
            }
            _ => ConfigValidator::not_empty(&self.registry_addr, "registry_addr"),
        }
    }
}

/// Values that win over every configured layer, e.g. command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_port: Option<u16>,
    pub registry_addr: Option<String>,
    pub target_service: Option<String>,
    pub selection: Option<SelectionPolicy>,
}

impl ConsumerSettings {
    /// Apply `overrides`, then validate again.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(port) = overrides.server_port {
            self.server_port = port;
        }
        if let Some(addr) = overrides.registry_addr {
            self.registry_addr = addr;
        }
        if let Some(service) = overrides.target_service {
            self.target_service = service;
        }
        if let Some(selection) = overrides.selection {
            self.selection = selection;
        }
        self.validate()?;
        Ok(self)
    }

    /// Defaults, then `file` when given, then `.env`, then `COURIER_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let manager = Self::seeded(file)?;
        manager.load_dotenv(None)?;
        Ok(manager.load_validated()?)
    }

    /// Like [`load`](Self::load), with `vars` standing in for `.env` and the process environment.
    pub fn load_with_vars<I>(file: Option<&Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let manager = Self::seeded(file)?;
        manager.load_vars(vars);
        Ok(manager.load_validated()?)
    }

    fn seeded(file: Option<&Path>) -> Result<ConfigManager> {
        let manager = ConfigManager::with_prefix(ENV_PREFIX);
        manager.load_defaults(&Self::default())?;
        if let Some(path) = file {
            manager.load_file(path)?;
        }
        Ok(manager)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server_host
            .parse()
            .map_err(|e| ConsumerError::Startup(format!("invalid server_host {:?}: {}", self.server_host, e)))?;
        Ok(SocketAddr::new(ip, self.server_port))
    }

    pub fn target(&self) -> TargetService {
        TargetService::new(&self.target_service)
            .path(&self.target_path)
            .query_string(&self.target_query)
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::default().with_timeout(self.request_timeout_ms.map(Duration::from_millis))
    }

    /// Build the configured registry client.
    pub async fn build_discovery(&self) -> Result<Arc<dyn DiscoveryClient>> {
        let discovery: Arc<dyn DiscoveryClient> = match self.registry_kind {
            RegistryKind::Nacos => {
                let mut config = NacosConfig::new(&self.registry_addr).group(&self.registry_group);
                if let Some(namespace) = &self.registry_namespace {
                    config = config.namespace(namespace);
                }
                Arc::new(NacosDiscovery::new(config)?)
            }
            RegistryKind::Consul => Arc::new(ConsulDiscovery::new(&self.registry_addr)?),
            RegistryKind::Static => {
                let registry = InMemoryDiscovery::new();
                for instance in parse_static_instances(&self.target_service, &self.static_instances)? {
                    registry.register(instance).await;
                }
                Arc::new(registry)
            }
        };
        Ok(discovery)
    }
}

/// Accepts `1500` or `"1500"`. The key has no typed default, so values from
/// the environment arrive as strings; an empty string means unset.
fn optional_millis<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(u64),
        Text(String),
    }

    match Option::<Millis>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Millis::Number(ms)) => Ok(Some(ms)),
        Some(Millis::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Millis::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid request_timeout_ms {:?}", text))),
    }
}

/// Parse `host:port,host:port` into instances of `service_name`.
pub fn parse_static_instances(service_name: &str, list: &str) -> Result<Vec<ServiceInstance>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (host, port) = entry
                .rsplit_once(':')
                .ok_or_else(|| ConsumerError::Startup(format!("static instance {:?} lacks a port", entry)))?;
            let port: u16 = port
                .parse()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| ConsumerError::Startup(format!("static instance {:?} has an invalid port", entry)))?;
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Ok(ServiceInstance::new(service_name, host, port))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = ConsumerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_addr().unwrap().port(), 8080);

        let target = settings.target();
        assert_eq!(target.service_name, "nacos-service-provider");
        assert_eq!(target.path, "/echo");
        assert_eq!(target.query, vec![("name".to_string(), "nacos".to_string())]);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
server_port = 9000
registry_kind = "consul"
registry_addr = "http://consul:8500"
target_service = "orders"
selection = "random"
request_timeout_ms = 1500
"#
        )
        .unwrap();

        let settings = ConsumerSettings::load_with_vars(Some(file.path()), Vec::new()).unwrap();

        assert_eq!(settings.server_port, 9000);
        assert_eq!(settings.registry_kind, RegistryKind::Consul);
        assert_eq!(settings.target_service, "orders");
        assert_eq!(settings.selection, SelectionPolicy::Random);
        assert_eq!(
            settings.http_client_config().timeout,
            Some(Duration::from_millis(1500))
        );
        // untouched keys keep their defaults
        assert_eq!(settings.target_path, "/echo");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = ConsumerSettings {
            target_path: "echo".to_string(),
            ..ConsumerSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = ConsumerSettings {
            registry_kind: RegistryKind::Static,
            ..ConsumerSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_overrides_are_validated() {
        let settings = ConsumerSettings::default()
            .with_overrides(Overrides {
                server_port: Some(9300),
                selection: Some(SelectionPolicy::Random),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(settings.server_port, 9300);
        assert_eq!(settings.selection, SelectionPolicy::Random);

        let empty_target = ConsumerSettings::default().with_overrides(Overrides {
            target_service: Some(String::new()),
            ..Overrides::default()
        });
        assert!(matches!(empty_target, Err(ConsumerError::Config(_))));

        let zero_port = ConsumerSettings::default().with_overrides(Overrides {
            server_port: Some(0),
            ..Overrides::default()
        });
        assert!(zero_port.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = ConsumerSettings {
            request_timeout_ms: Some(0),
            ..ConsumerSettings::default()
        };
        assert!(settings.validate().is_err());

        let err = ConsumerSettings::load_with_vars(None, vars(&[("COURIER_REQUEST_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_numeric_strings_from_env_stay_strings() {
        let settings = ConsumerSettings::load_with_vars(
            None,
            vars(&[
                ("COURIER_REGISTRY_NAMESPACE", "20240101"),
                ("COURIER_REGISTRY_GROUP", "42"),
                ("COURIER_TARGET_SERVICE", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.registry_namespace.as_deref(), Some("20240101"));
        assert_eq!(settings.registry_group, "42");
        assert_eq!(settings.target_service, "7");
    }

    #[test]
    fn test_typed_values_from_env() {
        let settings = ConsumerSettings::load_with_vars(
            None,
            vars(&[
                ("COURIER_SERVER_PORT", "9100"),
                ("COURIER_REQUEST_TIMEOUT_MS", "250"),
                ("COURIER_SELECTION", "random"),
                ("COURIER_LOG_FORMAT", "compact"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server_port, 9100);
        assert_eq!(settings.request_timeout_ms, Some(250));
        assert_eq!(settings.selection, SelectionPolicy::Random);
        assert_eq!(settings.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_bad_port_from_env() {
        let err = ConsumerSettings::load_with_vars(None, vars(&[("COURIER_SERVER_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConsumerError::Config(_)));
    }

    #[test]
    fn test_parse_static_instances() {
        let instances =
            parse_static_instances("api", "10.0.0.1:8081, [::1]:9000,,").unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0], ServiceInstance::new("api", "10.0.0.1", 8081));
        assert_eq!(instances[1].host, "::1");
        assert!(parse_static_instances("api", "10.0.0.1").is_err());
        assert!(parse_static_instances("api", "10.0.0.1:0").is_err());
    }

    #[tokio::test]
    async fn test_static_registry() {
        let settings = ConsumerSettings {
            registry_kind: RegistryKind::Static,
            static_instances: "10.0.0.1:8081,10.0.0.2:8081".to_string(),
            ..ConsumerSettings::default()
        };

        let discovery = settings.build_discovery().await.unwrap();
        let instances = discovery.get_instances("nacos-service-provider").await.unwrap();
        assert_eq!(instances.len(), 2);
    }
}
