//! Consumer error taxonomy and its HTTP status mapping.

use courier_config::ConfigError;
use courier_discovery::DiscoveryError;
use courier_http_client::HttpClientError;
use thiserror::Error;

/// Result type for consumer operations.
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Everything that can fail while serving a request or starting up.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Discovery returned no instance for the service.
    #[error("no {service_name} instance available")]
    NoInstanceAvailable { service_name: String },

    /// The call to the selected instance failed or returned a non-2xx status.
    #[error("remote call to {url} failed: {source}")]
    RemoteCallFailed {
        url: String,
        #[source]
        source: HttpClientError,
    },

    /// The registry could not be queried.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(#[from] DiscoveryError),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[from] HttpClientError),

    #[error("startup failed: {0}")]
    Startup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsumerError {
    /// HTTP status reported to the inbound caller.
    pub fn status_code(&self) -> u16 {
        match self {
            ConsumerError::NoInstanceAvailable { .. } => 503,
            ConsumerError::RemoteCallFailed { .. } => 502,
            ConsumerError::RouteNotFound(_) => 404,
            ConsumerError::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_distinguishes_failures() {
        let no_instance = ConsumerError::NoInstanceAvailable {
            service_name: "nacos-service-provider".to_string(),
        };
        let remote = ConsumerError::RemoteCallFailed {
            url: "http://10.0.0.1:8081/echo".to_string(),
            source: HttpClientError::Connection("refused".to_string()),
        };
        let registry = ConsumerError::from(DiscoveryError::InvalidResponse("eof".to_string()));

        assert_eq!(no_instance.status_code(), 503);
        assert_eq!(remote.status_code(), 502);
        assert_eq!(registry.status_code(), 500);
        assert_eq!(
            no_instance.to_string(),
            "no nacos-service-provider instance available"
        );
        assert!(remote.to_string().contains("refused"));
    }
}
