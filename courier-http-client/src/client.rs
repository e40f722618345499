//! HTTP client implementation.

use std::time::Instant;
use tracing::debug;

use crate::{HttpClientConfig, HttpClientError, Response, Result};

/// Pooled HTTP client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpClientError::Connection(format!("failed to build client: {}", e)))?;

        Ok(Self { inner })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(HttpClientConfig::default())
    }

    /// GET `url` exactly once and read the whole body.
    ///
    /// Any completed exchange is `Ok`, whatever its status.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let url = url::Url::parse(url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", url, e)))?;
        let started = Instant::now();

        let response = self.inner.get(url.clone()).send().await.inspect_err(|e| {
            debug!(%url, error = %e, "Request failed");
        })?;

        debug!(
            %url,
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        Response::from_reqwest(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .and(query_param("name", "nacos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello nacos"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::default_client().unwrap();
        let response = client
            .get(&format!("{}/echo?name=nacos", server.uri()))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.into_text().unwrap(), "hello nacos");
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("broken"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::default_client().unwrap();
        let response = client.get(&server.uri()).await.unwrap();

        assert_eq!(response.status().as_u16(), 500);
        assert!(!response.is_success());
        assert_eq!(response.into_text().unwrap(), "broken");
    }

    #[tokio::test]
    async fn test_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = HttpClientConfig::default().with_timeout(Some(Duration::from_millis(50)));
        let client = HttpClient::new(config).unwrap();
        let err = client.get(&server.uri()).await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HttpClient::default_client().unwrap();
        let err = client
            .get(&format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap_err();

        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = HttpClient::default_client().unwrap();
        let err = client.get("not a url").await.unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidUrl(_)));
    }
}
