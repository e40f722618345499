//! Outbound GET capability used by the invoker.

use async_trait::async_trait;
use courier_http_client::{HttpClient, HttpClientError};
use std::sync::Arc;

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can perform a single HTTP GET.
///
/// A completed exchange is `Ok` whatever its status; only transport-level
/// failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, HttpClientError>;
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn get(&self, url: &str) -> Result<TransportResponse, HttpClientError> {
        let response = HttpClient::get(self, url).await?;
        let status = response.status().as_u16();
        Ok(TransportResponse::new(status, response.into_text()?))
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn get(&self, url: &str) -> Result<TransportResponse, HttpClientError> {
        (**self).get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_client_transport_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = HttpClient::default_client().unwrap();
        let response = HttpTransport::get(&client, &format!("{}/missing", server.uri()))
            .await
            .unwrap();

        assert_eq!(response, TransportResponse::new(404, "nope"));
        assert!(!response.is_success());
    }
}
