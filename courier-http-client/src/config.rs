//! HTTP client configuration.

use std::time::Duration;

/// Settings applied when the client is built.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Bound every request by `timeout`, or leave requests unbounded with `None`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
