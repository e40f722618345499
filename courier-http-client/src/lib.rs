//! # Courier HTTP Client
//!
//! The outbound transport used to call discovered service instances: a
//! pooled `reqwest` client issuing single-attempt requests. There is no retry
//! and no circuit breaker; a failed call is reported to the caller as is.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http_client::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::default().with_timeout(Some(Duration::from_secs(3)));
//!     let client = HttpClient::new(config)?;
//!
//!     let response = client.get("http://10.0.0.1:8081/echo?name=nacos").await?;
//!     println!("{} {}", response.status(), response.into_text()?);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod response;

pub use client::HttpClient;
pub use config::HttpClientConfig;
pub use error::{HttpClientError, Result};
pub use response::Response;

pub use http::StatusCode;
