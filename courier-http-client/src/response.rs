//! Buffered HTTP response.

use crate::{HttpClientError, Result};
use bytes::Bytes;
use http::StatusCode;

/// Status and fully read body of a completed exchange.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
}

impl Response {
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(Self { status, body })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Consume the response; a non-UTF-8 body is a [`HttpClientError::Decode`].
    pub fn into_text(self) -> Result<String> {
        String::from_utf8(self.body.into()).map_err(|e| HttpClientError::Decode(e.to_string()))
    }
}
