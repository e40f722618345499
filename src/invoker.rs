//! Instance selection, URL construction and the single outbound call.

use crate::error::{ConsumerError, Result};
use crate::transport::HttpTransport;
use courier_discovery::ServiceInstance;
use courier_http_client::HttpClientError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How one instance is picked out of a discovery result.
///
/// Neither policy keeps state between calls and neither balances load; any
/// member of the list is a valid answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// First instance in registry order
    #[default]
    First,
    /// Uniformly random instance
    Random,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(SelectionPolicy::First),
            "random" => Ok(SelectionPolicy::Random),
            other => Err(format!("unknown selection policy: {}", other)),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::First => write!(f, "first"),
            SelectionPolicy::Random => write!(f, "random"),
        }
    }
}

/// Build `http://{host}:{port}{path}?{query}` for an instance.
///
/// Query pairs are form-encoded in the given order; the `?` is left out
/// when there are none.
pub fn build_url<I, K, V>(instance: &ServiceInstance, path: &str, query: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = instance.uri();
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(path);

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    let encoded = serializer.finish();

    if !encoded.is_empty() {
        url.push('?');
        url.push_str(&encoded);
    }
    url
}

/// Turns a discovered instance list into one completed remote call.
pub struct Invoker<T> {
    transport: T,
    policy: SelectionPolicy,
}

impl<T: HttpTransport> Invoker<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Pick one instance of `service_name`.
    ///
    /// Fails with [`ConsumerError::NoInstanceAvailable`] on an empty list.
    pub fn select_instance<'a>(
        &self,
        service_name: &str,
        instances: &'a [ServiceInstance],
    ) -> Result<&'a ServiceInstance> {
        if instances.is_empty() {
            return Err(ConsumerError::NoInstanceAvailable {
                service_name: service_name.to_string(),
            });
        }

        let index = match self.policy {
            SelectionPolicy::First => 0,
            SelectionPolicy::Random => rand::rng().random_range(0..instances.len()),
        };
        Ok(&instances[index])
    }

    /// GET `url` once and return the body of a 2xx response.
    pub async fn invoke(&self, url: &str) -> Result<String> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|source| ConsumerError::RemoteCallFailed {
                url: url.to_string(),
                source,
            })?;

        if !response.is_success() {
            warn!(%url, status = response.status, "Remote call returned non-success status");
            return Err(ConsumerError::RemoteCallFailed {
                url: url.to_string(),
                source: HttpClientError::Response {
                    status: response.status,
                    message: response.body,
                },
            });
        }

        Ok(response.body)
    }

    /// Select an instance, build its URL and invoke it. Nothing is sent when
    /// selection fails.
    pub async fn call<I, K, V>(
        &self,
        service_name: &str,
        instances: &[ServiceInstance],
        path: &str,
        query: I,
    ) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let instance = self.select_instance(service_name, instances)?;
        let url = build_url(instance, path, query);
        debug!(service = service_name, %url, "Invoking selected instance");
        self.invoke(&url).await
    }
}
