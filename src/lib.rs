// Courier - a registry-backed service consumer
//
// Courier resolves instances of a target service through a registry (Nacos,
// Consul or a fixed list), calls one of them over HTTP, and exposes the
// outcome on two routes: `/info` lists what the registry knows and `/hello`
// relays the target's echo response.

pub mod consumer;
pub mod error;
pub mod invoker;
pub mod logging;
pub mod server;
pub mod settings;
pub mod transport;

pub use consumer::{ConsumerService, TargetService, render_info};
pub use error::{ConsumerError, Result};
pub use invoker::{Invoker, SelectionPolicy, build_url};
pub use logging::{LogFormat, init_tracing};
pub use server::{dispatch, listen, serve};
pub use settings::{ConsumerSettings, Overrides, RegistryKind};
pub use transport::{HttpTransport, TransportResponse};

// Re-export the member crates
pub use courier_config;
pub use courier_discovery;
pub use courier_http_client;
