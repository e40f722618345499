//! Service discovery for Courier
//!
//! This crate answers two questions against a service registry: which live
//! instances serve a logical service name, and which service names exist at
//! all. It never registers anything and never caches results.
//!
//! ## Backends
//!
//! - **Nacos** - naming service open API
//! - **Consul** - health and catalog endpoints
//! - **In-memory** - local snapshot for development and tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier_discovery::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let nacos = NacosDiscovery::new(NacosConfig::new("127.0.0.1:8848"))?;
//!
//!     for instance in nacos.get_instances("nacos-service-provider").await? {
//!         println!("Found: {}", instance.uri());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod consul;
pub mod memory;
pub mod nacos;
pub mod service;

pub use consul::ConsulDiscovery;
pub use memory::InMemoryDiscovery;
pub use nacos::{NacosConfig, NacosDiscovery};
pub use service::{DiscoveryClient, DiscoveryError, ServiceInstance};
