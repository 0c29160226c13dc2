//! Peer discovery backends for the startup sanity check.
//!
//! - [`static_list`] - a fixed peer list from configuration.
//! - [`consul`] - the Consul HTTP catalog, with optional self-registration.

pub mod consul;
pub mod static_list;

pub use consul::ConsulDiscovery;
pub use static_list::StaticDiscovery;
