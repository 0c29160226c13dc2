//! Server-side components of the scopeid allocator service.
//!
//! - [`config`] - CLI/environment configuration and its validation.
//! - [`discovery`] - where the startup check finds its peers.
//! - [`service`] - the `IdAllocator` gRPC service.
//! - [`startup`] - the startup sanity check.
//! - [`telemetry`] - logging and optional OpenTelemetry export.

pub mod config;
pub mod discovery;
pub mod service;
pub mod startup;
pub mod telemetry;
