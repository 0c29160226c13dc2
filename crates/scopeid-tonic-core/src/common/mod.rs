//! Shared types and error definitions used by both the server and clients.
//!
//! ## Submodules
//!
//! - [`error`] - Service error type and its mapping to gRPC status codes.
//! - [`types`] - ID type aliases, limits, and request validation.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
