//! gRPC service implementation.
//!
//! - [`handler`] - the `IdAllocator` service (`IdService`).

pub mod handler;
