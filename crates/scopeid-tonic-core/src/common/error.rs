//! Error types for the ID allocation service.
//!
//! This module defines the central `Error` enum, which captures every error a
//! request handler can return. It implements `From<Error>` for
//! `tonic::Status` so handlers can propagate errors with `?` and clients
//! receive a meaningful status code.
//!
//! ## Error Cases
//! - `IdGeneration`: the allocator refused to issue an ID (clock regression).
//! - `InvalidRequest`: the client request was malformed or exceeded bounds.
//! - `ServiceShutdown`: a request arrived while the service was shutting down.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the ID allocation service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The allocator could not issue an ID.
    #[error("ID error: {0}")]
    IdGeneration(#[from] scopeid::Error),

    /// The client request was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            // Transient: the client may retry after the reported delay.
            Error::IdGeneration(e @ scopeid::Error::ClockRegression { .. }) => {
                Status::unavailable(e.to_string())
            }
            Error::IdGeneration(e) => Status::internal(format!("ID generation error: {e}")),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
