//! # Common ID Types and Limits
//!
//! This module pins the concrete types the server and its clients agree on,
//! and the validation applied to incoming requests.
//!
//! ## Type Aliases
//!
//! - [`Clock`] - The clock used for ID timestamps and peer comparisons
//! - [`Allocator`] - The allocator served over gRPC
//!
//! ## Constants
//!
//! - [`MAX_SCOPE_LEN`] - Longest accepted scope name, in bytes
//! - [`DEFAULT_SERVICE_NAME`] - Name under which instances register

use crate::{Error, Result};
use scopeid::SystemClock;

/// The wall clock used by generators and reported to peers.
pub type Clock = SystemClock;

/// The allocator type served by `scopeid-tonic-server`.
pub type Allocator = scopeid::Allocator<Clock>;

/// Longest accepted scope name, in bytes.
///
/// Scopes live for the lifetime of the process, so their names are bounded to
/// keep the registry's footprint predictable.
pub const MAX_SCOPE_LEN: usize = 255;

/// Service name instances register under in a discovery catalog.
pub const DEFAULT_SERVICE_NAME: &str = "idgenerator";

/// Checks a client-supplied scope name.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if the scope is empty or longer than
/// [`MAX_SCOPE_LEN`] bytes.
pub fn validate_scope(scope: &str) -> Result<&str> {
    if scope.is_empty() {
        return Err(Error::InvalidRequest {
            reason: "Scope must not be empty".to_string(),
        });
    }
    if scope.len() > MAX_SCOPE_LEN {
        return Err(Error::InvalidRequest {
            reason: format!(
                "Scope length {} exceeds maximum allowed ({MAX_SCOPE_LEN})",
                scope.len()
            ),
        });
    }
    Ok(scope)
}
