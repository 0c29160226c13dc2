#![doc = include_str!("../README.md")]

pub mod client;
mod common;
pub use common::*;
// Public re-export so downstream crates can access `scopeid` via
// `scopeid_tonic_core::scopeid`
pub use scopeid;

/// gRPC service and message definitions generated from `proto/scopeid.proto`.
///
/// ## Service
///
/// - `IdAllocator` - the allocator surface: `GetWorkerId`,
///   `GetDatacenterId`, `GetTimestamp`, `GetId` and `GetScopes`.
///
/// Server implementations live in `id_allocator_server`, the client in
/// `id_allocator_client`.
pub mod proto {
    #![allow(clippy::all, clippy::pedantic)]
    tonic::include_proto!("scopeid");

    /// Encoded file descriptor set, for `tonic-reflection`.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("scopeid_descriptor");
}
