#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod allocator;
#[cfg(feature = "cluster")]
pub mod cluster;
mod error;
mod generator;
mod id;
mod identity;
mod registry;
mod time;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::identity::*;
pub use crate::registry::*;
pub use crate::time::*;
