mod interface;
#[cfg(test)]
pub(crate) mod mock;
mod system_clock;

pub use interface::*;
pub use system_clock::*;
