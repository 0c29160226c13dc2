mod scope;
mod status;

pub use scope::*;
pub use status::*;
