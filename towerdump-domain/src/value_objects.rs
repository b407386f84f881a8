// Domain value objects
pub mod connection_type;
pub mod severity;

pub use connection_type::*;
pub use severity::*;
