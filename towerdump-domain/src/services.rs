// Domain services

pub mod cleaning;
pub mod detector;
pub mod geo;
pub mod registry;
pub mod schema;
pub mod timestamps;
pub mod validator;

pub use cleaning::*;
pub use detector::*;
pub use registry::*;
pub use schema::*;
pub use timestamps::*;
pub use validator::*;
