// Towerdump Domain Layer

pub mod config;
pub mod entities;
pub mod ports;
pub mod services;
pub mod utils;
pub mod value_objects;

pub use config::*;
pub use entities::*;
pub use ports::*;
pub use services::*;
pub use utils::*;
pub use value_objects::*;
