// Towerdump Infrastructure Layer

pub mod config;
pub mod sources;

pub use config::*;
pub use sources::*;
