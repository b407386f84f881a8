// Towerdump Application Layer
// Orchestrates the load, enrichment and validation pipeline over the
// domain services

pub mod commands;
pub mod error;
pub mod queries;

pub use commands::*;
pub use error::AppError;
pub use queries::*;
