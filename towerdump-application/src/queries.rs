// Application queries

pub mod filter_queries;
pub mod validation_queries;

pub use filter_queries::*;
pub use validation_queries::*;
