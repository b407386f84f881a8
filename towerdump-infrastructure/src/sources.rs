pub mod file_sources;

pub use file_sources::*;
