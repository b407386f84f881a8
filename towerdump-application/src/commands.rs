// Application commands

pub mod enrich_commands;
pub mod load_commands;

pub use enrich_commands::*;
pub use load_commands::*;
