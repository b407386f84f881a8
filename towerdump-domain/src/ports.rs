// Source Port Traits (Interfaces)
// Define what the domain needs from the file-parsing boundary

pub mod sources;

pub use sources::*;
