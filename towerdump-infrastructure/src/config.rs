pub mod alias_files;
pub mod app_config;

pub use alias_files::*;
pub use app_config::*;
