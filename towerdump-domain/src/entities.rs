// Domain entities

pub mod anomaly;
pub mod record;
pub mod report;
pub mod table;
pub mod tower;

pub use anomaly::*;
pub use record::*;
pub use report::*;
pub use table::*;
pub use tower::*;
