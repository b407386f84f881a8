use async_trait::async_trait;

use crate::entities::Table;

/// A parsed tabular input handed over by the file-parsing boundary.
/// Implementations live in infrastructure; the load pipeline only ever
/// sees the generic `Table` shape.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Fetch the full table. An unreadable or unrecognized source is a
    /// fatal condition and must surface as an error, never as an empty
    /// table.
    async fn fetch(&self) -> anyhow::Result<Table>;

    /// Tag recorded on every record loaded from this source.
    fn label(&self) -> &str;
}
