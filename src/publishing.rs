// src/publishing.rs
use crate::types::IndexProduct;

/// Downstream execution of a freshly composed index (on-chain setup, signing, ...).
/// Only invoked when the run is not a dry run.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync + 'static {
    async fn publish_index(&self, product: &IndexProduct) -> anyhow::Result<()>;
}

/// Logs the product instead of executing anything.
pub struct LogPublisher;

#[async_trait::async_trait]
impl Publisher for LogPublisher {
    async fn publish_index(&self, product: &IndexProduct) -> anyhow::Result<()> {
        tracing::info!(
            index_id = %product.id,
            components = product.components.len(),
            end_date = %product.end_date,
            "[INDEX] ready for execution"
        );
        Ok(())
    }
}
