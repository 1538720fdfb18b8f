// src/providers/mod.rs
use async_trait::async_trait;

use crate::types::MarketDescriptor;

pub mod fixed;
pub mod polynance;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("market data API error: status={status}, url={url}, body={body}")]
    Status { status: u16, url: String, body: String },
    #[error("decoding market data from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("market {protocol}/{id} not found")]
    NotFound { protocol: String, id: String },
    #[error("market data unavailable: {0}")]
    Unavailable(String),
}

/// Source of live market descriptors. Failures are surfaced, never retried here.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// One page (1-based) of currently active markets for `protocol`.
    async fn get_active_markets(
        &self,
        protocol: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<MarketDescriptor>, ProviderError>;

    async fn get_market(&self, protocol: &str, id: &str) -> Result<MarketDescriptor, ProviderError>;
}
