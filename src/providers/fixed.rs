// src/providers/fixed.rs
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{MarketDataProvider, ProviderError};
use crate::types::MarketDescriptor;

/// In-memory provider serving a fixed market pool. Useful for offline runs and tests.
#[derive(Debug, Default)]
pub struct FixedMarkets {
    markets: Vec<MarketDescriptor>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FixedMarkets {
    pub fn new(markets: Vec<MarketDescriptor>) -> Self {
        Self { markets, ..Default::default() }
    }

    /// Make every subsequent call fail with `ProviderError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("fixed provider set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for FixedMarkets {
    async fn get_active_markets(
        &self,
        protocol: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<MarketDescriptor>, ProviderError> {
        self.check()?;
        let skip = (page.max(1) as usize - 1) * page_size as usize;
        Ok(self
            .markets
            .iter()
            .filter(|m| m.protocol == protocol)
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn get_market(
        &self,
        protocol: &str,
        id: &str,
    ) -> Result<MarketDescriptor, ProviderError> {
        self.check()?;
        self.markets
            .iter()
            .find(|m| m.protocol == protocol && m.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound { protocol: protocol.into(), id: id.into() })
    }
}
