// src/service.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::composer::{ComposeError, Composer, RunOptions};
use crate::store::{IndexStore, StoreError};
use crate::types::{ComposeOutcome, IndexProduct};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("a composition run is already in progress")]
    AlreadyRunning,
    #[error("Index composition failed: no eligible markets")]
    NoEligibleMarkets,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trigger layer around the composer: one run at a time, results appended to the store.
pub struct ComposeService {
    composer: Composer,
    store: Arc<dyn IndexStore>,
    in_flight: Mutex<()>,
}

impl ComposeService {
    pub fn new(composer: Composer, store: Arc<dyn IndexStore>) -> Self {
        Self { composer, store, in_flight: Mutex::new(()) }
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    async fn compose_and_store(
        &self,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<Option<IndexProduct>, ServiceError> {
        let _guard = self.in_flight.try_lock().map_err(|_| ServiceError::AlreadyRunning)?;

        let sequence = self.store.next_sequence(now).await;
        let opts = RunOptions { sequence, dry_run };
        let Some(product) = self.composer.compose_index_with(now, opts).await? else {
            return Ok(None);
        };
        if !dry_run {
            if let Err(e) = self.store.append(product.clone()).await {
                tracing::error!(
                    index_id = %product.id,
                    error = %e,
                    "index was executed but could not be stored"
                );
                return Err(e.into());
            }
        }
        Ok(Some(product))
    }

    /// Admin action: always executes for real and reports the new index id.
    pub async fn compose_now(&self, now: DateTime<Utc>) -> Result<ComposeOutcome, ServiceError> {
        tracing::info!("manually triggering index composition");
        match self.compose_and_store(now, false).await? {
            Some(product) => Ok(ComposeOutcome {
                success: true,
                message: "Index composition triggered successfully".into(),
                index_id: product.id,
            }),
            None => Err(ServiceError::NoEligibleMarkets),
        }
    }

    /// Timer action: honours the configured dry-run flag and never fails the caller.
    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> Option<IndexProduct> {
        tracing::info!("running index composer job");
        match self.compose_and_store(now, self.composer.config().dry_run).await {
            Ok(Some(product)) => {
                tracing::info!(index_id = %product.id, "index composition successful");
                if let Ok(json) = serde_json::to_string_pretty(&product) {
                    tracing::debug!("index product: {json}");
                }
                Some(product)
            }
            Ok(None) => {
                tracing::info!("index composition did not produce a valid index");
                None
            }
            Err(ServiceError::AlreadyRunning) => {
                tracing::warn!("previous composition still in flight, skipping this tick");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "error running composer job");
                None
            }
        }
    }
}
