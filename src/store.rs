// src/store.rs
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::index::format_date;
use crate::types::{IndexProduct, IndexStatus};
use chrono::{DateTime, Utc};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("index {0} already exists")]
    Duplicate(String),
    #[error("index {id}: cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: IndexStatus, to: IndexStatus },
    #[error("index {0}: final value can only be set once settled")]
    FinalValueBeforeSettlement(String),
}

/// Externally driven changes to a stored index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexUpdate {
    pub status: Option<IndexStatus>,
    pub current_value: Option<f64>,
    pub final_value: Option<f64>,
}

impl IndexUpdate {
    fn apply_to(&self, product: &mut IndexProduct) -> Result<(), StoreError> {
        let next = self.status.unwrap_or(product.status);
        if !product.status.can_advance_to(next) {
            return Err(StoreError::InvalidTransition {
                id: product.id.clone(),
                from: product.status,
                to: next,
            });
        }
        if self.final_value.is_some() && next != IndexStatus::Settled {
            return Err(StoreError::FinalValueBeforeSettlement(product.id.clone()));
        }

        product.status = next;
        if let Some(v) = self.current_value {
            product.current_value = Some(v);
        }
        if let Some(v) = self.final_value {
            product.final_value = Some(v);
        }
        Ok(())
    }
}

/// Ordered (by insertion) collection of composed indices.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn append(&self, product: IndexProduct) -> Result<(), StoreError>;
    async fn list(&self) -> Vec<IndexProduct>;
    async fn find_by_id(&self, id: &str) -> Option<IndexProduct>;
    /// `Ok(None)` when no index has this id.
    async fn update(
        &self,
        id: &str,
        update: IndexUpdate,
    ) -> Result<Option<IndexProduct>, StoreError>;

    async fn list_by_status(&self, status: IndexStatus) -> Vec<IndexProduct> {
        self.list().await.into_iter().filter(|p| p.status == status).collect()
    }

    /// Next free `N` for ids of the form `YYMMDD-N` on the day of `at`.
    async fn next_sequence(&self, at: DateTime<Utc>) -> u32 {
        let prefix = format!("{}-", format_date(at));
        self.list()
            .await
            .iter()
            .filter_map(|p| p.id.strip_prefix(&prefix)?.parse::<u32>().ok())
            .max()
            .map_or(1, |n| n.saturating_add(1))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    indices: RwLock<Vec<IndexProduct>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for InMemoryStore {
    async fn append(&self, product: IndexProduct) -> Result<(), StoreError> {
        let mut guard = self.indices.write().await;
        if guard.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Duplicate(product.id));
        }
        guard.push(product);
        Ok(())
    }

    async fn list(&self) -> Vec<IndexProduct> {
        self.indices.read().await.clone()
    }

    async fn find_by_id(&self, id: &str) -> Option<IndexProduct> {
        self.indices.read().await.iter().find(|p| p.id == id).cloned()
    }

    async fn update(
        &self,
        id: &str,
        update: IndexUpdate,
    ) -> Result<Option<IndexProduct>, StoreError> {
        let mut guard = self.indices.write().await;
        let Some(product) = guard.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        update.apply_to(product)?;
        Ok(Some(product.clone()))
    }
}
