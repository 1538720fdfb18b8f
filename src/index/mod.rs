// src/index/mod.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::types::{IndexComponent, IndexProduct, IndexStatus, ScoredMarket};

pub mod position;

use position::{AlwaysYes, PositionPolicy};

/// Reference value every new index starts from.
pub const INITIAL_INDEX_VALUE: f64 = 100.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("cannot build an index from an empty selection")]
    EmptySelection,
    #[error("internal: {0}")]
    Internal(&'static str),
}

/// `YYMMDD` in UTC.
pub fn format_date(t: DateTime<Utc>) -> String {
    t.format("%y%m%d").to_string()
}

/// `YYMMDD-N`; `sequence` disambiguates compositions on the same UTC day.
pub fn generate_index_id(creation_time: DateTime<Utc>, sequence: u32) -> String {
    format!("{}-{}", format_date(creation_time), sequence)
}

/// Equal-weight index with the affirmative side on every component and sequence 1.
pub fn build_index_product(
    selected: &[ScoredMarket],
    creation_time: DateTime<Utc>,
) -> Result<IndexProduct, IndexError> {
    IndexBuilder::default().build(selected, creation_time, 1)
}

pub struct IndexBuilder {
    label: String,
    positions: Arc<dyn PositionPolicy>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new("polymarket")
    }
}

impl IndexBuilder {
    /// `protocol` names the index ("polymarket" -> "Polymarket Index ...").
    pub fn new(protocol: &str) -> Self {
        Self { label: display_name(protocol), positions: Arc::new(AlwaysYes) }
    }

    pub fn with_positions(mut self, positions: Arc<dyn PositionPolicy>) -> Self {
        self.positions = positions;
        self
    }

    pub fn build(
        &self,
        selected: &[ScoredMarket],
        creation_time: DateTime<Utc>,
        sequence: u32,
    ) -> Result<IndexProduct, IndexError> {
        if selected.is_empty() {
            return Err(IndexError::EmptySelection);
        }
        if sequence == 0 {
            return Err(IndexError::Internal("index sequence starts at 1"));
        }

        let end_date = selected
            .iter()
            .map(ScoredMarket::end_date)
            .min()
            .ok_or(IndexError::EmptySelection)?;

        let weight = 1.0 / selected.len() as f64;
        let components: Vec<IndexComponent> = selected
            .iter()
            .enumerate()
            .map(|(rank, m)| IndexComponent {
                market_id: m.market.id.clone(),
                protocol: m.market.protocol.clone(),
                title: m.market.title.clone(),
                weight,
                position: self.positions.position(rank, m),
                end_date: m.market.end_date,
            })
            .collect();

        let id = generate_index_id(creation_time, sequence);
        Ok(IndexProduct {
            name: format!("{} Index {}", self.label, id),
            description: format!(
                "Index of top {} {} prediction markets by TVL and expiry",
                components.len(),
                self.label
            ),
            id,
            components,
            creation_date: creation_time,
            start_date: creation_time,
            end_date,
            status: IndexStatus::Pending,
            initial_value: INITIAL_INDEX_VALUE,
            current_value: None,
            final_value: None,
        })
    }
}

fn display_name(protocol: &str) -> String {
    let mut chars = protocol.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
