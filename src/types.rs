// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prediction market as reported by the market-data provider. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDescriptor {
    pub protocol: String,        // e.g. "polymarket"
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub liquidity: Option<f64>,  // monetary amount, may be absent
    pub end_date: DateTime<Utc>, // resolution time
}

/// A market annotated with the metrics used for ranking. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMarket {
    #[serde(flatten)]
    pub market: MarketDescriptor,
    pub tvl: f64,            // liquidity, 0 when absent
    pub days_to_expiry: i64, // rounded absolute days from evaluation time
    pub score: f64,          // tvl / (days_to_expiry + 1)
}

impl ScoredMarket {
    pub fn id(&self) -> &str {
        &self.market.id
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.market.end_date
    }
}

/// Binary outcome side held by an index component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    Pending,
    Open,
    Settled,
}

impl IndexStatus {
    fn rank(self) -> u8 {
        match self {
            IndexStatus::Pending => 0,
            IndexStatus::Open => 1,
            IndexStatus::Settled => 2,
        }
    }

    /// Lifecycle only moves forward: PENDING -> OPEN -> SETTLED. Staying put is allowed.
    pub fn can_advance_to(self, next: IndexStatus) -> bool {
        next.rank() == self.rank() || next.rank() == self.rank() + 1
    }
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IndexStatus::Pending => "pending",
            IndexStatus::Open => "open",
            IndexStatus::Settled => "settled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexComponent {
    pub market_id: String,
    pub protocol: String,
    pub title: String,
    pub weight: f64, // (0, 1], sums to 1 across the index
    pub position: Position,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexProduct {
    pub id: String, // YYMMDD-N
    pub name: String,
    pub description: String,
    pub components: Vec<IndexComponent>, // selection rank order
    pub creation_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>, // earliest component end date
    pub status: IndexStatus,
    pub initial_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_value: Option<f64>,
}

/// Payload returned by the manual trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeOutcome {
    pub success: bool,
    pub message: String,
    pub index_id: String,
}
