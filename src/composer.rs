// src/composer.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::ComposerConfig;
use crate::index::position::PositionPolicy;
use crate::index::{IndexBuilder, IndexError};
use crate::providers::{MarketDataProvider, ProviderError};
use crate::publishing::Publisher;
use crate::scoring::{score_and_filter, select_top};
use crate::types::{IndexProduct, MarketDescriptor, ScoredMarket};

#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    #[error("fetching markets: {0}")]
    Fetch(#[from] ProviderError),
    #[error("building index: {0}")]
    Build(#[from] IndexError),
}

/// Where a run currently is. FETCHING may fail; later stages can only end in DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Filtering,
    Building,
    Done,
}

/// Per-run knobs that differ between the scheduled and the manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub sequence: u32,
    pub dry_run: bool,
}

impl From<&ComposerConfig> for RunOptions {
    fn from(cfg: &ComposerConfig) -> Self {
        Self { sequence: 1, dry_run: cfg.dry_run }
    }
}

/// fetch -> score/filter -> top-N -> build. Holds no state between runs.
pub struct Composer {
    cfg: ComposerConfig,
    provider: Arc<dyn MarketDataProvider>,
    publisher: Arc<dyn Publisher>,
    builder: IndexBuilder,
}

impl Composer {
    pub fn new(
        cfg: ComposerConfig,
        provider: Arc<dyn MarketDataProvider>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let builder = IndexBuilder::new(&cfg.protocol);
        Self { cfg, provider, publisher, builder }
    }

    pub fn with_positions(mut self, positions: Arc<dyn PositionPolicy>) -> Self {
        self.builder = self.builder.with_positions(positions);
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.cfg
    }

    /// First page of active markets for the configured protocol.
    pub async fn fetch_active_markets(&self) -> Result<Vec<MarketDescriptor>, ProviderError> {
        #[cfg(feature = "metrics")]
        let _timer = crate::metrics::FETCH_LATENCY.start_timer();

        let markets = self
            .provider
            .get_active_markets(&self.cfg.protocol, 1, self.cfg.page_size)
            .await?;
        tracing::info!(
            protocol = %self.cfg.protocol,
            fetched = markets.len(),
            "fetched active markets"
        );
        Ok(markets)
    }

    pub fn select_markets_for_index(
        &self,
        markets: &[MarketDescriptor],
        evaluation_time: DateTime<Utc>,
    ) -> Vec<ScoredMarket> {
        let ranked = score_and_filter(
            markets,
            self.cfg.min_tvl,
            self.cfg.max_days_to_expiry,
            evaluation_time,
        );
        select_top(ranked, self.cfg.max_components)
    }

    /// One run with the configured dry-run flag. `Ok(None)` means nothing qualified.
    /// Errors are returned unlogged; the trigger that started the run reports them.
    pub async fn compose_index(
        &self,
        evaluation_time: DateTime<Utc>,
    ) -> Result<Option<IndexProduct>, ComposeError> {
        self.compose_index_with(evaluation_time, RunOptions::from(&self.cfg)).await
    }

    pub async fn compose_index_with(
        &self,
        evaluation_time: DateTime<Utc>,
        opts: RunOptions,
    ) -> Result<Option<IndexProduct>, ComposeError> {
        let result = self.run(evaluation_time, opts).await;

        #[cfg(feature = "metrics")]
        {
            let outcome = match &result {
                Ok(Some(_)) => "composed",
                Ok(None) => "empty",
                Err(ComposeError::Fetch(_)) => "fetch_error",
                Err(ComposeError::Build(_)) => "build_error",
            };
            crate::metrics::RUNS_TOTAL.with_label_values(&[outcome]).inc();
        }

        result
    }

    async fn run(
        &self,
        evaluation_time: DateTime<Utc>,
        opts: RunOptions,
    ) -> Result<Option<IndexProduct>, ComposeError> {
        tracing::info!(stage = ?Stage::Fetching, "starting index composition");
        let markets = self.fetch_active_markets().await?;

        tracing::debug!(stage = ?Stage::Filtering);
        let selected = self.select_markets_for_index(&markets, evaluation_time);
        if selected.is_empty() {
            tracing::info!(
                stage = ?Stage::Done,
                "no suitable markets found for index composition"
            );
            return Ok(None);
        }
        tracing::info!(selected = selected.len(), "selected markets for the index");

        #[cfg(feature = "metrics")]
        crate::metrics::COMPONENTS_SELECTED.observe(selected.len() as f64);

        tracing::debug!(stage = ?Stage::Building);
        let product = self.builder.build(&selected, evaluation_time, opts.sequence)?;
        tracing::info!(
            index_id = %product.id,
            end_date = %product.end_date,
            "created index product"
        );

        if opts.dry_run {
            tracing::info!(index_id = %product.id, "dry run, skipping execution");
        } else if let Err(e) = self.publisher.publish_index(&product).await {
            tracing::warn!(index_id = %product.id, "publish_index failed: {e:?}");
        }

        tracing::debug!(stage = ?Stage::Done);
        Ok(Some(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::position::SeededRandom;
    use crate::providers::fixed::FixedMarkets;
    use crate::types::{IndexStatus, Position};
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl Publisher for Recording {
        async fn publish_index(&self, product: &IndexProduct) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(product.id.clone());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap()
    }

    fn market(id: &str, liquidity: f64, days: i64) -> MarketDescriptor {
        MarketDescriptor {
            protocol: "polymarket".into(),
            id: id.into(),
            title: format!("Market {id}"),
            liquidity: Some(liquidity),
            end_date: now() + Duration::days(days),
        }
    }

    fn pool() -> Vec<MarketDescriptor> {
        vec![market("1", 30_000.0, 3), market("2", 40_000.0, 5), market("3", 10_000.0, 10)]
    }

    fn composer(cfg: ComposerConfig) -> (Composer, Arc<FixedMarkets>, Arc<Recording>) {
        let provider = Arc::new(FixedMarkets::new(pool()));
        let publisher = Arc::new(Recording::default());
        (Composer::new(cfg, provider.clone(), publisher.clone()), provider, publisher)
    }

    #[tokio::test]
    async fn composes_from_eligible_markets() {
        let (c, _, _) = composer(ComposerConfig { dry_run: true, ..Default::default() });
        let p = c.compose_index(now()).await.unwrap().expect("product");
        let ids: Vec<_> = p.components.iter().map(|c| c.market_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(p.status, IndexStatus::Pending);
        assert_eq!(p.initial_value, 100.0);
        assert_eq!(p.end_date, now() + Duration::days(3));
        assert_eq!(p.id, "261015-1");
    }

    #[tokio::test]
    async fn max_components_keeps_best_score() {
        let cfg = ComposerConfig { max_components: 1, dry_run: true, ..Default::default() };
        let (c, _, _) = composer(cfg);
        let p = c.compose_index(now()).await.unwrap().unwrap();
        assert_eq!(p.components.len(), 1);
        assert_eq!(p.components[0].market_id, "1");
        assert_eq!(p.components[0].weight, 1.0);
    }

    #[tokio::test]
    async fn nothing_eligible_yields_none() {
        let cfg = ComposerConfig { min_tvl: 100_000.0, ..Default::default() };
        let (c, provider, publisher) = composer(cfg);
        assert!(c.compose_index(now()).await.unwrap().is_none());
        assert_eq!(provider.calls(), 1);
        assert!(publisher.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let (c, provider, _) = composer(ComposerConfig::default());
        provider.set_failing(true);
        let err = c.compose_index(now()).await.unwrap_err();
        assert!(matches!(err, ComposeError::Fetch(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn dry_run_keeps_publisher_closed() {
        let (c, _, publisher) = composer(ComposerConfig { dry_run: true, ..Default::default() });
        c.compose_index(now()).await.unwrap();
        assert!(publisher.0.lock().unwrap().is_empty());

        let opts = RunOptions { sequence: 3, dry_run: false };
        let p = c.compose_index_with(now(), opts).await.unwrap().unwrap();
        assert_eq!(p.id, "261015-3");
        assert_eq!(*publisher.0.lock().unwrap(), vec!["261015-3".to_string()]);
    }

    #[tokio::test]
    async fn position_policy_is_pluggable() {
        let (c, _, _) = composer(ComposerConfig { dry_run: true, ..Default::default() });
        let c = c.with_positions(Arc::new(SeededRandom::new(11)));
        let p = c.compose_index(now()).await.unwrap().unwrap();
        let selected = c.select_markets_for_index(&pool(), now());
        let expected: Vec<Position> = selected
            .iter()
            .enumerate()
            .map(|(rank, m)| SeededRandom::new(11).position(rank, m))
            .collect();
        let got: Vec<Position> = p.components.iter().map(|c| c.position).collect();
        assert_eq!(got, expected);
    }
}
