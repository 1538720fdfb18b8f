use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use index_composer::composer::Composer;
use index_composer::config::{AppConfig, ComposerConfig};
use index_composer::index::{format_date, generate_index_id};
use index_composer::providers::fixed::FixedMarkets;
use index_composer::publishing::LogPublisher;
use index_composer::service::ComposeService;
use index_composer::store::{IndexStore, InMemoryStore};
use index_composer::types::{IndexStatus, MarketDescriptor};

fn market(id: &str, liquidity: Option<f64>, ends: DateTime<Utc>) -> MarketDescriptor {
    MarketDescriptor {
        protocol: "polymarket".into(),
        id: id.into(),
        title: format!("Market {id}"),
        liquidity,
        end_date: ends,
    }
}

fn pool(now: DateTime<Utc>) -> Vec<MarketDescriptor> {
    vec![
        market("1", Some(30_000.0), now + Duration::days(3)),
        market("2", Some(40_000.0), now + Duration::days(5)),
        market("3", Some(10_000.0), now + Duration::days(10)),
        market("4", None, now + Duration::days(2)),
        market("5", Some(90_000.0), now - Duration::days(2)),
        market("6", Some(55_000.0), now + Duration::days(6)),
        market("other-venue", Some(500_000.0), now + Duration::days(1)),
    ]
    .into_iter()
    .map(|mut m| {
        if m.id == "other-venue" {
            m.protocol = "kalshi".into();
        }
        m
    })
    .collect()
}

fn service(cfg: ComposerConfig, now: DateTime<Utc>) -> ComposeService {
    let provider = Arc::new(FixedMarkets::new(pool(now)));
    let composer = Composer::new(cfg, provider, Arc::new(LogPublisher));
    ComposeService::new(composer, Arc::new(InMemoryStore::new()))
}

#[test]
fn generated_id_is_todays_utc_date() {
    let now = Utc::now();
    let id = generate_index_id(now, 1);
    let (date, seq) = id.split_once('-').expect("dash");
    assert_eq!(date.len(), 6);
    assert!(date.chars().all(|c| c.is_ascii_digit()));
    assert!(!seq.is_empty() && seq.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(date, now.format("%y%m%d").to_string());
    assert_eq!(date, format_date(now));
}

#[tokio::test]
async fn full_run_selects_ranks_and_stores() {
    let now = Utc::now();
    let svc = service(AppConfig::default().composer, now);

    let outcome = svc.compose_now(now).await.unwrap();
    assert!(outcome.success);

    let stored = svc.store().find_by_id(&outcome.index_id).await.unwrap();
    // 6: 55000/7 ≈ 7857, 1: 30000/4 = 7500, 2: 40000/6 ≈ 6667
    let ids: Vec<_> = stored.components.iter().map(|c| c.market_id.as_str()).collect();
    assert_eq!(ids, vec!["6", "1", "2"]);
    assert_eq!(stored.end_date, now + Duration::days(3));
    assert_eq!(stored.status, IndexStatus::Pending);
    let total: f64 = stored.components.iter().map(|c| c.weight).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn component_cap_and_same_day_sequence() {
    let now = Utc::now();
    let cfg = ComposerConfig { max_components: 1, ..Default::default() };
    let svc = service(cfg, now);

    let first = svc.compose_now(now).await.unwrap();
    let second = svc.compose_now(now).await.unwrap();
    assert_ne!(first.index_id, second.index_id);
    assert!(second.index_id.ends_with("-2"));

    let all = svc.store().list().await;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|p| p.components.len() == 1 && p.components[0].market_id == "6"));
}

#[tokio::test]
async fn nothing_qualifies_returns_none() {
    let now = Utc::now();
    let cfg = ComposerConfig { min_tvl: 1_000_000.0, ..Default::default() };
    let svc = service(cfg, now);
    assert!(svc.composer().compose_index(now).await.unwrap().is_none());
    assert!(svc.run_scheduled(now).await.is_none());
    assert!(svc.store().list().await.is_empty());
}
