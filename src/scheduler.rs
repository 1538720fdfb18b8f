// src/scheduler.rs
use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::service::ComposeService;

/// How often the composer runs, derived from `interval_hours`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Once,
    EveryMinutes(u64),
    EveryHours(u64),
}

impl Cadence {
    /// `<= 0` runs once; sub-hour intervals are rounded to minutes, the rest to hours.
    pub fn from_interval_hours(hours: f64) -> Self {
        if !(hours > 0.0) || !hours.is_finite() {
            Cadence::Once
        } else if hours < 1.0 {
            Cadence::EveryMinutes(((hours * 60.0).round() as u64).max(1))
        } else {
            Cadence::EveryHours((hours.round() as u64).max(1))
        }
    }

    pub fn period(&self) -> Option<Duration> {
        match *self {
            Cadence::Once => None,
            Cadence::EveryMinutes(m) => Some(Duration::from_secs(m.saturating_mul(60))),
            Cadence::EveryHours(h) => Some(Duration::from_secs(h.saturating_mul(3600))),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Once => f.write_str("once"),
            Cadence::EveryMinutes(m) => write!(f, "every {m} minutes"),
            Cadence::EveryHours(h) => write!(f, "every {h} hours"),
        }
    }
}

pub struct Scheduler {
    service: Arc<ComposeService>,
    cadence: Cadence,
}

impl Scheduler {
    pub fn new(service: Arc<ComposeService>, cadence: Cadence) -> Self {
        Self { service, cadence }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Runs immediately, then on every tick until `shutdown` resolves.
    /// Returns how many runs were started.
    pub async fn run<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let Some(period) = self.cadence.period() else {
            self.service.run_scheduled(Utc::now()).await;
            tracing::info!("no recurring schedule set, exiting after initial run");
            return 1;
        };

        tracing::info!(cadence = %self.cadence, "scheduling composer job");
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(runs, "scheduler shutting down");
                    break;
                }
                _ = tick.tick() => {
                    self.service.run_scheduled(Utc::now()).await;
                    runs += 1;
                }
            }
        }
        runs
    }
}
