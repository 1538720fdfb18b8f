// src/lib.rs
pub mod types;
pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod publishing;
pub mod providers;
pub mod scoring;
pub mod index;
pub mod composer;
pub mod store;
pub mod service;
pub mod scheduler;
pub mod http;
