// src/metrics.rs
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        // composed|empty|fetch_error|build_error
        "composer_runs_total", "Composition runs", &["outcome"]
    ).unwrap()
});

pub static COMPONENTS_SELECTED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "composer_components_selected",
        "Markets selected per composed index",
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0]
    ).unwrap()
});

pub static FETCH_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "composer_fetch_latency_seconds",
        "Market data fetch latency",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap()
});

/// Text exposition of the default registry.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
