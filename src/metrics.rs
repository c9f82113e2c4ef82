// Metrics and observability module
// This file registers the prometheus series for upstream calls, transaction
// submission outcomes and route classification

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter,
};

pub static REQ_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "xchain_request_latency_seconds",
        "latency for upstream calls",
        &["service", "method"]
    )
    .unwrap()
});

pub static REQ_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xchain_request_errors_total",
        "errors by upstream",
        &["service", "method"]
    )
    .unwrap()
});

pub static SUBMISSIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xchain_submissions_total",
        "terminal submission states",
        &["outcome"]
    )
    .unwrap()
});

pub static SUBMISSION_RESENDS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "xchain_submission_resends_total",
        "identical payload resends after a confirmation timeout"
    )
    .unwrap()
});

pub static SIMULATION_RETRIES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xchain_simulation_retries_total",
        "transient simulation failures by reason",
        &["reason"]
    )
    .unwrap()
});

pub static ROUTE_CLASSIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "xchain_route_classifications_total",
        "classified source transactions by route",
        &["route"]
    )
    .unwrap()
});
