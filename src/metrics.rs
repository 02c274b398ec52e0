use lazy_static::lazy_static;
use prometheus::{
    Histogram, IntCounter, IntCounterVec, IntGauge, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};

lazy_static! {
    pub static ref EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bridge_events_total",
        "Inbound Slack events by category",
        &["category"]
    )
    .unwrap();
    pub static ref THROTTLED_TOTAL: IntCounter =
        register_int_counter!("bridge_throttled_total", "Requests rejected by the local limiter")
            .unwrap();
    pub static ref GENERATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "bridge_generation_failures_total",
        "Failed generation calls by kind",
        &["kind"]
    )
    .unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "bridge_generation_latency_seconds",
        "Generation backend latency in seconds"
    )
    .unwrap();
    pub static ref SLACK_POST_FAILURES: IntCounter = register_int_counter!(
        "bridge_slack_post_failures_total",
        "chat.postMessage calls that failed and were dropped"
    )
    .unwrap();
    pub static ref THROTTLE_WINDOW_SIZE: IntGauge = register_int_gauge!(
        "bridge_throttle_window_size",
        "Admitted requests inside the current throttle window"
    )
    .unwrap();
}
