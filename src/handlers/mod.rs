mod channels;
mod check_config;
mod events;
mod health;
mod metrics;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use channels::list_channels_handler;
pub use check_config::check_config_handler;
pub use events::events_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler).post(events_handler))
        .route("/list-channels", get(list_channels_handler))
        .route("/check-config", get(check_config_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
