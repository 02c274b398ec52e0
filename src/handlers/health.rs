use crate::notices::HEALTH_TEXT;

// health handler, independent of configuration or backends
pub async fn health_handler() -> &'static str {
    HEALTH_TEXT
}
