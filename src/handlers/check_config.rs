use axum::Json;
use serde_json::{Map, Value, json};

use crate::config::REQUIRED_ENV;

// Reports which credentials the process environment currently holds
pub async fn check_config_handler() -> Json<Value> {
    Json(config_status(|name| std::env::var(name).ok()))
}

fn config_status(lookup: impl Fn(&str) -> Option<String>) -> Value {
    let mut status = Map::new();
    for name in REQUIRED_ENV {
        let present = lookup(name).is_some_and(|v| !v.is_empty());
        status.insert(
            name.to_string(),
            json!(if present { "set" } else { "missing" }),
        );
    }
    status.insert("checked_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    Value::Object(status)
}
