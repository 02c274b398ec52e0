use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::events::{EventCategory, RETRY_NUM_HEADER, classify};
use crate::metrics::EVENTS_TOTAL;
use crate::models::EventPayload;
use crate::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn status(value: &str) -> Response {
    Json(json!({ "status": value })).into_response()
}

/// Slack Events API entry point.
///
/// Answers 200 for everything Slack sends, recognised or not, so that Slack
/// never starts redelivering. The one exception is a bad signature when a
/// signing secret is configured.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.signing_secret {
        let timestamp = header(&headers, TIMESTAMP_HEADER).unwrap_or("");
        let sig = header(&headers, SIGNATURE_HEADER).unwrap_or("");
        let now = chrono::Utc::now().timestamp();
        if !signature::verify(secret, timestamp, sig, &body, now) {
            tracing::warn!("Rejected webhook request: invalid Slack signature");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload: EventPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable event payload, acknowledging");
            return status("ok");
        }
    };

    let category = classify(&payload, header(&headers, RETRY_NUM_HEADER));
    EVENTS_TOTAL.with_label_values(&[category.as_str()]).inc();
    tracing::debug!(
        category = category.as_str(),
        payload_type = payload.payload_type.as_deref().unwrap_or("-"),
        "Classified inbound event"
    );

    match category {
        EventCategory::VerificationChallenge => {
            let challenge = payload.challenge.unwrap_or_default();
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventCategory::DuplicateRetry => {
            tracing::info!("Skipping Slack redelivery");
            status("ok")
        }
        EventCategory::ChannelMention | EventCategory::DirectMessage => {
            let event = payload.event.unwrap_or_default();
            let outcome = state.pipeline.handle(category, &event).await;
            if let Some(out) = outcome.outbound() {
                tracing::debug!(channel = %out.channel, category = category.as_str(), "Event handled");
            }
            if outcome.is_throttled() {
                status("throttled")
            } else {
                status("ok")
            }
        }
        EventCategory::Ignored => status("ok"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::handlers::test_support::{body_json, state};
    use crate::notices;
    use crate::pipeline::tests::{FakeGenerator, RecordingMessenger};
    use crate::signature::sign;

    fn post(body: &Value) -> Request<Body> {
        Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn mention() -> Value {
        json!({
            "type": "event_callback",
            "event": {"type": "app_mention", "user": "USER", "channel": "C1", "text": "<@BOT> hello"}
        })
    }

    #[tokio::test]
    async fn challenge_is_echoed_verbatim() {
        let generator = Arc::new(FakeGenerator::ok("x"));
        let app = router(state(generator.clone(), Arc::new(RecordingMessenger::default()), 10, None));

        let resp = app
            .oneshot(post(&json!({"type": "url_verification", "challenge": "abc"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"challenge": "abc"}));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn null_challenge_is_echoed_as_null() {
        let generator = Arc::new(FakeGenerator::ok("x"));
        let app = router(state(generator.clone(), Arc::new(RecordingMessenger::default()), 10, None));

        let resp = app.oneshot(post(&json!({"challenge": null}))).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"challenge": null}));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mention_is_answered_in_channel() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(Arc::new(FakeGenerator::ok("hi there")), messenger.clone(), 10, None));

        let resp = app.oneshot(post(&mention())).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
        assert_eq!(messenger.posts(), vec![("C1".to_string(), "<@USER> hi there".to_string())]);
    }

    #[tokio::test]
    async fn redelivery_has_no_side_effects() {
        let generator = Arc::new(FakeGenerator::ok("x"));
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(generator.clone(), messenger.clone(), 10, None));

        let mut req = post(&mention());
        req.headers_mut().insert("x-slack-retry-num", "1".parse().unwrap());
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(messenger.posts().is_empty());
    }

    #[tokio::test]
    async fn dm_with_subtype_is_ignored() {
        let generator = Arc::new(FakeGenerator::ok("x"));
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(generator.clone(), messenger.clone(), 10, None));

        let resp = app
            .oneshot(post(&json!({
                "event": {"type": "message", "channel_type": "im", "subtype": "channel_join",
                          "user": "USER", "channel": "D1", "text": "joined"}
            })))
            .await
            .unwrap();

        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(messenger.posts().is_empty());
    }

    #[tokio::test]
    async fn throttled_request_reports_throttled_status() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(Arc::new(FakeGenerator::ok("x")), messenger.clone(), 0, None));

        let resp = app.oneshot(post(&mention())).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "throttled"}));
        assert_eq!(
            messenger.posts(),
            vec![("C1".to_string(), format!("<@USER> {}", notices::THROTTLED))]
        );
    }

    #[tokio::test]
    async fn throttled_direct_message_gets_unprefixed_notice() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(Arc::new(FakeGenerator::ok("x")), messenger.clone(), 0, None));

        let resp = app
            .oneshot(post(&json!({
                "event": {"type": "message", "channel_type": "im",
                          "user": "USER", "channel": "D1", "text": "hello"}
            })))
            .await
            .unwrap();

        assert_eq!(body_json(resp).await, json!({"status": "throttled"}));
        assert_eq!(
            messenger.posts(),
            vec![("D1".to_string(), notices::THROTTLED.to_string())]
        );
    }

    #[tokio::test]
    async fn malformed_body_is_still_acknowledged() {
        let app = router(state(
            Arc::new(FakeGenerator::ok("x")),
            Arc::new(RecordingMessenger::default()),
            10,
            None,
        ));

        let req = Request::post("/").body(Body::from("not json")).unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn invalid_signature_is_rejected_when_secret_configured() {
        let generator = Arc::new(FakeGenerator::ok("x"));
        let app = router(state(
            generator.clone(),
            Arc::new(RecordingMessenger::default()),
            10,
            Some("secret"),
        ));

        let mut req = post(&mention());
        let ts = chrono::Utc::now().timestamp().to_string();
        req.headers_mut().insert("x-slack-request-timestamp", ts.parse().unwrap());
        req.headers_mut().insert("x-slack-signature", "v0=deadbeef".parse().unwrap());
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_signature_is_accepted() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = router(state(
            Arc::new(FakeGenerator::ok("hi there")),
            messenger.clone(),
            10,
            Some("secret"),
        ));

        let body = mention().to_string();
        let ts = chrono::Utc::now().timestamp().to_string();
        let sig = sign("secret", &ts, body.as_bytes());
        let req = Request::post("/")
            .header("X-Slack-Request-Timestamp", ts)
            .header("X-Slack-Signature", sig)
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(messenger.posts().len(), 1);
    }
}
