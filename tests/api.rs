//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use parley_gateway::api::{self, ApiState};
use tower::ServiceExt;

mod common;
use common::{MockResponder, MockSynthesizer, MockTranscriber};

fn build_router(
    transcriber: Arc<MockTranscriber>,
    responder: Arc<MockResponder>,
    synthesizer: Arc<MockSynthesizer>,
) -> axum::Router {
    api::router(Arc::new(ApiState::new(transcriber, responder, synthesizer)))
}

fn default_router() -> axum::Router {
    build_router(
        MockTranscriber::text("hello"),
        MockResponder::reply("hi there"),
        MockSynthesizer::audio(b"mp3-bytes"),
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = default_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn transcribe_returns_transcription() {
    let response = default_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "audio/webm")
                .body(Body::from(vec![0_u8; 2000]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["transcription"], "hello");
}

#[tokio::test]
async fn transcribe_rejects_empty_body() {
    let transcriber = MockTranscriber::text("hello");
    let router = build_router(
        transcriber.clone(),
        MockResponder::reply("x"),
        MockSynthesizer::audio(b"x"),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "audio/webm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("no audio data"));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn transcribe_rejects_undersized_body_without_upstream_call() {
    let transcriber = MockTranscriber::text("hello");
    let router = build_router(
        transcriber.clone(),
        MockResponder::reply("x"),
        MockSynthesizer::audio(b"x"),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "audio/webm")
                .body(Body::from(vec![0_u8; 100]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("too small"));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn transcribe_upstream_failure_maps_to_500() {
    let router = build_router(
        MockTranscriber::failing("Whisper API error 429: quota"),
        MockResponder::reply("x"),
        MockSynthesizer::audio(b"x"),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "audio/webm")
                .body(Body::from(vec![0_u8; 2000]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("quota"));
}

#[tokio::test]
async fn respond_appends_user_turn_and_returns_reply() {
    let responder = MockResponder::reply("hi there");
    let router = build_router(
        MockTranscriber::text("x"),
        responder.clone(),
        MockSynthesizer::audio(b"x"),
    );

    let body = serde_json::json!({
        "text": "how are you?",
        "conversationHistory": [
            { "role": "user", "content": "hello" },
            { "role": "assistant", "content": "hi" }
        ]
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/respond")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["response"], "hi there");

    let seen = responder.last_seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].content, "how are you?");
}

#[tokio::test]
async fn respond_does_not_duplicate_trailing_user_turn() {
    let responder = MockResponder::reply("hi there");
    let router = build_router(
        MockTranscriber::text("x"),
        responder.clone(),
        MockSynthesizer::audio(b"x"),
    );

    let body = serde_json::json!({
        "text": "how are you?",
        "conversationHistory": [
            { "role": "user", "content": "how are you?" }
        ]
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/respond")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(responder.last_seen().len(), 1);
}

#[tokio::test]
async fn respond_rejects_blank_text() {
    let response = default_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/respond")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn speak_caches_audio_and_serves_it() {
    let router = default_router();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speak")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"hi there"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let audio_url = json["audioUrl"].as_str().unwrap().to_string();
    assert!(audio_url.starts_with("/audio/"));

    let response = router
        .oneshot(Request::builder().uri(&audio_url).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "audio/mpeg"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"mp3-bytes");
}

async fn speak_url(router: &axum::Router, text: &str) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speak")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"text":"{text}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["audioUrl"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn speak_cache_is_bounded_and_evicts_oldest() {
    let router = default_router();

    let first = speak_url(&router, "first").await;
    let mut last = String::new();
    for _ in 0..api::AUDIO_CACHE_CAPACITY.get() {
        last = speak_url(&router, "filler").await;
    }

    // The oldest clip has been evicted
    let response = router
        .clone()
        .oneshot(Request::builder().uri(&first).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Newer clips are still served
    let response = router
        .oneshot(Request::builder().uri(&last).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn speak_upstream_failure_maps_to_500() {
    let router = build_router(
        MockTranscriber::text("x"),
        MockResponder::reply("x"),
        MockSynthesizer::failing("TTS down"),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speak")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("TTS down"));
}

#[tokio::test]
async fn missing_audio_returns_404() {
    let response = default_router()
        .oneshot(
            Request::builder()
                .uri("/audio/00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
