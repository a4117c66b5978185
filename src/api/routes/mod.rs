pub mod chat;
pub mod conversation;
pub mod health;

use axum::http::{header, Method, StatusCode};
use axum::extract::DefaultBodyLimit;
use axum::{middleware, routing::get, routing::post, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::middleware::request_logger;
use crate::api::state::AppState;
use crate::domain::DomainError;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn(request_logger))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/ask", post(chat::ask_handler))
        .route(
            "/ask/voice",
            post(chat::ask_voice_handler).layer(DefaultBodyLimit::max(chat::MAX_AUDIO_BYTES)),
        )
        .route(
            "/conversation",
            get(conversation::get_conversation).delete(conversation::clear_conversation),
        )
        .route("/history/search", post(conversation::search_history))
}

pub(crate) fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Transcription(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DomainError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        DomainError::Internal(_) | DomainError::Synthesis(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::application::services::testing::{
        AgentFixture, EchoSynthesizer, FixedTranscriber, NEW_DELHI,
    };
    use crate::infrastructure::AppConfig;

    async fn test_state() -> AppState {
        state_for(AgentFixture::new(&[NEW_DELHI]).await)
    }

    fn state_for(fixture: AgentFixture) -> AppState {
        let agent = fixture
            .agent()
            .with_synthesizer(Arc::new(EchoSynthesizer))
            .with_transcriber(Arc::new(FixedTranscriber(Some(
                "What is the capital of India?".to_string(),
            ))));
        AppState::new(
            Arc::new(agent),
            fixture.history.clone(),
            fixture.rag.clone(),
            Arc::new(AppConfig::default()),
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ask(query: &str) -> Request<Body> {
        Request::post("/api/v1/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "query": query }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_document_count() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["documents"], 1);
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_audio() {
        let app = create_router(test_state().await);
        let response = app.oneshot(ask("What is the capital of India?")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "New Delhi");
        assert_eq!(body["source"], "corpus");
        assert_eq!(body["turn_id"], 0);
        assert_eq!(body["audio"]["mime_type"], "audio/mpeg");
        assert_eq!(body["audio"]["data"], "TmV3IERlbGhp");
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let app = create_router(test_state().await);
        let response = app.oneshot(ask("  ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_voice_upload() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"audio\"; \
             filename=\"q.wav\"\r\nContent-Type: audio/wav\r\n\r\nRIFFDATA\r\n--{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/ask/voice")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = create_router(test_state().await)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["query"], "What is the capital of India?");
        assert_eq!(body["answer"], "New Delhi");
    }

    #[tokio::test]
    async fn test_voice_upload_without_audio_field() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/ask/voice")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = create_router(test_state().await)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_prompt_carries_session_turns() {
        let fixture = AgentFixture::new(&[NEW_DELHI])
            .await
            .with_template("{history}Answer briefly: {query}");
        let llm = fixture.llm.clone();
        let app = create_router(state_for(fixture));

        app.clone().oneshot(ask("What is the capital of India?")).await.unwrap();
        let response = app.oneshot(ask("Explain quantum physics")).await.unwrap();
        assert_eq!(body_json(response).await["source"], "generative");

        assert_eq!(
            llm.prompts(),
            vec![
                "Conversation so far:\nUser: What is the capital of India?\nAgent: New Delhi\n\
                 Answer briefly: Explain quantum physics"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_transcript_and_history_search() {
        let app = create_router(test_state().await);

        app.clone().oneshot(ask("What is the capital of India?")).await.unwrap();
        app.clone().oneshot(ask("Explain quantum physics")).await.unwrap();

        let transcript = body_json(
            app.clone()
                .oneshot(Request::get("/api/v1/conversation").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(transcript["messages"].as_array().unwrap().len(), 4);
        assert_eq!(transcript["messages"][0]["role"], "user");
        assert_eq!(transcript["messages"][1]["content"], "New Delhi");

        let search = Request::post("/api/v1/history/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "query": "capital of India", "top_k": 1 }).to_string(),
            ))
            .unwrap();
        let found = body_json(app.clone().oneshot(search).await.unwrap()).await;
        assert_eq!(found["responses"], serde_json::json!(["New Delhi"]));

        let cleared = app
            .clone()
            .oneshot(Request::delete("/api/v1/conversation").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

        let transcript = body_json(
            app.oneshot(Request::get("/api/v1/conversation").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert!(transcript["messages"].as_array().unwrap().is_empty());
    }
}
