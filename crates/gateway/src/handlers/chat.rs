//! Question handlers

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use compras_common::errors::{AppError, Result};

/// Question request
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default)]
    #[validate(length(max = 4000, message = "Pergunta muito longa"))]
    pub pergunta: Option<String>,
}

/// Question response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub resposta: String,
}

/// Answer a procurement question. The body is read as JSON whatever the
/// Content-Type header says.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>> {
    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::MalformedRequest {
            message: e.to_string(),
        })?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })?;

    let question = request.pergunta.as_deref().unwrap_or_default();
    let answer = state.engine.answer(question).await?;

    tracing::info!(
        items = answer.item_count,
        query_type = answer.query_type.map(|q| q.as_str()).unwrap_or("none"),
        "Question answered"
    );

    Ok(Json(ChatResponse {
        resposta: answer.text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::router_with;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, HeaderMap, Method, Request, StatusCode},
        Router,
    };
    use compras_common::config::AnswerConfig;
    use compras_common::context::{AnswerService, AnthropicSynthesizer};
    use std::sync::Arc;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    /// Echoes the question and whether cement rows reached the prompt
    struct EchoAnswerer;

    #[async_trait]
    impl AnswerService for EchoAnswerer {
        async fn answer(&self, system_prompt: &str, question: &str) -> Result<String> {
            let cement = system_prompt.contains("### CIMENTO (1 item disponível)");
            Ok(format!("{} | cimento no contexto: {}", question, cement))
        }
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    #[test]
    fn test_request_validation() {
        let ok = ChatRequest { pergunta: Some("tem cimento?".to_string()) };
        assert_ok!(ok.validate());

        let missing = ChatRequest { pergunta: None };
        assert_ok!(missing.validate());

        let long = ChatRequest {
            pergunta: Some("a".repeat(4001)),
        };
        assert!(long.validate().is_err());
    }

    #[tokio::test]
    async fn test_answer_success() {
        let app = router_with(Arc::new(EchoAnswerer));

        let (status, headers, body) = send(app, post_chat(r#"{"pergunta": "tem cimento?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resposta"], "tem cimento? | cimento no contexto: true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        for body in [r#"{"pergunta": ""}"#, r#"{"pergunta": "   "}"#, r#"{}"#, r#"{"pergunta": null}"#] {
            let app = router_with(Arc::new(EchoAnswerer));

            let (status, _, json) = send(app, post_chat(body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(json, serde_json::json!({"erro": "Pergunta vazia"}));
        }
    }

    fn post_without_content_type(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_body_parsed_without_content_type() {
        let app = router_with(Arc::new(EchoAnswerer));
        let (status, _, json) = send(app, post_without_content_type(r#"{"pergunta": ""}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({"erro": "Pergunta vazia"}));

        let app = router_with(Arc::new(EchoAnswerer));
        let (status, _, json) = send(app, post_without_content_type(r#"{"pergunta": "tem cimento?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["resposta"], "tem cimento? | cimento no contexto: true");
    }

    #[tokio::test]
    async fn test_text_plain_body_is_parsed() {
        let app = router_with(Arc::new(EchoAnswerer));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(Body::from(r#"{"pergunta": "  "}"#))
            .unwrap();

        let (status, _, json) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["erro"], "Pergunta vazia");
    }

    #[tokio::test]
    async fn test_long_question_is_rejected() {
        let app = router_with(Arc::new(EchoAnswerer));
        let body = serde_json::json!({ "pergunta": "x".repeat(4001) }).to_string();

        let (status, _, json) = send(app, post_chat(&body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["erro"].as_str().unwrap().contains("Pergunta muito longa"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_server_error() {
        let synthesizer = AnthropicSynthesizer::new(AnswerConfig::default()).unwrap();
        let app = router_with(Arc::new(synthesizer));

        let (status, _, json) = send(app, post_chat(r#"{"pergunta": "tem cimento?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["erro"].as_str().unwrap().contains("Configuration"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let app = router_with(Arc::new(EchoAnswerer));

        let (status, _, json) = send(app, post_chat("{not json")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["erro"].as_str().unwrap().starts_with("Malformed request"));

        let app = router_with(Arc::new(EchoAnswerer));
        let (status, _, _) = send(app, post_without_content_type("")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// The CORS layer answers every OPTIONS request, with or without
    /// preflight headers
    #[tokio::test]
    async fn test_bare_options() {
        let app = router_with(Arc::new(EchoAnswerer));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();

        let (status, headers, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().contains("POST"));
        assert!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_lowercase()
            .contains("content-type"));
    }

    #[tokio::test]
    async fn test_browser_preflight() {
        let app = router_with(Arc::new(EchoAnswerer));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let (status, headers, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().contains("POST"));
    }
}
