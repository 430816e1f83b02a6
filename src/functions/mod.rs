//! 托管函数服务（feature = "functions"）
//!
//! 提供 `POST /functions/v1/{action}`：校验请求体、按动作组装提示词、调用上游 AI 网关，
//! 以 `{ <成功字段>: string }` 或 `{ error }` 返回。所有响应带宽松 CORS 头。
//! 上游密钥只在本服务读取，客户端配置中不出现。

pub mod inference;
pub mod prompts;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::gateway::{ActionName, ActionOutput, GatewayError};

pub use inference::{
    ChatMessage, ContentPart, ImageUrl, InferenceClient, InferenceError, MessageContent,
    MockInference, OpenAiCompatibleClient,
};
pub use prompts::{build_messages, system_prompt, PromptError};

const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// 服务状态
pub struct FunctionsState {
    pub inference: Arc<dyn InferenceClient>,
}

impl FunctionsState {
    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self { inference }
    }
}

/// 创建托管函数路由
pub fn create_router(state: Arc<FunctionsState>) -> Router {
    Router::new()
        .route("/functions/v1/:action", post(invoke_action).options(preflight))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}

fn json_response(status: StatusCode, body: Value) -> Response {
    let mut resp = (status, Json(body)).into_response();
    apply_cors(resp.headers_mut());
    resp
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_response(status, json!({ "error": message.into() }))
}

/// 上游一般失败时返回给客户端的文案
fn failure_message(action: ActionName) -> &'static str {
    match action {
        ActionName::AnalyzeMedicine => "Failed to analyze medicine",
        ActionName::ReadPrescription => "Failed to read prescription",
        ActionName::ExtractFormData => "Failed to extract form data",
        ActionName::VoiceChat => "Failed to get response",
    }
}

fn upstream_failure(action: ActionName, err: &InferenceError) -> (StatusCode, String) {
    match err {
        InferenceError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            GatewayError::from_status(429, None).user_message(),
        ),
        InferenceError::PaymentRequired => (
            StatusCode::PAYMENT_REQUIRED,
            GatewayError::from_status(402, None).user_message(),
        ),
        InferenceError::MissingKey(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            failure_message(action).to_string(),
        ),
    }
}

/// OPTIONS 预检
async fn preflight() -> Response {
    let mut resp = StatusCode::OK.into_response();
    apply_cors(resp.headers_mut());
    resp
}

/// POST /functions/v1/{action}
async fn invoke_action(
    State(state): State<Arc<FunctionsState>>,
    Path(name): Path<String>,
    body: String,
) -> Response {
    let Some(action) = ActionName::parse(&name) else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown function: {}", name));
    };

    let payload: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(action = %action, "invalid request body: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid JSON body");
        }
    };

    let messages = match build_messages(action, &payload) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(action = %action, "rejected request: {}", e.message());
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.message());
        }
    };

    tracing::info!(action = %action, messages = messages.len(), "calling upstream");
    match state.inference.complete(&messages).await {
        Ok(text) => {
            tracing::info!(action = %action, chars = text.len(), "action complete");
            json_response(StatusCode::OK, ActionOutput::new(action, text).to_body())
        }
        Err(e) => {
            tracing::error!(action = %action, "upstream failed: {}", e);
            let (status, message) = upstream_failure(action, &e);
            error_response(status, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app(mock: Arc<MockInference>) -> Router {
        create_router(Arc::new(FunctionsState::new(mock)))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_medicine_success() {
        let mock = Arc::new(MockInference::new());
        mock.push(Ok("Paracetamol 500mg, expires 2027-03".into()));

        let resp = app(mock.clone())
            .oneshot(post_json(
                "/functions/v1/analyze-medicine",
                json!({ "image": "data:image/png;base64,iVBORw0KGgo=" }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            read_json(resp).await,
            json!({ "analysis": "Paracetamol 500mg, expires 2027-03" })
        );
        assert_eq!(mock.calls()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_missing_image_is_500() {
        let resp = app(Arc::new(MockInference::new()))
            .oneshot(post_json("/functions/v1/read-prescription", json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(resp).await, json!({ "error": "Image is required" }));
    }

    #[tokio::test]
    async fn test_upstream_status_mapping() {
        let mock = Arc::new(MockInference::new());
        mock.push(Err(InferenceError::RateLimited))
            .push(Err(InferenceError::PaymentRequired))
            .push(Err(InferenceError::Upstream {
                status: 503,
                body: "overloaded".into(),
            }));
        let router = app(mock);
        let body = json!({ "image": "data:image/png;base64,AA==" });

        let resp = router
            .clone()
            .oneshot(post_json("/functions/v1/extract-form-data", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            read_json(resp).await["error"],
            "Rate limit exceeded. Please try again later."
        );

        let resp = router
            .clone()
            .oneshot(post_json("/functions/v1/extract-form-data", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

        let resp = router
            .oneshot(post_json("/functions/v1/extract-form-data", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(resp).await["error"], "Failed to extract form data");
    }

    #[tokio::test]
    async fn test_unknown_action_and_preflight() {
        let router = app(Arc::new(MockInference::new()));
        let resp = router
            .clone()
            .oneshot(post_json("/functions/v1/delete-account", json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/functions/v1/voice-chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            CORS_ALLOW_HEADERS
        );
    }

    #[tokio::test]
    async fn test_voice_chat_reply() {
        let resp = app(Arc::new(MockInference::new()))
            .oneshot(post_json(
                "/functions/v1/voice-chat",
                json!({ "message": "Hi", "conversationHistory": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await, json!({ "reply": "Echo from Mock: Hi" }));
    }
}
