//! HTTP API.
//!
//! Endpoints:
//!
//! - `GET /api/tools`: List available tools
//! - `POST /api/tool`: Invoke one tool directly
//! - `POST /api/run`: Run the default agent on a prompt
//! - `POST /api/flow`: Run a planning flow on a prompt

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskpilot_agent::{pilot_agent, pilot_flow};
use taskpilot_core::ToolError;
use tracing::{error, info, warn};

use crate::SharedState;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build the API router. Nest this under "/api" in the main router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tool", post(invoke_tool_handler))
        .route("/run", post(run_handler))
        .route("/flow", post(flow_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
struct ToolListResponse {
    tools: Vec<ToolDto>,
    count: usize,
}

#[derive(Serialize, Deserialize)]
struct ToolDto {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct ToolInvokeRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct ToolInvokeResponse {
    output: Option<serde_json::Value>,
    error: Option<String>,
    image: Option<String>,
}

#[derive(Deserialize)]
struct PromptRequest {
    #[serde(default)]
    prompt: String,
}

#[derive(Serialize, Deserialize)]
struct RunResponse {
    result: String,
}

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn require_prompt(payload: PromptRequest) -> Result<String, ApiError> {
    let prompt = payload.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "prompt is required"));
    }
    Ok(prompt)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let defs = state.tools.definitions();
    let count = defs.len();

    Json(ToolListResponse {
        tools: defs
            .into_iter()
            .map(|d| ToolDto {
                name: d.name,
                description: d.description,
                parameters: d.parameters,
            })
            .collect(),
        count,
    })
}

async fn invoke_tool_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ToolInvokeRequest>,
) -> Result<Json<ToolInvokeResponse>, ApiError> {
    let Some(name) = payload.name.filter(|n| !n.is_empty()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    };
    let args = if payload.args.is_null() {
        serde_json::json!({})
    } else {
        payload.args
    };
    info!(tool = %name, "api/tool request");

    match state.tools.execute(&name, args).await {
        Ok(result) => Ok(Json(ToolInvokeResponse {
            output: result.output,
            error: result.error,
            image: result.image,
        })),
        Err(ToolError::NotFound(name)) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown tool '{name}'"),
        )),
        Err(e) => {
            warn!(tool = %name, error = %e, "Tool invocation failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let prompt = require_prompt(payload)?;
    info!(prompt_len = prompt.len(), "api/run request");

    let mut agent = pilot_agent(&state.config, state.llm.clone(), state.plans.clone())
        .with_event_bus(state.event_bus.clone());
    match agent.run(Some(&prompt)).await {
        Ok(result) => Ok(Json(RunResponse { result })),
        Err(e) => {
            error!(error = %e, "Agent run failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Agent error: {e}"),
            ))
        }
    }
}

async fn flow_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let prompt = require_prompt(payload)?;
    info!(prompt_len = prompt.len(), "api/flow request");

    let mut flow =
        pilot_flow(&state.config, state.llm.clone()).with_event_bus(state.event_bus.clone());
    let deadline = Duration::from_secs(state.config.flow.timeout_secs);

    match tokio::time::timeout(deadline, flow.execute(&prompt)).await {
        Ok(Ok(result)) => Ok(Json(RunResponse { result })),
        Ok(Err(e)) => {
            error!(error = %e, "Flow failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Flow error: {e}"),
            ))
        }
        Err(_) => {
            error!(timeout_secs = deadline.as_secs(), "Flow timed out");
            Err(api_error(
                StatusCode::GATEWAY_TIMEOUT,
                "Operation terminated due to timeout",
            ))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::GatewayState;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use taskpilot_config::AppConfig;
    use taskpilot_core::error::ProviderError;
    use taskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use taskpilot_core::{Llm, Message, MessageToolCall};
    use tower::ServiceExt;

    /// Always answers "done" and asks to terminate.
    struct MockProvider;

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::from_tool_calls(
                    vec![MessageToolCall::new("call_1", "terminate", r#"{"reason":"done"}"#)],
                    "done",
                ),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    pub(crate) fn test_state() -> SharedState {
        Arc::new(GatewayState::new(
            AppConfig::default(),
            Llm::new(Arc::new(MockProvider), "mock-model"),
        ))
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn list_tools() {
        let app = api_router(test_state());
        let req = Request::builder()
            .uri("/tools")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: ToolListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.count, json.tools.len());
        assert!(json.tools.iter().any(|t| t.name == "bash"));
        assert!(json.tools.iter().any(|t| t.name == "planning"));
        assert!(json.tools.iter().any(|t| t.name == "create_chat_completion"));
        assert_eq!(json.tools.last().unwrap().name, "terminate");
    }

    #[tokio::test]
    async fn invoke_tool_returns_result_fields() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post(
                "/tool",
                serde_json::json!({"name": "terminate", "args": {"reason": "bye"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["output"], "Terminated: bye");
        assert!(json["error"].is_null());
    }

    #[tokio::test]
    async fn invoke_tool_shares_plan_store() {
        let state = test_state();
        let app = api_router(state.clone());
        let response = app
            .oneshot(post(
                "/tool",
                serde_json::json!({
                    "name": "planning",
                    "args": {"command": "create", "plan_id": "p1", "steps": ["a", "b"]}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.plans.read().await.contains("p1"));
    }

    #[tokio::test]
    async fn invoke_tool_reports_tool_level_failure() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post(
                "/tool",
                serde_json::json!({"name": "planning", "args": {"command": "get", "plan_id": "missing"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Plan missing not found");
    }

    #[tokio::test]
    async fn invoke_tool_requires_name() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post("/tool", serde_json::json!({"args": {}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invoke_unknown_tool_is_not_found() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post("/tool", serde_json::json!({"name": "teleport"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn run_executes_agent() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post("/run", serde_json::json!({"prompt": "say hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(
            json["result"],
            "Step 1: Observed output of cmd `terminate` executed:\nTerminated: done"
        );
    }

    #[tokio::test]
    async fn run_rejects_empty_prompt() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post("/run", serde_json::json!({"prompt": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_failure_is_server_error() {
        let state = Arc::new(GatewayState::new(
            AppConfig::default(),
            Llm::new(Arc::new(DownProvider), "m"),
        ));
        let app = api_router(state);
        let response = app
            .oneshot(post("/run", serde_json::json!({"prompt": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn flow_runs_default_plan() {
        let app = api_router(test_state());
        let response = app
            .oneshot(post("/flow", serde_json::json!({"prompt": "ship it"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let result = json["result"].as_str().unwrap();
        assert_eq!(result.matches("Terminated: done").count(), 3);
        assert!(result.ends_with("Plan completed:\n\ndone"));
    }
}
