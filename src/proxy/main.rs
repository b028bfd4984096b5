//! retouch-proxy — the network boundary between the editor and the
//! upstream generative API.
//!
//! One POST endpoint, `/api/generate`, accepting `{model, contents,
//! config}`. The request is forwarded to the upstream API with a
//! server-held credential; the upstream JSON comes back verbatim on
//! success, or `{"error": …}` with a matching HTTP status on failure.
//! No state is persisted.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

struct ProxyState {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateBody {
    model: String,
    contents: Value,
    #[serde(default)]
    config: Option<Value>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let api_key = std::env::var("GENAI_API_KEY").expect("GENAI_API_KEY required");
    let api_base =
        std::env::var("GENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8787".into())
        .parse()
        .expect("invalid PORT");

    let state = Arc::new(ProxyState {
        http: reqwest::Client::new(),
        api_base,
        api_key,
    });

    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "retouch-proxy listening");
    axum::serve(listener, app).await.expect("server failed");
}

async fn generate(
    State(state): State<Arc<ProxyState>>,
    Json(body): Json<GenerateBody>,
) -> (StatusCode, Json<Value>) {
    let url = format!(
        "{}/models/{}:generateContent",
        state.api_base, body.model
    );

    let mut upstream_body = json!({ "contents": body.contents });
    if let Some(config) = body.config {
        upstream_body["generationConfig"] = config;
    }

    tracing::debug!(model = %body.model, "forwarding generation request");

    let response = match state
        .http
        .post(&url)
        .header("x-goog-api-key", &state.api_key)
        .json(&upstream_body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "upstream request failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("upstream request failed: {e}") })),
            );
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    match response.json::<Value>().await {
        Ok(payload) if status.is_success() => (status, Json(payload)),
        Ok(payload) => {
            // Pass upstream error details through under a stable key.
            let detail = payload.get("error").cloned().unwrap_or(payload);
            (status, Json(json!({ "error": detail })))
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": format!("invalid upstream response: {e}") })),
        ),
    }
}
