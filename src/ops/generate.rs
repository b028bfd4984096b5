use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageOutputFormat, RgbaImage};
use serde_json::{json, Value};

use crate::ops::intake::OutputSize;

// ============================================================================
// GENERATION SERVICE CLIENT
// ============================================================================
//
// Talks to the retouch-proxy endpoint, which forwards `{model, contents,
// config}` verbatim to the upstream generative API. Images travel as base64
// `inline_data` parts; the first image part of the response is the result.
//
// The client is blocking by design — it only ever runs inside a
// `rayon::spawn` job, never on the UI thread.

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/api/generate";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure kinds shared by the generation and segmentation services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The upstream refused the request on policy grounds. Reported
    /// distinctly so the user understands the cause.
    PolicyBlocked(String),
    /// The call succeeded but the response carried no image part.
    NoImageReturned,
    /// Transport failure, non-2xx status, or malformed payload.
    UpstreamError(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::PolicyBlocked(reason) => {
                write!(f, "Request blocked by content policy: {}", reason)
            }
            ServiceError::NoImageReturned => write!(f, "The service returned no image"),
            ServiceError::UpstreamError(detail) => write!(f, "Generation service error: {}", detail),
        }
    }
}

impl std::error::Error for ServiceError {}

/// One generative edit request. Masks are native-resolution RGBA rasters
/// whose alpha channel is the sole semantic carrier; `None` means the
/// corresponding scope is absent.
pub struct GenerateRequest {
    pub base_image: RgbaImage,
    pub edit_mask: Option<RgbaImage>,
    pub preserve_mask: Option<RgbaImage>,
    pub instruction: String,
    pub output_size: OutputSize,
}

pub struct GenerationClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

impl GenerationClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Endpoint and model from `RETOUCH_PROXY_URL` / `RETOUCH_MODEL`, with
    /// local-proxy defaults.
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("RETOUCH_PROXY_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = std::env::var("RETOUCH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(endpoint, model)
    }

    /// Submit an edit and decode the returned raster. The caller conforms
    /// the result to the output size before committing it.
    pub fn generate(&self, request: &GenerateRequest) -> Result<RgbaImage, ServiceError> {
        let body = build_request_body(&self.model, request)?;
        let response = post_json(&self.http, &self.endpoint, &body)?;
        extract_image(&response)
    }
}

/// Assemble the `{model, contents, config}` wire body.
///
/// The mask precedence contract travels as instruction text: the engine
/// never subtracts preserve coverage from the edit mask geometrically, so
/// "preserve wins" is stated to the service alongside the mask parts.
fn build_request_body(model: &str, request: &GenerateRequest) -> Result<Value, ServiceError> {
    let mut parts = Vec::new();

    let mut instruction = format!(
        "Edit this image: {}. Apply changes only inside the regions selected by \
         the edit mask (second image, non-transparent pixels).",
        request.instruction.trim()
    );
    if request.preserve_mask.is_some() {
        instruction.push_str(
            " A preserve mask follows; pixels it selects must remain identical to \
             the source, taking precedence over the edit mask wherever the two overlap.",
        );
    }
    parts.push(json!({ "text": instruction }));
    parts.push(inline_image_part(&request.base_image)?);
    if let Some(mask) = &request.edit_mask {
        parts.push(inline_image_part(mask)?);
    }
    if let Some(mask) = &request.preserve_mask {
        parts.push(inline_image_part(mask)?);
    }

    Ok(json!({
        "model": model,
        "contents": [{ "role": "user", "parts": parts }],
        "config": {
            "responseModalities": ["IMAGE"],
            "imageConfig": {
                "width": request.output_size.width,
                "height": request.output_size.height,
            },
        },
    }))
}

/// Encode a raster as a base64 PNG `inline_data` part.
pub(crate) fn inline_image_part(img: &RgbaImage) -> Result<Value, ServiceError> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| ServiceError::UpstreamError(format!("PNG encode failed: {}", e)))?;
    Ok(json!({
        "inlineData": { "mimeType": "image/png", "data": BASE64.encode(bytes) }
    }))
}

/// POST the body and parse the response as JSON, mapping transport and
/// status failures to `UpstreamError`.
pub(crate) fn post_json(
    http: &reqwest::blocking::Client,
    endpoint: &str,
    body: &Value,
) -> Result<Value, ServiceError> {
    let response = http
        .post(endpoint)
        .timeout(REQUEST_TIMEOUT)
        .json(body)
        .send()
        .map_err(|e| ServiceError::UpstreamError(e.to_string()))?;

    let status = response.status();
    let payload: Value = response
        .json()
        .map_err(|e| ServiceError::UpstreamError(format!("invalid JSON response: {}", e)))?;

    if !status.is_success() {
        let detail = payload
            .get("error")
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(ServiceError::UpstreamError(detail));
    }
    Ok(payload)
}

/// Pull the first image part out of an upstream response, distinguishing a
/// policy block from a merely image-less answer.
pub fn extract_image(response: &Value) -> Result<RgbaImage, ServiceError> {
    if let Some(reason) = response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(ServiceError::PolicyBlocked(reason.to_string()));
    }

    let candidate = response
        .pointer("/candidates/0")
        .ok_or(ServiceError::NoImageReturned)?;

    if let Some(finish) = candidate.get("finishReason").and_then(Value::as_str) {
        if matches!(finish, "SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY") {
            return Err(ServiceError::PolicyBlocked(finish.to_string()));
        }
    }

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .ok_or(ServiceError::NoImageReturned)?;

    for part in parts {
        let data = part
            .pointer("/inlineData/data")
            .or_else(|| part.pointer("/inline_data/data"))
            .and_then(Value::as_str);
        if let Some(b64) = data {
            let bytes = BASE64
                .decode(b64)
                .map_err(|e| ServiceError::UpstreamError(format!("base64 decode failed: {}", e)))?;
            let img = image::load_from_memory(&bytes)
                .map_err(|e| ServiceError::UpstreamError(format!("image decode failed: {}", e)))?;
            return Ok(img.to_rgba8());
        }
    }

    Err(ServiceError::NoImageReturned)
}
