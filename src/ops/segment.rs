use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde_json::json;

use crate::ops::generate::{
    extract_image, inline_image_part, post_json, ServiceError, DEFAULT_ENDPOINT,
};

// ============================================================================
// SEGMENTATION SERVICE CLIENT — drives the magic-preserve tool
// ============================================================================

const SEGMENTATION_MODEL: &str = "gemini-2.5-flash-image";

pub struct SegmentationClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl SegmentationClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("RETOUCH_PROXY_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint)
    }

    /// Segment the object under `point` (native pixel coordinates).
    ///
    /// Returns a binary black/white raster keyed to the full image — white
    /// marks the selected object. The result is conformed to the source
    /// dimensions before it is handed to the mask engine.
    pub fn segment_at(
        &self,
        image: &RgbaImage,
        point: (u32, u32),
    ) -> Result<RgbaImage, ServiceError> {
        let instruction = format!(
            "Produce a segmentation mask for the object at pixel ({}, {}) of this \
             image. Return only a black and white image of the exact same dimensions: \
             the selected object solid white, everything else solid black.",
            point.0, point.1
        );
        let image_part = inline_image_part(image)?;
        let body = json!({
            "model": SEGMENTATION_MODEL,
            "contents": [{
                "role": "user",
                "parts": [ { "text": instruction }, image_part ],
            }],
            "config": { "responseModalities": ["IMAGE"] },
        });

        let response = post_json(&self.http, &self.endpoint, &body)?;
        let mask = extract_image(&response)?;

        // The contract says same-size output; a mismatched raster is
        // resampled so downstream indexing stays in bounds.
        if mask.dimensions() == image.dimensions() {
            Ok(mask)
        } else {
            Ok(imageops::resize(
                &mask,
                image.width(),
                image.height(),
                FilterType::Nearest,
            ))
        }
    }
}
