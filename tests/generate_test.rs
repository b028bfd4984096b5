use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use retouch_studio::ops::generate::{extract_image, ServiceError};
use serde_json::json;

fn png_b64(width: u32, height: u32, color: Rgba<u8>) -> String {
    let mut img = RgbaImage::new(width, height);
    for px in img.pixels_mut() {
        *px = color;
    }
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    BASE64.encode(bytes)
}

mod response_parsing {
    use super::*;

    #[test]
    fn decodes_the_first_image_part() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here is your edit" },
                        { "inlineData": { "mimeType": "image/png",
                                          "data": png_b64(8, 6, Rgba([10, 20, 30, 255])) } },
                    ],
                },
            }],
        });
        let img = extract_image(&response).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(*img.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inline_data": { "mime_type": "image/png",
                                           "data": png_b64(4, 4, Rgba([0, 0, 0, 255])) } },
                    ],
                },
            }],
        });
        assert!(extract_image(&response).is_ok());
    }

    #[test]
    fn text_only_response_is_no_image_returned() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [ { "text": "cannot comply" } ] },
            }],
        });
        assert_eq!(extract_image(&response), Err(ServiceError::NoImageReturned));
    }

    #[test]
    fn empty_response_is_no_image_returned() {
        assert_eq!(
            extract_image(&json!({ "candidates": [] })),
            Err(ServiceError::NoImageReturned)
        );
    }

    #[test]
    fn prompt_feedback_block_is_policy_blocked() {
        let response = json!({
            "promptFeedback": { "blockReason": "SAFETY" },
        });
        assert_eq!(
            extract_image(&response),
            Err(ServiceError::PolicyBlocked("SAFETY".to_string()))
        );
    }

    #[test]
    fn safety_finish_reason_is_policy_blocked() {
        let response = json!({
            "candidates": [{
                "finishReason": "IMAGE_SAFETY",
                "content": { "parts": [] },
            }],
        });
        assert_eq!(
            extract_image(&response),
            Err(ServiceError::PolicyBlocked("IMAGE_SAFETY".to_string()))
        );
    }

    #[test]
    fn policy_blocks_read_distinctly_from_upstream_errors() {
        let blocked = ServiceError::PolicyBlocked("SAFETY".into()).to_string();
        let upstream = ServiceError::UpstreamError("HTTP 500".into()).to_string();
        assert!(blocked.contains("policy"));
        assert!(!upstream.contains("policy"));
    }

    #[test]
    fn corrupt_image_payload_is_an_upstream_error() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "bm90IGEgcG5n" } },
                    ],
                },
            }],
        });
        match extract_image(&response) {
            Err(ServiceError::UpstreamError(detail)) => {
                assert!(detail.contains("decode"));
            }
            other => panic!("expected UpstreamError, got {:?}", other),
        }
    }
}
