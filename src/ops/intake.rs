use image::imageops::{self, FilterType};
use image::RgbaImage;

// ============================================================================
// OUTPUT SIZE & RESULT INTAKE
// ============================================================================
//
// Every raster that enters the history after the first upload — generation
// results and crops alike — is conformed to the user-configured output size
// first, so every post-upload version has exactly the configured dimensions.

/// Longest edge allowed without the oversize-upload warning.
pub const MAX_UPLOAD_EDGE: u32 = 2048;

/// User-configurable target dimensions for every generated or cropped
/// result. Initialized from the upload's natural size (or its approved
/// downscale).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    pub fn of_image(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
        }
    }

    pub fn longer_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Resample a raster to the configured output size with high-quality 2D
/// resampling. No-op when it already matches.
pub fn conform_to_output(img: RgbaImage, size: OutputSize) -> RgbaImage {
    if img.dimensions() == (size.width, size.height) {
        img
    } else {
        imageops::resize(&img, size.width, size.height, FilterType::Lanczos3)
    }
}

/// Aspect-preserving downscale target for an oversize upload.
///
/// Returns `None` when the longer edge is already within `threshold`;
/// otherwise the dimensions with the longer edge set to `threshold` and the
/// shorter edge scaled to match, rounded to the nearest pixel (minimum 1).
pub fn downscale_plan(width: u32, height: u32, threshold: u32) -> Option<OutputSize> {
    let longer = width.max(height);
    if longer <= threshold || longer == 0 {
        return None;
    }
    let scale = threshold as f64 / longer as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    OutputSize::new(w, h)
}

/// Apply an approved downscale plan to the upload itself.
pub fn downscale_upload(img: &RgbaImage, plan: OutputSize) -> RgbaImage {
    imageops::resize(img, plan.width, plan.height, FilterType::Lanczos3)
}
