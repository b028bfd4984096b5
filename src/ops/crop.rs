use eframe::egui::Rect;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::view::DisplayMapping;

// ============================================================================
// CROP — display-space selection → native-resolution raster
// ============================================================================
//
// DPR handling mirrors a high-density canvas: the destination raster is
// allocated at `selection × device-pixel-ratio` while the selection itself
// stays in CSS-pixel units, so output is sharp on hi-dpi displays and
// pixel-identical across differing display scales.

#[derive(Debug, PartialEq, Eq)]
pub enum CropError {
    /// Selection width or height is zero — validation failure, no raster.
    ZeroArea,
    /// Selection lies entirely outside the image.
    OutOfBounds,
}

impl std::fmt::Display for CropError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropError::ZeroArea => write!(f, "Crop selection has zero width or height"),
            CropError::OutOfBounds => write!(f, "Crop selection is outside the image"),
        }
    }
}

impl std::error::Error for CropError {}

/// Rasterize a display-space crop selection against the full native image.
///
/// 1. Zero-width/height selections fail validation before any allocation.
/// 2. The selection is scaled by the display→native factors to get the
///    native source rectangle.
/// 3. The destination is `sel_w*dpr × sel_h*dpr` device pixels.
/// 4. The source rectangle is copied into it with highest-quality
///    resampling.
pub fn rasterize_selection(
    native: &RgbaImage,
    selection: Rect,
    mapping: &DisplayMapping,
) -> Result<RgbaImage, CropError> {
    if selection.width() <= 0.0 || selection.height() <= 0.0 {
        return Err(CropError::ZeroArea);
    }

    let sx = mapping.scale_x();
    let sy = mapping.scale_y();
    let src_x = (selection.min.x * sx).round().max(0.0) as u32;
    let src_y = (selection.min.y * sy).round().max(0.0) as u32;
    let src_w = (selection.width() * sx).round() as u32;
    let src_h = (selection.height() * sy).round() as u32;

    let dpr = mapping.pixels_per_point.max(0.5);
    let dst_w = (selection.width() * dpr).round() as u32;
    let dst_h = (selection.height() * dpr).round() as u32;

    crop_scaled(native, src_x, src_y, src_w, src_h, dst_w, dst_h)
}

/// Crop a native-space rectangle at 1:1 with no resampling, clamping the
/// rectangle to the image. The output is exactly the clamped rectangle's
/// size, so a request overflowing the image edge shrinks instead of being
/// stretched back up. Headless CLI entry (`--crop x,y,w,h`).
pub fn crop_exact(
    native: &RgbaImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) -> Result<RgbaImage, CropError> {
    if w == 0 || h == 0 {
        return Err(CropError::ZeroArea);
    }
    if x >= native.width() || y >= native.height() {
        return Err(CropError::OutOfBounds);
    }
    let w = w.min(native.width() - x);
    let h = h.min(native.height() - y);
    Ok(imageops::crop_imm(native, x, y, w, h).to_image())
}

/// Crop a native-space rectangle and resample it to the destination size.
pub fn crop_scaled(
    native: &RgbaImage,
    src_x: u32,
    src_y: u32,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Result<RgbaImage, CropError> {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Err(CropError::ZeroArea);
    }
    if src_x >= native.width() || src_y >= native.height() {
        return Err(CropError::OutOfBounds);
    }

    // Clamp the source rect to the image without shifting its origin.
    let src_w = src_w.min(native.width() - src_x);
    let src_h = src_h.min(native.height() - src_y);

    let cropped = imageops::crop_imm(native, src_x, src_y, src_w, src_h).to_image();
    if cropped.dimensions() == (dst_w, dst_h) {
        return Ok(cropped);
    }
    Ok(imageops::resize(&cropped, dst_w, dst_h, FilterType::Lanczos3))
}
