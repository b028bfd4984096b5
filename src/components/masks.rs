use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

// ============================================================================
// DUAL-MASK ENGINE — display-resolution edit/preserve selections
// ============================================================================
//
// Two independent raster layers scope a generative edit: the *edit* mask
// selects pixels eligible for regeneration, the *preserve* mask selects
// pixels that must stay identical to the source. Both live at the image's
// displayed size so brush input is resolution-independent; they are only
// rescaled to native resolution at export time.
//
// The alpha channel is the sole semantic carrier. The RGB marker color
// exists purely so the user can see the selection — exports and emptiness
// tests ignore it.

/// Which of the two mask layers an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskRole {
    Edit,
    Preserve,
}

impl MaskRole {
    pub fn label(&self) -> &'static str {
        match self {
            MaskRole::Edit => "Edit",
            MaskRole::Preserve => "Preserve",
        }
    }
}

/// How painted coverage combines with what is already on a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    /// Coverage only ever grows: `alpha = max(dst, src)`.
    Union,
    /// Coverage is removed under the stroke regardless of what painted it:
    /// `alpha = dst * (1 - src)`.
    Subtract,
    /// The incoming raster replaces the layer wholesale (clear + redraw).
    Replace,
}

/// Semi-transparent red marker for the edit selection.
pub const EDIT_MARKER: Rgba<u8> = Rgba([236, 64, 64, 140]);
/// Semi-transparent blue marker for the preserve selection.
pub const PRESERVE_MARKER: Rgba<u8> = Rgba([64, 132, 244, 140]);

/// Luminance cutoff when converting a black/white segmentation raster into
/// preserve coverage.
const SEGMENTATION_WHITE_CUTOFF: u8 = 128;

// ============================================================================
// MASK LAYER
// ============================================================================

pub struct MaskLayer {
    pixels: RgbaImage,
    marker: Rgba<u8>,
    has_content: bool,
}

impl MaskLayer {
    pub fn new(width: u32, height: u32, marker: Rgba<u8>) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            marker,
            has_content: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Cached emptiness flag, valid as of the last `rescan`.
    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        self.has_content = false;
    }

    /// Scan every alpha sample and refresh the emptiness flag. Any non-zero
    /// alpha counts as content.
    pub fn rescan(&mut self) -> bool {
        self.has_content = self.pixels.pixels().any(|px| px[3] > 0);
        self.has_content
    }

    /// Resize the layer to a new display size, carrying existing coverage
    /// along so a viewport resize does not silently drop a selection.
    pub fn resync(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.pixels.dimensions() == (width, height) {
            return;
        }
        if self.has_content {
            self.pixels = imageops::resize(&self.pixels, width, height, FilterType::Triangle);
            self.rescan();
        } else {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    /// Replace the layer's raster wholesale. The incoming image must already
    /// match the layer's dimensions; anything else is resampled to fit.
    pub fn replace(&mut self, raster: &RgbaImage) {
        if raster.dimensions() == self.pixels.dimensions() {
            self.pixels = raster.clone();
        } else {
            self.pixels = imageops::resize(
                raster,
                self.pixels.width(),
                self.pixels.height(),
                FilterType::CatmullRom,
            );
        }
        self.rescan();
    }

    /// Stamp one round brush dab centered at `(cx, cy)`.
    ///
    /// `coverage` in 0..=1 scales the marker alpha (Union) or the amount
    /// removed (Subtract). A one-pixel smoothstep rim keeps edges unaliased.
    fn stamp_disc(&mut self, cx: f32, cy: f32, radius: f32, mode: CompositeMode) {
        let radius = radius.max(0.5);
        let min_x = ((cx - radius - 1.0).floor().max(0.0)) as u32;
        let min_y = ((cy - radius - 1.0).floor().max(0.0)) as u32;
        let max_x = ((cx + radius + 1.0).ceil() as u32).min(self.pixels.width());
        let max_y = ((cy + radius + 1.0).ceil() as u32).min(self.pixels.height());

        let marker = self.marker;
        for y in min_y..max_y {
            for x in min_x..max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = disc_coverage(dist, radius);
                if coverage <= 0.0 {
                    continue;
                }
                let px = self.pixels.get_pixel_mut(x, y);
                match mode {
                    CompositeMode::Union => {
                        let src_a = (marker[3] as f32 * coverage).round() as u8;
                        if src_a > px[3] {
                            *px = Rgba([marker[0], marker[1], marker[2], src_a]);
                        }
                    }
                    CompositeMode::Subtract => {
                        let kept = (px[3] as f32 * (1.0 - coverage)).round() as u8;
                        if kept == 0 {
                            *px = Rgba([0, 0, 0, 0]);
                        } else {
                            px[3] = kept;
                        }
                    }
                    // Replace is a whole-raster operation, never a dab.
                    CompositeMode::Replace => {}
                }
            }
        }
    }

    /// Paint a round-capped, round-joined segment from `prev` to `next` with
    /// the given brush width. Dabs are spaced at a quarter radius, which is
    /// dense enough that the seams are invisible at marker opacity.
    pub fn paint_segment(
        &mut self,
        prev: (f32, f32),
        next: (f32, f32),
        brush_width: f32,
        mode: CompositeMode,
    ) {
        let radius = (brush_width / 2.0).max(0.5);
        let dx = next.0 - prev.0;
        let dy = next.1 - prev.1;
        let dist = (dx * dx + dy * dy).sqrt();
        let spacing = (radius * 0.25).max(0.5);
        let steps = (dist / spacing).ceil() as u32;

        self.stamp_disc(prev.0, prev.1, radius, mode);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            self.stamp_disc(prev.0 + dx * t, prev.1 + dy * t, radius, mode);
        }
    }

    /// Rescale the layer to native resolution for export.
    ///
    /// Returns `None` when every alpha sample is zero *after* the rescale —
    /// a sub-pixel stroke can survive the display bitmap yet vanish on
    /// resampling, and the caller must treat that as "no mask" rather than
    /// ship a degenerate raster.
    pub fn export_native(&self, native_w: u32, native_h: u32) -> Option<RgbaImage> {
        if !self.has_content || native_w == 0 || native_h == 0 {
            return None;
        }
        let rescaled = imageops::resize(&self.pixels, native_w, native_h, FilterType::Lanczos3);
        if rescaled.pixels().any(|px| px[3] > 0) {
            Some(rescaled)
        } else {
            None
        }
    }
}

/// Anti-aliased disc falloff: solid inside, one-pixel smoothstep rim.
fn disc_coverage(dist: f32, radius: f32) -> f32 {
    if dist <= radius - 0.5 {
        1.0
    } else if dist >= radius + 0.5 {
        0.0
    } else {
        let x = (radius + 0.5 - dist).clamp(0.0, 1.0);
        x * x * (3.0 - 2.0 * x)
    }
}

// ============================================================================
// MASK ENGINE — owns both layers, routes strokes, gates submission
// ============================================================================

pub struct MaskEngine {
    edit: MaskLayer,
    preserve: MaskLayer,
}

impl MaskEngine {
    pub fn new(display_w: u32, display_h: u32) -> Self {
        Self {
            edit: MaskLayer::new(display_w, display_h, EDIT_MARKER),
            preserve: MaskLayer::new(display_w, display_h, PRESERVE_MARKER),
        }
    }

    pub fn layer(&self, role: MaskRole) -> &MaskLayer {
        match role {
            MaskRole::Edit => &self.edit,
            MaskRole::Preserve => &self.preserve,
        }
    }

    /// Match both layers to the image's current displayed size. Called on
    /// image load and viewport resize.
    pub fn resync(&mut self, display_w: u32, display_h: u32) {
        self.edit.resync(display_w, display_h);
        self.preserve.resync(display_w, display_h);
    }

    /// Start a stroke: a single dab at the press position.
    pub fn begin_stroke(&mut self, role: MaskRole, pos: (f32, f32), brush_width: f32, mode: CompositeMode) {
        self.extend_stroke(role, pos, pos, brush_width, mode);
    }

    /// Extend a stroke by one pointer-move segment.
    ///
    /// The brush paints the edit layer only (Union). The eraser paints both
    /// layers (Subtract) — it removes coverage no matter which tool put it
    /// there, so the caller issues one call per layer.
    pub fn extend_stroke(
        &mut self,
        role: MaskRole,
        prev: (f32, f32),
        next: (f32, f32),
        brush_width: f32,
        mode: CompositeMode,
    ) {
        let layer = match role {
            MaskRole::Edit => &mut self.edit,
            MaskRole::Preserve => &mut self.preserve,
        };
        layer.paint_segment(prev, next, brush_width, mode);
    }

    /// End of a stroke: recompute both emptiness flags by scanning every
    /// alpha sample. These flags gate the submit action.
    pub fn end_stroke(&mut self) {
        self.edit.rescan();
        self.preserve.rescan();
    }

    pub fn edit_has_content(&self) -> bool {
        self.edit.has_content()
    }

    pub fn preserve_has_content(&self) -> bool {
        self.preserve.has_content()
    }

    /// Clear both layers to fully transparent. Invoked on successful commit,
    /// undo, redo, reset, and new upload.
    pub fn clear_all(&mut self) {
        self.edit.clear();
        self.preserve.clear();
    }

    /// Install a segmentation result as the preserve selection.
    ///
    /// The service returns a binary black/white raster at the image's native
    /// dimensions. It is rescaled to display size, its white region is
    /// recolored to the preserve marker, and it *replaces* the preserve
    /// layer wholesale — it never merges with prior preserve content.
    pub fn set_preserve_from_segmentation(&mut self, native_bw: &RgbaImage) {
        let display_w = self.preserve.width();
        let display_h = self.preserve.height();
        let scaled = if native_bw.dimensions() == (display_w, display_h) {
            native_bw.clone()
        } else {
            imageops::resize(native_bw, display_w, display_h, FilterType::CatmullRom)
        };

        let mut recolored = RgbaImage::new(display_w, display_h);
        for (dst, src) in recolored.pixels_mut().zip(scaled.pixels()) {
            // Approximate luminance is overkill for a binary raster; the
            // green channel alone separates black from white.
            if src[1] >= SEGMENTATION_WHITE_CUTOFF {
                *dst = PRESERVE_MARKER;
            }
        }
        self.preserve.replace(&recolored);
    }

    /// Export one layer at native resolution. `None` means "no mask".
    pub fn export_native(&self, role: MaskRole, native_w: u32, native_h: u32) -> Option<RgbaImage> {
        self.layer(role).export_native(native_w, native_h)
    }
}
