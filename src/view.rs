use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;

use crate::components::history::ImageVersion;
use crate::components::masks::{MaskEngine, MaskRole};
use crate::components::tools::Tool;

// ============================================================================
// COORDINATE MAPPING — pointer space → canvas space → native pixels
// ============================================================================
//
// Three spaces are in play:
//   * pointer space: egui points relative to the window
//   * canvas space:  points relative to the displayed image's top-left;
//                    identical to mask-bitmap pixel coordinates, because the
//                    mask backing buffers always match the displayed size
//   * native space:  the loaded image's original pixel grid
//
// Brush input never touches native space — masks are rescaled at export
// time. Only the magic-preserve click and the crop/export paths map through
// to native pixels.

#[derive(Clone, Copy, Debug)]
pub struct DisplayMapping {
    /// On-screen top-left corner of the displayed image.
    pub origin: Pos2,
    /// Displayed size in points.
    pub display_size: Vec2,
    /// Native pixel dimensions of the current version.
    pub natural_size: (u32, u32),
    /// Device pixel ratio (egui's pixels-per-point).
    pub pixels_per_point: f32,
}

impl DisplayMapping {
    /// Pointer position → canvas-local coordinates (subtract the canvas's
    /// on-screen origin).
    pub fn pointer_to_canvas(&self, pointer: Pos2) -> (f32, f32) {
        (pointer.x - self.origin.x, pointer.y - self.origin.y)
    }

    pub fn scale_x(&self) -> f32 {
        self.natural_size.0 as f32 / self.display_size.x.max(1.0)
    }

    pub fn scale_y(&self) -> f32 {
        self.natural_size.1 as f32 / self.display_size.y.max(1.0)
    }

    /// Canvas-local coordinates → nearest native pixel, clamped into range.
    pub fn canvas_to_native(&self, canvas: (f32, f32)) -> (u32, u32) {
        let nx = (canvas.0 * self.scale_x()).round();
        let ny = (canvas.1 * self.scale_y()).round();
        (
            (nx.max(0.0) as u32).min(self.natural_size.0.saturating_sub(1)),
            (ny.max(0.0) as u32).min(self.natural_size.1.saturating_sub(1)),
        )
    }

    /// Displayed size rounded to whole pixels — the mask backing size.
    pub fn display_px(&self) -> (u32, u32) {
        (
            (self.display_size.x.round() as u32).max(1),
            (self.display_size.y.round() as u32).max(1),
        )
    }

    pub fn contains(&self, pointer: Pos2) -> bool {
        Rect::from_min_size(self.origin, self.display_size).contains(pointer)
    }
}

/// Compute where the image sits inside the available rect: fit-to-view
/// preserving aspect, centered, never upscaled past 1:1.
pub fn fit_display_rect(avail: Rect, natural_w: u32, natural_h: u32) -> Rect {
    let (nw, nh) = (natural_w.max(1) as f32, natural_h.max(1) as f32);
    let scale = (avail.width() / nw).min(avail.height() / nh).min(1.0);
    let size = Vec2::new(nw * scale, nh * scale);
    Rect::from_center_size(avail.center(), size)
}

// ============================================================================
// CANVAS EVENTS
// ============================================================================

/// What the user did on the canvas this frame, in canvas-local coordinates.
#[derive(Clone, Debug)]
pub enum CanvasEvent {
    StrokeBegin { pos: (f32, f32) },
    StrokeMove { prev: (f32, f32), next: (f32, f32) },
    StrokeEnd,
    /// Magic-preserve click, already mapped to a native pixel.
    MagicClick { native: (u32, u32) },
    /// Crop rubber band moved (live preview).
    CropDrag { rect: Rect },
    /// Crop rubber band released.
    CropFinish { rect: Rect },
}

// ============================================================================
// CANVAS VIEW — renders image + mask overlays, converts pointer input
// ============================================================================

pub struct CanvasView {
    image_tex: Option<TextureHandle>,
    /// Arc pointer of the version currently uploaded to `image_tex`.
    image_key: usize,
    edit_tex: Option<TextureHandle>,
    preserve_tex: Option<TextureHandle>,
    stroke_last: Option<(f32, f32)>,
    crop_origin: Option<(f32, f32)>,
    /// Mapping computed on the last frame; the app reads it for exports.
    pub mapping: Option<DisplayMapping>,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            image_tex: None,
            image_key: 0,
            edit_tex: None,
            preserve_tex: None,
            stroke_last: None,
            crop_origin: None,
            mapping: None,
        }
    }
}

impl CanvasView {
    /// Forget cached textures (new upload).
    pub fn invalidate(&mut self) {
        self.image_tex = None;
        self.image_key = 0;
        self.edit_tex = None;
        self.preserve_tex = None;
        self.stroke_last = None;
        self.crop_origin = None;
    }

    /// Render one frame of the canvas and translate pointer input into
    /// canvas events. `masks_dirty` forces a mask texture re-upload.
    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        version: Option<&ImageVersion>,
        masks: &MaskEngine,
        masks_dirty: bool,
        tool: Tool,
        brush_width: f32,
        pending_crop: Option<Rect>,
        input_enabled: bool,
    ) -> Vec<CanvasEvent> {
        let mut events = Vec::new();
        let avail = ui.available_rect_before_wrap();

        let version = match version {
            Some(v) => v,
            None => {
                self.mapping = None;
                ui.allocate_rect(avail, Sense::hover());
                ui.painter().text(
                    avail.center(),
                    egui::Align2::CENTER_CENTER,
                    "Open an image to start (Ctrl+O)",
                    egui::FontId::proportional(16.0),
                    ui.visuals().weak_text_color(),
                );
                return events;
            }
        };

        let display_rect = fit_display_rect(avail, version.width(), version.height());
        let mapping = DisplayMapping {
            origin: display_rect.min,
            display_size: display_rect.size(),
            natural_size: (version.width(), version.height()),
            pixels_per_point: ui.ctx().pixels_per_point(),
        };
        self.mapping = Some(mapping);

        // -- Textures ----------------------------------------------------
        let key = version.pixels().as_ref() as *const RgbaImage as usize;
        if self.image_key != key || self.image_tex.is_none() {
            let tex = ui.ctx().load_texture(
                "canvas_image",
                color_image(version.pixels()),
                TextureOptions::LINEAR,
            );
            self.image_tex = Some(tex);
            self.image_key = key;
        }
        if masks_dirty || self.edit_tex.is_none() {
            self.edit_tex = Some(ui.ctx().load_texture(
                "edit_mask",
                color_image(masks.layer(MaskRole::Edit).pixels()),
                TextureOptions::LINEAR,
            ));
            self.preserve_tex = Some(ui.ctx().load_texture(
                "preserve_mask",
                color_image(masks.layer(MaskRole::Preserve).pixels()),
                TextureOptions::LINEAR,
            ));
        }

        // -- Paint -------------------------------------------------------
        let painter = ui.painter_at(avail);
        paint_checkerboard(&painter, display_rect);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        if let Some(tex) = &self.image_tex {
            painter.image(tex.id(), display_rect, uv, Color32::WHITE);
        }
        if let Some(tex) = &self.preserve_tex {
            painter.image(tex.id(), display_rect, uv, Color32::WHITE);
        }
        if let Some(tex) = &self.edit_tex {
            painter.image(tex.id(), display_rect, uv, Color32::WHITE);
        }

        // Pending or in-progress crop rubber band
        if let Some(rect) = pending_crop {
            let screen = Rect::from_min_size(
                mapping.origin + rect.min.to_vec2(),
                rect.size(),
            );
            painter.rect_stroke(screen, 0.0, egui::Stroke::new(1.5, Color32::WHITE));
            painter.rect_stroke(
                screen.expand(1.0),
                0.0,
                egui::Stroke::new(1.0, Color32::from_black_alpha(160)),
            );
        }

        // -- Input -------------------------------------------------------
        let sense = if input_enabled {
            Sense::click_and_drag()
        } else {
            Sense::hover()
        };
        let response = ui.allocate_rect(display_rect, sense);
        if !input_enabled {
            return events;
        }

        // Brush cursor preview
        if tool.is_stroke_tool() {
            if let Some(hover) = response.hover_pos() {
                painter.circle_stroke(
                    hover,
                    brush_width * 0.5,
                    egui::Stroke::new(1.0, Color32::from_white_alpha(120)),
                );
            }
        }

        match tool {
            Tool::Brush | Tool::Eraser => {
                if response.drag_started() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let canvas = mapping.pointer_to_canvas(pos);
                        self.stroke_last = Some(canvas);
                        events.push(CanvasEvent::StrokeBegin { pos: canvas });
                    }
                } else if response.dragged() {
                    if let (Some(prev), Some(pos)) =
                        (self.stroke_last, response.interact_pointer_pos())
                    {
                        let next = mapping.pointer_to_canvas(pos);
                        if next != prev {
                            events.push(CanvasEvent::StrokeMove { prev, next });
                            self.stroke_last = Some(next);
                        }
                    }
                }
                if response.drag_released() && self.stroke_last.take().is_some() {
                    events.push(CanvasEvent::StrokeEnd);
                }
            }
            Tool::MagicPreserve => {
                if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        if mapping.contains(pos) {
                            let canvas = mapping.pointer_to_canvas(pos);
                            events.push(CanvasEvent::MagicClick {
                                native: mapping.canvas_to_native(canvas),
                            });
                        }
                    }
                }
            }
            Tool::Crop => {
                if response.drag_started() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        self.crop_origin = Some(mapping.pointer_to_canvas(pos));
                    }
                } else if response.dragged() {
                    if let (Some(origin), Some(pos)) =
                        (self.crop_origin, response.interact_pointer_pos())
                    {
                        let rect = drag_rect(origin, mapping.pointer_to_canvas(pos), mapping);
                        events.push(CanvasEvent::CropDrag { rect });
                    }
                }
                if response.drag_released() {
                    if let (Some(origin), Some(pos)) =
                        (self.crop_origin.take(), response.interact_pointer_pos())
                    {
                        let rect = drag_rect(origin, mapping.pointer_to_canvas(pos), mapping);
                        events.push(CanvasEvent::CropFinish { rect });
                    }
                }
            }
        }

        events
    }
}

/// Build the canvas-space rect spanned by a crop drag, clamped to the
/// displayed image.
fn drag_rect(a: (f32, f32), b: (f32, f32), mapping: DisplayMapping) -> Rect {
    let min = Pos2::new(a.0.min(b.0).max(0.0), a.1.min(b.1).max(0.0));
    let max = Pos2::new(
        a.0.max(b.0).min(mapping.display_size.x),
        a.1.max(b.1).min(mapping.display_size.y),
    );
    Rect::from_min_max(min, max)
}

fn color_image(img: &RgbaImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [img.width() as usize, img.height() as usize],
        img.as_raw(),
    )
}

/// Two-tone checkerboard behind transparent regions.
fn paint_checkerboard(painter: &egui::Painter, rect: Rect) {
    const TILE: f32 = 8.0;
    let light = Color32::from_gray(70);
    let dark = Color32::from_gray(54);
    painter.rect_filled(rect, 0.0, dark);
    let mut y = rect.min.y;
    let mut row = 0;
    while y < rect.max.y {
        let mut x = rect.min.x + if row % 2 == 0 { 0.0 } else { TILE };
        let tile_h = TILE.min(rect.max.y - y);
        while x < rect.max.x {
            let tile_w = TILE.min(rect.max.x - x);
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(x, y), Vec2::new(tile_w, tile_h)),
                0.0,
                light,
            );
            x += TILE * 2.0;
        }
        y += TILE;
        row += 1;
    }
}
