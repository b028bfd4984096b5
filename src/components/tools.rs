use eframe::egui;

// ============================================================================
// TOOLS — closed tool/tab enumerations and brush settings
// ============================================================================

pub const MIN_BRUSH_WIDTH: f32 = 4.0;
pub const MAX_BRUSH_WIDTH: f32 = 200.0;
pub const DEFAULT_BRUSH_WIDTH: f32 = 44.0;

/// The active pointer tool. Matched exhaustively at every call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Paints edit-mask coverage (Union composite, edit layer only).
    Brush,
    /// Removes coverage from both mask layers (Subtract composite).
    Eraser,
    /// Click-to-segment: replaces the preserve layer from the Segmentation
    /// Service. Not a stroke tool.
    MagicPreserve,
    /// Drag a rectangle to crop.
    Crop,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::MagicPreserve => "Magic Preserve",
            Tool::Crop => "Crop",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Brush, Tool::Eraser, Tool::MagicPreserve, Tool::Crop]
    }

    /// True for tools that paint on pointer-drag.
    pub fn is_stroke_tool(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser)
    }
}

/// Which side-panel workflow is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelTab {
    Retouch,
    Adjust,
    Filter,
    Crop,
}

impl PanelTab {
    pub fn label(&self) -> &'static str {
        match self {
            PanelTab::Retouch => "Retouch",
            PanelTab::Adjust => "Adjust",
            PanelTab::Filter => "Filter",
            PanelTab::Crop => "Crop",
        }
    }

    pub fn all() -> &'static [PanelTab] {
        &[
            PanelTab::Retouch,
            PanelTab::Adjust,
            PanelTab::Filter,
            PanelTab::Crop,
        ]
    }
}

// ============================================================================
// TOOLS PANEL
// ============================================================================

pub struct ToolsPanel {
    pub active_tool: Tool,
    pub brush_width: f32,
}

impl Default for ToolsPanel {
    fn default() -> Self {
        Self {
            active_tool: Tool::Brush,
            brush_width: DEFAULT_BRUSH_WIDTH,
        }
    }
}

impl ToolsPanel {
    pub fn set_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
    }

    pub fn grow_brush(&mut self) {
        self.brush_width = (self.brush_width * 1.2).min(MAX_BRUSH_WIDTH);
    }

    pub fn shrink_brush(&mut self) {
        self.brush_width = (self.brush_width / 1.2).max(MIN_BRUSH_WIDTH);
    }

    /// Render the tool strip. `enabled` is false while no image is loaded.
    pub fn show(&mut self, ui: &mut egui::Ui, enabled: bool) {
        ui.add_enabled_ui(enabled, |ui| {
            ui.horizontal(|ui| {
                for &tool in Tool::all() {
                    let selected = self.active_tool == tool;
                    if ui.selectable_label(selected, tool.label()).clicked() {
                        self.active_tool = tool;
                    }
                }
                ui.separator();
                ui.label("Size");
                ui.add(
                    egui::Slider::new(&mut self.brush_width, MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH)
                        .show_value(false),
                );
                ui.label(format!("{:.0}px", self.brush_width));
            });
        });
    }
}
