use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use eframe::egui;
use image::RgbaImage;

use crate::components::history::{
    EpochGate, HistoryPanel, ImageVersion, VersionHistory, VersionKind,
};
use crate::components::masks::{CompositeMode, MaskEngine, MaskRole};
use crate::components::prompts::{PromptLedger, PromptsPanel};
use crate::components::tools::{PanelTab, Tool, ToolsPanel};
use crate::io::{encode_and_write, load_image_sync, SaveFormat};
use crate::ops::crop::rasterize_selection;
use crate::ops::generate::{GenerateRequest, GenerationClient, ServiceError};
use crate::ops::intake::{
    conform_to_output, downscale_plan, downscale_upload, OutputSize, MAX_UPLOAD_EDGE,
};
use crate::ops::segment::SegmentationClient;
use crate::view::{CanvasEvent, CanvasView};
use crate::{log_err, log_info, log_warn};

// ============================================================================
// ASYNC SERVICE PIPELINE — background calls with channel completion
// ============================================================================

/// Result delivered from a background service job.
///
/// Every job carries the generation epoch captured at dispatch. History
/// navigation and new uploads bump the epoch, so a response that arrives
/// after the user moved elsewhere is detected and discarded instead of
/// being committed onto an unrelated point in history.
enum JobResult {
    Generation {
        epoch: u64,
        kind: VersionKind,
        instruction: String,
        outcome: Result<RgbaImage, ServiceError>,
    },
    Segmentation {
        epoch: u64,
        outcome: Result<RgbaImage, ServiceError>,
    },
}

/// Global adjustment presets offered by the Adjust tab.
const ADJUSTMENT_PRESETS: &[&str] = &[
    "Brighten",
    "Darken",
    "Increase contrast",
    "Warmer tones",
    "Cooler tones",
    "Boost saturation",
];

/// Global filter presets offered by the Filter tab.
const FILTER_PRESETS: &[&str] = &[
    "Black and white",
    "Sepia",
    "Film grain",
    "Soft focus",
    "Vintage fade",
    "Vivid pop",
];

/// An upload whose longer edge exceeds the threshold, parked until the user
/// picks downscale-or-proceed.
struct PendingUpload {
    image: RgbaImage,
    name: String,
    plan: OutputSize,
}

// ============================================================================
// APPLICATION
// ============================================================================

pub struct RetouchApp {
    // Document state
    history: VersionHistory,
    masks: MaskEngine,
    masks_dirty: bool,
    ledger: PromptLedger,
    output_size: Option<OutputSize>,

    // Transient selection state
    pending_crop: Option<egui::Rect>,

    // UI components
    view: CanvasView,
    tools_panel: ToolsPanel,
    history_panel: HistoryPanel,
    prompts_panel: PromptsPanel,
    active_tab: PanelTab,

    // Panel inputs
    instruction: String,
    adjustment_idx: usize,
    filter_idx: usize,
    save_format: SaveFormat,

    // Oversize-upload decision
    pending_upload: Option<PendingUpload>,

    // Service pipeline
    job_sender: mpsc::Sender<JobResult>,
    job_receiver: mpsc::Receiver<JobResult>,
    busy: bool,
    busy_label: String,
    /// Bumped on undo/redo/reset/jump/new upload; stale job results are
    /// discarded on arrival.
    epoch: EpochGate,

    // Status line: message + error flag
    status: Option<(String, bool)>,
}

impl RetouchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (job_sender, job_receiver) = mpsc::channel();
        Self {
            history: VersionHistory::new(),
            masks: MaskEngine::new(1, 1),
            masks_dirty: true,
            ledger: PromptLedger::default(),
            output_size: None,
            pending_crop: None,
            view: CanvasView::default(),
            tools_panel: ToolsPanel::default(),
            history_panel: HistoryPanel::default(),
            prompts_panel: PromptsPanel::default(),
            active_tab: PanelTab::Retouch,
            instruction: String::new(),
            adjustment_idx: 0,
            filter_idx: 0,
            save_format: SaveFormat::Png,
            pending_upload: None,
            job_sender,
            job_receiver,
            busy: false,
            busy_label: String::new(),
            epoch: EpochGate::default(),
            status: None,
        }
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Shared cleanup after every successful commit or history navigation:
    /// clear both mask layers and any pending crop selection.
    fn clear_transient_state(&mut self) {
        self.masks.clear_all();
        self.masks_dirty = true;
        self.pending_crop = None;
    }

    /// Navigation additionally invalidates any in-flight service response.
    fn bump_epoch(&mut self) {
        self.epoch.bump();
    }

    fn do_undo(&mut self) {
        if self.history.undo() {
            self.clear_transient_state();
            self.bump_epoch();
        }
    }

    fn do_redo(&mut self) {
        if self.history.redo() {
            self.clear_transient_state();
            self.bump_epoch();
        }
    }

    fn do_reset(&mut self) {
        if self.history.reset() {
            self.clear_transient_state();
            self.bump_epoch();
            self.set_status("Back to the original image — Redo still works", false);
        }
    }

    fn do_jump(&mut self, idx: usize) {
        if self.history.jump_to(idx) {
            self.clear_transient_state();
            self.bump_epoch();
        }
    }

    fn commit_version(&mut self, version: ImageVersion) {
        self.history.commit(version);
        self.clear_transient_state();
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        let msg = msg.into();
        if is_error {
            log_err!("{}", msg);
        } else {
            log_info!("{}", msg);
        }
        self.status = Some((msg, is_error));
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    fn open_image_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
            .pick_file();
        if let Some(path) = picked {
            self.load_upload(path);
        }
    }

    fn load_upload(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        match load_image_sync(&path) {
            Ok(img) => {
                // Oversize uploads park here until the user decides; the
                // history is not initialized before that choice.
                if let Some(plan) = downscale_plan(img.width(), img.height(), MAX_UPLOAD_EDGE) {
                    self.pending_upload = Some(PendingUpload {
                        image: img,
                        name,
                        plan,
                    });
                } else {
                    self.start_session(img, name);
                }
            }
            Err(e) => self.set_status(e, true),
        }
    }

    /// Initialize a fresh editing session from an upload (possibly already
    /// downscaled). Clears everything from the previous session.
    fn start_session(&mut self, image: RgbaImage, name: String) {
        log_info!(
            "new upload '{}' ({}x{})",
            name,
            image.width(),
            image.height()
        );
        self.output_size = Some(OutputSize::of_image(&image));
        self.history.clear();
        self.ledger.clear();
        self.bump_epoch();
        self.view.invalidate();
        self.masks = MaskEngine::new(image.width(), image.height());
        self.masks_dirty = true;
        self.pending_crop = None;
        self.history
            .commit(ImageVersion::new(image, VersionKind::Upload, name));
        self.status = None;
    }

    fn save_image_dialog(&mut self) {
        let version = match self.history.current() {
            Some(v) => v.clone(),
            None => {
                self.set_status("Nothing to save — open an image first", true);
                return;
            }
        };
        let picked = rfd::FileDialog::new()
            .add_filter(self.save_format.label(), &[self.save_format.extension()])
            .set_file_name(&format!("retouched.{}", self.save_format.extension()))
            .save_file();
        if let Some(path) = picked {
            let format = SaveFormat::from_path(&path).unwrap_or(self.save_format);
            match encode_and_write(version.pixels(), &path, format, 90) {
                Ok(()) => self.set_status(format!("Saved {}", path.display()), false),
                Err(e) => self.set_status(format!("Save failed: {}", e), true),
            }
        }
    }

    // ------------------------------------------------------------------
    // Service submission
    // ------------------------------------------------------------------

    /// Validate and dispatch a region-scoped generative edit.
    ///
    /// All validation errors are detected here, before any network call,
    /// and mutate no state.
    fn submit_retouch(&mut self) {
        if self.busy {
            return;
        }
        let version = match self.history.current() {
            Some(v) => v.clone(),
            None => {
                self.set_status("Open an image first", true);
                return;
            }
        };
        let instruction = self.instruction.trim().to_string();
        if instruction.is_empty() {
            self.set_status("Describe the edit before submitting", true);
            return;
        }
        let output_size = match self.output_size {
            Some(s) => s,
            None => {
                self.set_status("Set an output size first", true);
                return;
            }
        };
        if !self.masks.edit_has_content() {
            self.set_status("Paint an edit mask over the area to change", true);
            return;
        }

        let (nw, nh) = (version.width(), version.height());
        let edit_mask = self.masks.export_native(MaskRole::Edit, nw, nh);
        if edit_mask.is_none() {
            // Sub-pixel strokes can vanish on rescale; treat as empty.
            self.set_status("The edit mask is too small to export — paint a larger area", true);
            return;
        }
        let preserve_mask = self.masks.export_native(MaskRole::Preserve, nw, nh);

        let request = GenerateRequest {
            base_image: version.pixels().as_ref().clone(),
            edit_mask,
            preserve_mask,
            instruction: instruction.clone(),
            output_size,
        };
        self.dispatch_generation(VersionKind::Retouch, instruction, request);
    }

    /// Dispatch a global (unmasked) adjustment or filter.
    fn submit_global(&mut self, kind: VersionKind, instruction: String) {
        if self.busy {
            return;
        }
        let version = match self.history.current() {
            Some(v) => v.clone(),
            None => {
                self.set_status("Open an image first", true);
                return;
            }
        };
        let output_size = match self.output_size {
            Some(s) => s,
            None => {
                self.set_status("Set an output size first", true);
                return;
            }
        };

        let request = GenerateRequest {
            base_image: version.pixels().as_ref().clone(),
            edit_mask: None,
            preserve_mask: None,
            instruction: instruction.clone(),
            output_size,
        };
        self.dispatch_generation(kind, instruction, request);
    }

    fn dispatch_generation(
        &mut self,
        kind: VersionKind,
        instruction: String,
        request: GenerateRequest,
    ) {
        self.busy = true;
        self.busy_label = format!("{}…", kind.label());
        let epoch = self.epoch.current();
        let sender = self.job_sender.clone();
        log_info!("dispatching {} request (epoch {})", kind.label(), epoch);
        rayon::spawn(move || {
            let client = GenerationClient::from_env();
            let outcome = client.generate(&request);
            let _ = sender.send(JobResult::Generation {
                epoch,
                kind,
                instruction,
                outcome,
            });
        });
    }

    /// Magic-preserve click: delegate to the Segmentation Service.
    fn dispatch_segmentation(&mut self, native_point: (u32, u32)) {
        if self.busy {
            return;
        }
        let version = match self.history.current() {
            Some(v) => v.clone(),
            None => return,
        };
        self.busy = true;
        self.busy_label = "Segmenting…".to_string();
        let epoch = self.epoch.current();
        let sender = self.job_sender.clone();
        let image = version.pixels().as_ref().clone();
        rayon::spawn(move || {
            let client = SegmentationClient::from_env();
            let outcome = client.segment_at(&image, native_point);
            let _ = sender.send(JobResult::Segmentation { epoch, outcome });
        });
    }

    // ------------------------------------------------------------------
    // Service completion
    // ------------------------------------------------------------------

    fn poll_jobs(&mut self) {
        while let Ok(result) = self.job_receiver.try_recv() {
            // The busy flag clears on every path out of this match.
            self.busy = false;
            match result {
                JobResult::Generation {
                    epoch,
                    kind,
                    instruction,
                    outcome,
                } => {
                    if !self.epoch.admits(epoch) {
                        log_warn!(
                            "discarding stale {} response (epoch {} != {})",
                            kind.label(),
                            epoch,
                            self.epoch.current()
                        );
                        continue;
                    }
                    match outcome {
                        Ok(raster) => {
                            let size = self
                                .output_size
                                .unwrap_or_else(|| OutputSize::of_image(&raster));
                            let conformed = conform_to_output(raster, size);
                            self.commit_version(ImageVersion::new(
                                conformed,
                                kind,
                                instruction.clone(),
                            ));
                            self.ledger.append(kind, instruction);
                            self.set_status(format!("{} applied", kind.label()), false);
                        }
                        Err(e) => self.set_status(e.to_string(), true),
                    }
                }
                JobResult::Segmentation { epoch, outcome } => {
                    if !self.epoch.admits(epoch) {
                        log_warn!("discarding stale segmentation response");
                        continue;
                    }
                    match outcome {
                        Ok(bw) => {
                            self.masks.set_preserve_from_segmentation(&bw);
                            self.masks_dirty = true;
                            self.set_status("Preserve mask set from segmentation", false);
                        }
                        Err(e) => self.set_status(e.to_string(), true),
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Crop
    // ------------------------------------------------------------------

    fn apply_crop(&mut self) {
        let version = match self.history.current() {
            Some(v) => v.clone(),
            None => return,
        };
        let mapping = match self.view.mapping {
            Some(m) => m,
            None => return,
        };
        let selection = match self.pending_crop {
            Some(r) => r,
            None => {
                self.set_status("Drag a crop rectangle first", true);
                return;
            }
        };

        match rasterize_selection(version.pixels(), selection, &mapping) {
            Ok(raster) => {
                // Crop output follows the configured output size like every
                // other post-upload version; the label shows the committed
                // dimensions, not the pre-conform ones.
                let size = self
                    .output_size
                    .unwrap_or_else(|| OutputSize::of_image(&raster));
                let conformed = conform_to_output(raster, size);
                let label = format!("{}x{}", conformed.width(), conformed.height());
                self.commit_version(ImageVersion::new(conformed, VersionKind::Crop, label));
                self.set_status("Crop applied", false);
            }
            Err(e) => self.set_status(e.to_string(), true),
        }
    }

    // ------------------------------------------------------------------
    // Canvas event routing
    // ------------------------------------------------------------------

    fn handle_canvas_events(&mut self, events: Vec<CanvasEvent>) {
        let width = self.tools_panel.brush_width;
        for event in events {
            match event {
                CanvasEvent::StrokeBegin { pos } => match self.tools_panel.active_tool {
                    Tool::Brush => {
                        self.masks
                            .begin_stroke(MaskRole::Edit, pos, width, CompositeMode::Union);
                        self.masks_dirty = true;
                    }
                    Tool::Eraser => {
                        self.masks
                            .begin_stroke(MaskRole::Edit, pos, width, CompositeMode::Subtract);
                        self.masks.begin_stroke(
                            MaskRole::Preserve,
                            pos,
                            width,
                            CompositeMode::Subtract,
                        );
                        self.masks_dirty = true;
                    }
                    Tool::MagicPreserve | Tool::Crop => {}
                },
                CanvasEvent::StrokeMove { prev, next } => match self.tools_panel.active_tool {
                    Tool::Brush => {
                        self.masks.extend_stroke(
                            MaskRole::Edit,
                            prev,
                            next,
                            width,
                            CompositeMode::Union,
                        );
                        self.masks_dirty = true;
                    }
                    Tool::Eraser => {
                        self.masks.extend_stroke(
                            MaskRole::Edit,
                            prev,
                            next,
                            width,
                            CompositeMode::Subtract,
                        );
                        self.masks.extend_stroke(
                            MaskRole::Preserve,
                            prev,
                            next,
                            width,
                            CompositeMode::Subtract,
                        );
                        self.masks_dirty = true;
                    }
                    Tool::MagicPreserve | Tool::Crop => {}
                },
                CanvasEvent::StrokeEnd => {
                    self.masks.end_stroke();
                }
                CanvasEvent::MagicClick { native } => {
                    self.dispatch_segmentation(native);
                }
                CanvasEvent::CropDrag { rect } => {
                    self.pending_crop = Some(rect);
                }
                CanvasEvent::CropFinish { rect } => {
                    if rect.width() > 0.0 && rect.height() > 0.0 {
                        self.pending_crop = Some(rect);
                    } else {
                        self.pending_crop = None;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open").clicked() {
                    self.open_image_dialog();
                }
                egui::ComboBox::from_id_source("save_format")
                    .selected_text(self.save_format.label())
                    .width(70.0)
                    .show_ui(ui, |ui| {
                        for &format in SaveFormat::all() {
                            ui.selectable_value(&mut self.save_format, format, format.label());
                        }
                    });
                if ui.button("Save").clicked() {
                    self.save_image_dialog();
                }
                ui.separator();

                let can_undo = self.history.can_undo();
                let can_redo = self.history.can_redo();
                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    self.do_undo();
                }
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    self.do_redo();
                }
                if ui.add_enabled(can_undo, egui::Button::new("Reset")).clicked() {
                    self.do_reset();
                }
                ui.separator();

                self.tools_panel.show(ui, !self.history.is_empty());

                if self.busy {
                    ui.separator();
                    ui.add(egui::Spinner::new());
                    ui.label(&self.busy_label);
                }
            });
        });
    }

    fn show_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("workflow_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for &tab in PanelTab::all() {
                        if ui
                            .selectable_label(self.active_tab == tab, tab.label())
                            .clicked()
                        {
                            self.active_tab = tab;
                            // The crop tab owns the crop tool; entering it
                            // switches tools, leaving it drops the selection.
                            if tab == PanelTab::Crop {
                                self.tools_panel.set_tool(Tool::Crop);
                            } else if self.tools_panel.active_tool == Tool::Crop {
                                self.tools_panel.set_tool(Tool::Brush);
                                self.pending_crop = None;
                            }
                        }
                    }
                });
                ui.separator();

                let has_image = !self.history.is_empty();
                match self.active_tab {
                    PanelTab::Retouch => self.show_retouch_tab(ui, has_image),
                    PanelTab::Adjust => self.show_preset_tab(ui, has_image, VersionKind::Adjust),
                    PanelTab::Filter => self.show_preset_tab(ui, has_image, VersionKind::Filter),
                    PanelTab::Crop => self.show_crop_tab(ui, has_image),
                }

                ui.separator();
                self.show_output_size(ui);
                ui.separator();

                if let Some(idx) = self.history_panel.show(ui, &self.history) {
                    self.do_jump(idx);
                }
                ui.separator();

                if let Some(text) = self.prompts_panel.show(ui, &self.ledger) {
                    self.instruction = text;
                    self.active_tab = PanelTab::Retouch;
                }
            });
    }

    fn show_retouch_tab(&mut self, ui: &mut egui::Ui, has_image: bool) {
        ui.label("Paint an edit mask, optionally a preserve mask, then describe the change.");
        ui.add_space(4.0);
        ui.add(
            egui::TextEdit::multiline(&mut self.instruction)
                .desired_rows(3)
                .desired_width(f32::INFINITY)
                .hint_text("e.g. replace the sky with a sunset"),
        );
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(format!(
                "Edit mask: {}",
                if self.masks.edit_has_content() { "✓" } else { "empty" }
            ));
            ui.label(format!(
                "Preserve: {}",
                if self.masks.preserve_has_content() { "✓" } else { "empty" }
            ));
        });
        let can_submit = has_image
            && !self.busy
            && self.masks.edit_has_content()
            && !self.instruction.trim().is_empty();
        if ui
            .add_enabled(can_submit, egui::Button::new("Generate edit"))
            .clicked()
        {
            self.submit_retouch();
        }
    }

    fn show_preset_tab(&mut self, ui: &mut egui::Ui, has_image: bool, kind: VersionKind) {
        let (presets, idx) = match kind {
            VersionKind::Adjust => (ADJUSTMENT_PRESETS, &mut self.adjustment_idx),
            VersionKind::Filter => (FILTER_PRESETS, &mut self.filter_idx),
            // Only the two preset tabs route here.
            VersionKind::Upload | VersionKind::Retouch | VersionKind::Crop => return,
        };
        let mut chosen = None;
        for (i, preset) in presets.iter().enumerate() {
            if ui.selectable_label(*idx == i, *preset).clicked() {
                *idx = i;
            }
        }
        ui.add_space(4.0);
        let selected = presets[*idx];
        if ui
            .add_enabled(has_image && !self.busy, egui::Button::new(format!("Apply {}", kind.label().to_lowercase())))
            .clicked()
        {
            chosen = Some(selected.to_string());
        }
        if let Some(instruction) = chosen {
            self.submit_global(kind, instruction);
        }
    }

    fn show_crop_tab(&mut self, ui: &mut egui::Ui, has_image: bool) {
        ui.label("Drag a rectangle on the image, then apply.");
        if let Some(rect) = self.pending_crop {
            ui.label(format!(
                "Selection: {:.0} × {:.0}",
                rect.width(),
                rect.height()
            ));
        } else {
            ui.weak("No selection yet.");
        }
        ui.add_space(4.0);
        let can_apply = has_image && !self.busy && self.pending_crop.is_some();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_apply, egui::Button::new("Apply crop"))
                .clicked()
            {
                self.apply_crop();
            }
            if ui
                .add_enabled(self.pending_crop.is_some(), egui::Button::new("Clear"))
                .clicked()
            {
                self.pending_crop = None;
            }
        });
    }

    fn show_output_size(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Output size").strong());
        let mut size = self
            .output_size
            .unwrap_or(OutputSize {
                width: 1024,
                height: 1024,
            });
        let mut changed = false;
        ui.horizontal(|ui| {
            changed |= ui
                .add(egui::DragValue::new(&mut size.width).clamp_range(1..=8192).suffix(" px"))
                .changed();
            ui.label("×");
            changed |= ui
                .add(egui::DragValue::new(&mut size.height).clamp_range(1..=8192).suffix(" px"))
                .changed();
        });
        if changed {
            self.output_size = OutputSize::new(size.width, size.height);
        }
    }

    /// Modal decision for uploads whose longer edge exceeds the threshold.
    fn show_oversize_dialog(&mut self, ctx: &egui::Context) {
        let (natural, plan, name) = match &self.pending_upload {
            Some(p) => (
                (p.image.width(), p.image.height()),
                p.plan,
                p.name.clone(),
            ),
            None => return,
        };
        let mut decision: Option<bool> = None; // Some(true) = downscale
        egui::Window::new("Large image")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} is {}×{} — larger than the {}px limit for generation.",
                    name, natural.0, natural.1, MAX_UPLOAD_EDGE
                ));
                ui.label(format!(
                    "Downscale to {}×{} (recommended) or keep the original size?",
                    plan.width, plan.height
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Downscale").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Keep original").clicked() {
                        decision = Some(false);
                    }
                });
            });
        if let Some(downscale) = decision {
            if let Some(pending) = self.pending_upload.take() {
                let image = if downscale {
                    downscale_upload(&pending.image, pending.plan)
                } else {
                    pending.image
                };
                self.start_session(image, pending.name);
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (undo, redo, open, save, grow, shrink) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift,
                i.modifiers.command
                    && (i.key_pressed(egui::Key::Y)
                        || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                i.modifiers.command && i.key_pressed(egui::Key::O),
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::PlusEquals),
                i.key_pressed(egui::Key::Minus),
            )
        });
        if undo {
            self.do_undo();
        }
        if redo {
            self.do_redo();
        }
        if open {
            self.open_image_dialog();
        }
        if save {
            self.save_image_dialog();
        }
        if grow {
            self.tools_panel.grow_brush();
        }
        if shrink {
            self.tools_panel.shrink_brush();
        }
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();
        self.handle_shortcuts(ctx);
        self.show_oversize_dialog(ctx);

        self.show_top_bar(ctx);
        self.show_side_panel(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            match &self.status {
                Some((msg, true)) => {
                    ui.colored_label(egui::Color32::from_rgb(230, 90, 90), msg);
                }
                Some((msg, false)) => {
                    ui.label(msg);
                }
                None => {
                    ui.weak("Ready");
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let events = self.view.show(
                ui,
                self.history.current(),
                &self.masks,
                self.masks_dirty,
                self.tools_panel.active_tool,
                self.tools_panel.brush_width,
                self.pending_crop,
                !self.history.is_empty(),
            );
            self.masks_dirty = false;
            self.handle_canvas_events(events);

            // Keep the mask backing buffers synced to the displayed size.
            if let Some(mapping) = self.view.mapping {
                let (dw, dh) = mapping.display_px();
                let layer = self.masks.layer(MaskRole::Edit);
                if (layer.width(), layer.height()) != (dw, dh) {
                    self.masks.resync(dw, dh);
                    self.masks_dirty = true;
                }
            }
        });

        // Poll for job completion while a service call is outstanding.
        if self.busy {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
