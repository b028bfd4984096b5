use std::sync::Arc;

use eframe::egui;
use image::RgbaImage;

// ============================================================================
// IMAGE VERSIONS — immutable snapshots owned by the history
// ============================================================================

/// What produced a version. Shown in the history panel and used by the
/// prompt ledger to tag instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionKind {
    Upload,
    Retouch,
    Adjust,
    Filter,
    Crop,
}

impl VersionKind {
    pub fn label(&self) -> &'static str {
        match self {
            VersionKind::Upload => "Upload",
            VersionKind::Retouch => "Retouch",
            VersionKind::Adjust => "Adjust",
            VersionKind::Filter => "Filter",
            VersionKind::Crop => "Crop",
        }
    }
}

/// One immutable raster snapshot. The pixel buffer is shared via `Arc` so
/// undo/redo never copies and navigation returns the *same* allocation it
/// left — panels and the renderer compare versions by pointer identity.
#[derive(Clone)]
pub struct ImageVersion {
    pixels: Arc<RgbaImage>,
    kind: VersionKind,
    label: String,
}

impl ImageVersion {
    pub fn new(pixels: RgbaImage, kind: VersionKind, label: impl Into<String>) -> Self {
        Self {
            pixels: Arc::new(pixels),
            kind,
            label: label.into(),
        }
    }

    pub fn pixels(&self) -> &Arc<RgbaImage> {
        &self.pixels
    }

    pub fn kind(&self) -> VersionKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True when both versions share the same underlying pixel buffer.
    pub fn same_pixels(&self, other: &ImageVersion) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

// ============================================================================
// VERSION HISTORY — linear undo/redo over whole-image snapshots
// ============================================================================

/// Ordered list of versions plus a current pointer.
///
/// Strictly linear: `commit` discards every version past the pointer before
/// appending, so there is never a branch. `reset` is the one deliberate
/// exception — it rewinds the pointer to the first version *without*
/// discarding anything, so `redo` can still walk forward afterwards.
pub struct VersionHistory {
    versions: Vec<ImageVersion>,
    /// `None` iff `versions` is empty; otherwise a valid index.
    current: Option<usize>,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionHistory {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
            current: None,
        }
    }

    /// Truncate everything after the current pointer, append `version`, and
    /// point at it.
    pub fn commit(&mut self, version: ImageVersion) {
        match self.current {
            Some(idx) => self.versions.truncate(idx + 1),
            None => self.versions.clear(),
        }
        self.versions.push(version);
        self.current = Some(self.versions.len() - 1);
    }

    /// Step back one version. No-op at the first version or on an empty
    /// history. Returns true if the pointer moved.
    pub fn undo(&mut self) -> bool {
        match self.current {
            Some(idx) if idx > 0 => {
                self.current = Some(idx - 1);
                true
            }
            _ => false,
        }
    }

    /// Step forward one version. No-op at the tail. Returns true if the
    /// pointer moved.
    pub fn redo(&mut self) -> bool {
        match self.current {
            Some(idx) if idx + 1 < self.versions.len() => {
                self.current = Some(idx + 1);
                true
            }
            _ => false,
        }
    }

    /// Rewind to the first version, keeping every later version reachable by
    /// `redo`. Returns true if the pointer moved.
    pub fn reset(&mut self) -> bool {
        match self.current {
            Some(idx) if idx > 0 => {
                self.current = Some(0);
                true
            }
            _ => false,
        }
    }

    /// Drop everything. Used when a new image is uploaded.
    pub fn clear(&mut self) {
        self.versions.clear();
        self.current = None;
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.current, Some(idx) if idx > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.current, Some(idx) if idx + 1 < self.versions.len())
    }

    /// The version the editor is showing right now.
    pub fn current(&self) -> Option<&ImageVersion> {
        self.current.map(|idx| &self.versions[idx])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn version_at(&self, idx: usize) -> Option<&ImageVersion> {
        self.versions.get(idx)
    }

    /// Jump the pointer to an arbitrary version (history panel click).
    /// Out-of-range indices are ignored. Returns true if the pointer moved.
    pub fn jump_to(&mut self, idx: usize) -> bool {
        if idx < self.versions.len() && self.current != Some(idx) {
            self.current = Some(idx);
            true
        } else {
            false
        }
    }
}

// ============================================================================
// EPOCH GATE — invalidates in-flight service responses on navigation
// ============================================================================

/// Monotonic token tying dispatched background work to the history position
/// it was started from.
///
/// A job captures `current()` at dispatch. Every navigation (undo, redo,
/// reset, jump) and every new upload calls `bump`, so a response arriving
/// afterwards fails `admits` and is discarded instead of being committed
/// onto an unrelated version.
#[derive(Default)]
pub struct EpochGate {
    epoch: u64,
}

impl EpochGate {
    /// Token for work dispatched right now.
    pub fn current(&self) -> u64 {
        self.epoch
    }

    /// Invalidate every token issued so far.
    pub fn bump(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// True when `token` was captured at the current epoch.
    pub fn admits(&self, token: u64) -> bool {
        token == self.epoch
    }
}

// ============================================================================
// HISTORY PANEL — clickable list of versions, newest last
// ============================================================================

#[derive(Default)]
pub struct HistoryPanel;

impl HistoryPanel {
    /// Render the version list. Returns the index the user clicked, if any;
    /// the caller performs the jump so it can also clear masks and bump the
    /// generation epoch.
    pub fn show(&mut self, ui: &mut egui::Ui, history: &VersionHistory) -> Option<usize> {
        let mut clicked = None;

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("History").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{} versions", history.len()));
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .max_height(180.0)
            .show(ui, |ui| {
                for idx in 0..history.len() {
                    let version = match history.version_at(idx) {
                        Some(v) => v,
                        None => continue,
                    };
                    let is_current = history.current_index() == Some(idx);
                    let text = format!("{}  {}", version.kind().label(), version.label());
                    let response = ui.selectable_label(is_current, text);
                    if response.clicked() && !is_current {
                        clicked = Some(idx);
                    }
                }
            });

        clicked
    }
}
