use eframe::egui;

use crate::components::history::VersionKind;

// ============================================================================
// PROMPT LEDGER — append-only log of the instructions used this session
// ============================================================================

/// One recorded instruction. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptEntry {
    pub kind: VersionKind,
    pub text: String,
}

/// Append-only ledger of `(kind, instruction)` pairs, for traceability and
/// one-click re-use. Cleared only when a new image is uploaded — history
/// navigation leaves it untouched.
#[derive(Default)]
pub struct PromptLedger {
    entries: Vec<PromptEntry>,
}

impl PromptLedger {
    pub fn append(&mut self, kind: VersionKind, text: impl Into<String>) {
        self.entries.push(PromptEntry {
            kind,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New upload: drop the ledger along with the history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// PROMPTS PANEL
// ============================================================================

#[derive(Default)]
pub struct PromptsPanel;

impl PromptsPanel {
    /// Render the ledger, newest first. Returns the text of an entry the
    /// user clicked to re-use, if any.
    pub fn show(&mut self, ui: &mut egui::Ui, ledger: &PromptLedger) -> Option<String> {
        let mut reuse = None;

        ui.label(egui::RichText::new("Prompts").strong());
        ui.separator();

        if ledger.is_empty() {
            ui.weak("No instructions yet this session.");
            return None;
        }

        egui::ScrollArea::vertical()
            .id_source("prompt_ledger")
            .max_height(160.0)
            .show(ui, |ui| {
                for entry in ledger.entries().iter().rev() {
                    let text = format!("[{}] {}", entry.kind.label(), entry.text);
                    let response = ui
                        .selectable_label(false, text)
                        .on_hover_text("Click to re-use this instruction");
                    if response.clicked() {
                        reuse = Some(entry.text.clone());
                    }
                }
            });

        reuse
    }
}
