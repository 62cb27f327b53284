//! The builder session — single writer over exactly one `CVDocument`.
//!
//! A session is created empty (or seeded from the draft store), mutated in
//! place by section-scoped full-replace updates, and terminated by export or
//! explicit discard. Assistant results are merged through staleness-checked
//! tickets so a late response for an abandoned step can never mutate the
//! document.

pub mod handlers;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::assistant::Optimization;
use crate::model::validation::{validate_section, FieldError};
use crate::model::{CVDocument, SectionUpdate};
use crate::render::{build_render_tree, RenderTree};
use crate::wizard::{CompletionReport, Transition, WizardController, WizardError};

/// Outcome of applying a section update. Invariant violations (ongoing entry
/// with an end date, end before start) reject the update outright; missing
/// required fields apply and surface inline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub applied: bool,
    pub errors: Vec<FieldError>,
}

/// Snapshot of the step an assistant request was issued from. A result is
/// merged only while that step is still the active one.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantTicket {
    pub step: usize,
    pub target: AssistantTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AssistantTarget {
    Summary,
    ExperienceAchievements { entry_id: Uuid },
    ProjectDescription { entry_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeOutcome {
    Applied,
    /// The wizard moved on (or the target entry is gone) before the result
    /// arrived: the result is dropped and the document stays untouched.
    DiscardedStale,
}

pub struct BuilderSession {
    pub id: Uuid,
    doc: CVDocument,
    wizard: WizardController,
    staged_optimization: Option<Optimization>,
}

impl BuilderSession {
    pub fn new() -> Self {
        Self::with_document(CVDocument::default())
    }

    pub fn with_document(doc: CVDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc,
            wizard: WizardController::new(),
            staged_optimization: None,
        }
    }

    pub fn document(&self) -> &CVDocument {
        &self.doc
    }

    pub fn active_step(&self) -> usize {
        self.wizard.active_index()
    }

    pub fn completion(&self) -> CompletionReport {
        self.wizard.completion(&self.doc)
    }

    /// Full-replace of one top-level section.
    pub fn update_section(&mut self, update: SectionUpdate) -> UpdateOutcome {
        let kind = update.kind();
        let mut candidate = self.doc.clone();
        candidate.apply(update);
        let errors = validate_section(&candidate, kind);

        if errors.iter().any(|e| is_invariant_violation(e)) {
            return UpdateOutcome {
                applied: false,
                errors,
            };
        }
        self.doc = candidate;
        UpdateOutcome {
            applied: true,
            errors,
        }
    }

    pub fn navigate(&mut self, transition: Transition) -> Result<usize, WizardError> {
        self.wizard.transition(transition)
    }

    /// Issues a staleness ticket for an assistant request originating from
    /// the currently active step.
    pub fn assistant_ticket(&self, target: AssistantTarget) -> AssistantTicket {
        AssistantTicket {
            step: self.wizard.active_index(),
            target,
        }
    }

    /// Merges generated text, but only if the originating step is still
    /// active and its target still exists. Anything else is discarded.
    pub fn apply_generated(&mut self, ticket: AssistantTicket, content: &str) -> MergeOutcome {
        if ticket.step != self.wizard.active_index() {
            return MergeOutcome::DiscardedStale;
        }
        match ticket.target {
            AssistantTarget::Summary => {
                self.doc.personal_info.professional_summary = content.to_string();
                MergeOutcome::Applied
            }
            AssistantTarget::ExperienceAchievements { entry_id } => {
                let Some(entry) = self.doc.experience.iter_mut().find(|e| e.id == entry_id)
                else {
                    return MergeOutcome::DiscardedStale;
                };
                for line in bullet_lines(content) {
                    if !entry.achievements.contains(&line) {
                        entry.achievements.push(line);
                    }
                }
                MergeOutcome::Applied
            }
            AssistantTarget::ProjectDescription { entry_id } => {
                let Some(project) = self.doc.projects.iter_mut().find(|p| p.id == entry_id)
                else {
                    return MergeOutcome::DiscardedStale;
                };
                project.description = content.to_string();
                MergeOutcome::Applied
            }
        }
    }

    /// Holds an optimization preview. Nothing touches the document until the
    /// user explicitly confirms.
    pub fn stage_optimization(&mut self, optimization: Optimization) {
        self.staged_optimization = Some(optimization);
    }

    pub fn staged_optimization(&self) -> Option<&Optimization> {
        self.staged_optimization.as_ref()
    }

    /// Commits the staged optimization, replacing the whole document.
    pub fn confirm_optimization(&mut self) -> Option<&CVDocument> {
        let optimization = self.staged_optimization.take()?;
        self.doc = optimization.optimized;
        Some(&self.doc)
    }

    pub fn discard_optimization(&mut self) {
        self.staged_optimization = None;
    }

    /// Builds the render tree for export, enforcing the template gate. An
    /// explicit selection overrides the document's own for this render only.
    pub fn render_for_export(
        &mut self,
        override_selection: Option<crate::model::TemplateSelection>,
        today: NaiveDate,
    ) -> Result<RenderTree, WizardError> {
        let selection = match override_selection {
            Some(selection) => selection,
            None => {
                self.wizard.guard_export(&self.doc)?;
                self.doc
                    .template
                    .clone()
                    .ok_or(WizardError::TemplateNotSelected)?
            }
        };
        Ok(build_render_tree(&self.doc, &selection, today))
    }
}

impl Default for BuilderSession {
    fn default() -> Self {
        Self::new()
    }
}

fn is_invariant_violation(error: &FieldError) -> bool {
    error.message.contains("cannot have an end date")
        || error.message.contains("cannot precede")
        || error.message.contains("Duplicate technology")
}

/// Splits assistant output into bullet lines, stripping list markers.
fn bullet_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '\u{2022}'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
