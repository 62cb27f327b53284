//! Wizard step state machine.
//!
//! Steps are data — an ordered list of `{id, required}` — so navigation and
//! completeness logic stay independent of any rendering concern. No
//! transition is ever blocked by incompleteness; only the terminal export
//! action checks the template gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::validation::is_section_complete;
use crate::model::{CVDocument, SectionKind};

#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub id: SectionKind,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// The fixed step sequence. `required` is set at definition time and never
/// changes; `complete` is always computed live from the document.
pub const STEPS: [StepDef; 11] = [
    StepDef {
        id: SectionKind::PersonalInfo,
        label: "Personal Info",
        description: "Basic contact details and professional summary",
        required: true,
    },
    StepDef {
        id: SectionKind::Experience,
        label: "Work Experience",
        description: "Professional experience and achievements",
        required: true,
    },
    StepDef {
        id: SectionKind::Education,
        label: "Education",
        description: "Academic background and qualifications",
        required: true,
    },
    StepDef {
        id: SectionKind::Skills,
        label: "Skills",
        description: "Technical and soft skills",
        required: true,
    },
    StepDef {
        id: SectionKind::Languages,
        label: "Languages",
        description: "Spoken languages and certifications",
        required: false,
    },
    StepDef {
        id: SectionKind::Projects,
        label: "Projects",
        description: "Portfolio projects and achievements",
        required: false,
    },
    StepDef {
        id: SectionKind::Certifications,
        label: "Certifications",
        description: "Professional certifications and licenses",
        required: false,
    },
    StepDef {
        id: SectionKind::Awards,
        label: "Awards",
        description: "Honors and recognitions",
        required: false,
    },
    StepDef {
        id: SectionKind::References,
        label: "References",
        description: "Professional references",
        required: false,
    },
    StepDef {
        id: SectionKind::Template,
        label: "Template",
        description: "Choose a visual template",
        required: true,
    },
    StepDef {
        id: SectionKind::Review,
        label: "Review & Export",
        description: "Review your CV and export the final document",
        required: false,
    },
];

const TEMPLATE_STEP: usize = 9;

#[derive(Debug, Error, PartialEq)]
pub enum WizardError {
    #[error("Select a template before exporting")]
    TemplateNotSelected,
    #[error("Step index {0} is out of range")]
    InvalidStep(usize),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub index: usize,
    pub id: SectionKind,
    pub label: &'static str,
    pub required: bool,
    pub complete: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub percent: u8,
    pub steps: Vec<StepStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Transition {
    Next,
    Back,
    Jump { step: usize },
}

#[derive(Debug, Clone)]
pub struct WizardController {
    active: usize,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self { active: 0 }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_step(&self) -> &'static StepDef {
        &STEPS[self.active]
    }

    /// Applies a transition and returns the new active index. `next`/`back`
    /// clamp at the ends; `jump` accepts any in-range index, including steps
    /// ahead of incomplete ones.
    pub fn transition(&mut self, transition: Transition) -> Result<usize, WizardError> {
        match transition {
            Transition::Next => self.active = (self.active + 1).min(STEPS.len() - 1),
            Transition::Back => self.active = self.active.saturating_sub(1),
            Transition::Jump { step } => {
                if step >= STEPS.len() {
                    return Err(WizardError::InvalidStep(step));
                }
                self.active = step;
            }
        }
        Ok(self.active)
    }

    /// Gate for the terminal export action. Export is allowed at any
    /// completion percentage, but a missing template selection rejects the
    /// export and force-navigates to the template step.
    pub fn guard_export(&mut self, doc: &CVDocument) -> Result<(), WizardError> {
        if doc.template.is_none() {
            self.active = TEMPLATE_STEP;
            return Err(WizardError::TemplateNotSelected);
        }
        Ok(())
    }

    pub fn completion(&self, doc: &CVDocument) -> CompletionReport {
        let steps: Vec<StepStatus> = STEPS
            .iter()
            .enumerate()
            .map(|(index, step)| StepStatus {
                index,
                id: step.id,
                label: step.label,
                required: step.required,
                complete: step_complete(doc, step),
                active: index == self.active,
            })
            .collect();
        CompletionReport {
            percent: completion_percent(doc),
            steps,
        }
    }
}

/// Optional steps count as trivially complete; required steps defer to the
/// section completeness rules.
fn step_complete(doc: &CVDocument, step: &StepDef) -> bool {
    !step.required || is_section_complete(doc, step.id)
}

/// Percentage over ALL steps, required and optional alike.
pub fn completion_percent(doc: &CVDocument) -> u8 {
    let complete = STEPS.iter().filter(|s| step_complete(doc, s)).count();
    (100.0 * complete as f64 / STEPS.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SkillItem, TemplateSelection, TemplateStyle};

    fn doc_with_personal_info() -> CVDocument {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace".to_string();
        doc.personal_info.email = "ada@x.com".to_string();
        doc
    }

    #[test]
    fn test_next_clamps_at_last_step() {
        let mut wizard = WizardController::new();
        for _ in 0..30 {
            wizard.transition(Transition::Next).unwrap();
        }
        assert_eq!(wizard.active_index(), STEPS.len() - 1);
    }

    #[test]
    fn test_back_clamps_at_first_step() {
        let mut wizard = WizardController::new();
        wizard.transition(Transition::Back).unwrap();
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn test_jump_is_unrestricted_within_range() {
        let mut wizard = WizardController::new();
        // Skipping ahead over incomplete required steps is allowed.
        wizard.transition(Transition::Jump { step: 8 }).unwrap();
        assert_eq!(wizard.active_index(), 8);
        assert_eq!(
            wizard.transition(Transition::Jump { step: 11 }),
            Err(WizardError::InvalidStep(11))
        );
    }

    #[test]
    fn test_completion_counts_all_steps() {
        // Required steps: {0, 1, 2, 3, 9}. Six optional steps are always
        // complete. With only step 0 satisfied: round(100 * 7 / 11) = 64.
        let doc = doc_with_personal_info();
        assert_eq!(completion_percent(&doc), 64);
    }

    #[test]
    fn test_completion_empty_document() {
        // Only the six optional steps count: round(100 * 6 / 11) = 55.
        assert_eq!(completion_percent(&CVDocument::default()), 55);
    }

    #[test]
    fn test_completion_reaches_one_hundred() {
        let mut doc = doc_with_personal_info();
        doc.experience.push(crate::model::ExperienceEntry {
            id: uuid::Uuid::new_v4(),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: String::new(),
            start_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: None,
            is_current_job: true,
            responsibilities: vec![],
            achievements: vec![],
        });
        doc.education.push(crate::model::EducationEntry {
            id: uuid::Uuid::new_v4(),
            degree: "BSc Mathematics".to_string(),
            institution: "University of London".to_string(),
            location: String::new(),
            graduation_date: None,
            gpa: None,
            relevant_courses: vec![],
        });
        doc.skills.technical.push(SkillItem {
            name: "Rust".to_string(),
            proficiency: None,
        });
        doc.template = Some(TemplateSelection {
            template_id: "modern-1".to_string(),
            style: TemplateStyle::Modern,
            color: "blue".to_string(),
        });
        assert_eq!(completion_percent(&doc), 100);
    }

    #[test]
    fn test_guard_export_rejects_and_navigates_without_template() {
        let mut wizard = WizardController::new();
        let doc = doc_with_personal_info();
        assert_eq!(
            wizard.guard_export(&doc),
            Err(WizardError::TemplateNotSelected)
        );
        // Rejection force-navigates to the template step.
        assert_eq!(wizard.active_index(), TEMPLATE_STEP);
    }

    #[test]
    fn test_guard_export_passes_with_template() {
        let mut wizard = WizardController::new();
        let mut doc = doc_with_personal_info();
        doc.template = Some(TemplateSelection {
            template_id: "minimal-1".to_string(),
            style: TemplateStyle::Minimal,
            color: "green".to_string(),
        });
        assert!(wizard.guard_export(&doc).is_ok());
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn test_step_table_shape() {
        assert_eq!(STEPS.len(), 11);
        let required: Vec<usize> = STEPS
            .iter()
            .enumerate()
            .filter(|(_, s)| s.required)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(required, vec![0, 1, 2, 3, 9]);
        assert_eq!(STEPS[TEMPLATE_STEP].id, SectionKind::Template);
    }
}
