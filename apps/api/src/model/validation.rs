//! Field-level validation and per-section completeness.
//!
//! Validation never mutates its input and never blocks navigation — errors
//! surface inline at the section level and feed the export completeness
//! report. Completeness ("all required fields present and individually
//! valid") is what the wizard consumes.

use serde::Serialize;

use crate::model::{CVDocument, SectionKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates one section of the document, returning field-level errors.
pub fn validate_section(doc: &CVDocument, kind: SectionKind) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match kind {
        SectionKind::PersonalInfo => {
            let info = &doc.personal_info;
            if info.first_name.is_empty() {
                errors.push(FieldError::new("firstName", "First name is required"));
            }
            if info.last_name.is_empty() {
                errors.push(FieldError::new("lastName", "Last name is required"));
            }
            if info.email.is_empty() {
                errors.push(FieldError::new("email", "Email is required"));
            } else if !is_valid_email(&info.email) {
                errors.push(FieldError::new("email", "Email address is not valid"));
            }
        }
        SectionKind::Experience => {
            for (i, exp) in doc.experience.iter().enumerate() {
                let field = |name: &str| format!("experience[{i}].{name}");
                if exp.job_title.is_empty() {
                    errors.push(FieldError::new(field("jobTitle"), "Job title is required"));
                }
                if exp.company.is_empty() {
                    errors.push(FieldError::new(field("company"), "Company is required"));
                }
                if exp.start_date.is_none() {
                    errors.push(FieldError::new(field("startDate"), "Start date is required"));
                }
                if exp.is_current_job && exp.end_date.is_some() {
                    errors.push(FieldError::new(
                        field("endDate"),
                        "A current position cannot have an end date",
                    ));
                }
                if let (Some(start), Some(end)) = (exp.start_date, exp.end_date) {
                    if end < start {
                        errors.push(FieldError::new(
                            field("endDate"),
                            "End date cannot precede start date",
                        ));
                    }
                }
            }
        }
        SectionKind::Education => {
            for (i, edu) in doc.education.iter().enumerate() {
                if edu.degree.is_empty() {
                    errors.push(FieldError::new(
                        format!("education[{i}].degree"),
                        "Degree is required",
                    ));
                }
                if edu.institution.is_empty() {
                    errors.push(FieldError::new(
                        format!("education[{i}].institution"),
                        "Institution is required",
                    ));
                }
            }
        }
        SectionKind::Skills => {
            let buckets = [
                ("technical", &doc.skills.technical),
                ("soft", &doc.skills.soft),
                ("languages", &doc.skills.languages),
            ];
            for (bucket, items) in buckets {
                for (i, item) in items.iter().enumerate() {
                    if item.name.is_empty() {
                        errors.push(FieldError::new(
                            format!("skills.{bucket}[{i}].name"),
                            "Skill name is required",
                        ));
                    }
                }
            }
        }
        SectionKind::Languages => {
            for (i, lang) in doc.languages.iter().enumerate() {
                if lang.name.is_empty() {
                    errors.push(FieldError::new(
                        format!("languages[{i}].name"),
                        "Language name is required",
                    ));
                }
            }
        }
        SectionKind::Projects => {
            for (i, project) in doc.projects.iter().enumerate() {
                let field = |name: &str| format!("projects[{i}].{name}");
                if project.name.is_empty() {
                    errors.push(FieldError::new(field("name"), "Project name is required"));
                }
                if project.is_ongoing && project.end_date.is_some() {
                    errors.push(FieldError::new(
                        field("endDate"),
                        "An ongoing project cannot have an end date",
                    ));
                }
                if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
                    if end < start {
                        errors.push(FieldError::new(
                            field("endDate"),
                            "End date cannot precede start date",
                        ));
                    }
                }
                let mut seen: Vec<String> = Vec::new();
                for tech in &project.technologies {
                    let lower = tech.to_lowercase();
                    if seen.contains(&lower) {
                        errors.push(FieldError::new(
                            field("technologies"),
                            format!("Duplicate technology tag '{tech}'"),
                        ));
                    } else {
                        seen.push(lower);
                    }
                }
            }
        }
        SectionKind::Certifications => {
            for (i, cert) in doc.certifications.iter().enumerate() {
                let field = |name: &str| format!("certifications[{i}].{name}");
                if cert.name.is_empty() {
                    errors.push(FieldError::new(field("name"), "Certification name is required"));
                }
                if cert.issuer.is_empty() {
                    errors.push(FieldError::new(field("issuer"), "Issuer is required"));
                }
                if let (Some(issued), Some(expiry)) = (cert.issue_date, cert.expiry_date) {
                    if expiry < issued {
                        errors.push(FieldError::new(
                            field("expiryDate"),
                            "Expiry date cannot precede issue date",
                        ));
                    }
                }
            }
        }
        SectionKind::Awards => {
            for (i, award) in doc.awards.iter().enumerate() {
                if award.title.is_empty() {
                    errors.push(FieldError::new(
                        format!("awards[{i}].title"),
                        "Award title is required",
                    ));
                }
            }
        }
        SectionKind::References => {
            for (i, reference) in doc.references.iter().enumerate() {
                let field = |name: &str| format!("references[{i}].{name}");
                if reference.name.is_empty() {
                    errors.push(FieldError::new(field("name"), "Name is required"));
                }
                if reference.title.is_empty() {
                    errors.push(FieldError::new(field("title"), "Title is required"));
                }
                if reference.organization.is_empty() {
                    errors.push(FieldError::new(
                        field("organization"),
                        "Organization is required",
                    ));
                }
                if reference.email.is_empty() || !is_valid_email(&reference.email) {
                    errors.push(FieldError::new(field("email"), "A valid email is required"));
                }
            }
        }
        SectionKind::Template | SectionKind::Review => {}
    }
    errors
}

/// Whether a section satisfies its completeness rules: every required field
/// present and every entry individually valid.
pub fn is_section_complete(doc: &CVDocument, kind: SectionKind) -> bool {
    let valid = validate_section(doc, kind).is_empty();
    match kind {
        SectionKind::PersonalInfo => valid,
        SectionKind::Experience => valid && !doc.experience.is_empty(),
        SectionKind::Education => valid && !doc.education.is_empty(),
        SectionKind::Skills => {
            valid && (!doc.skills.technical.is_empty() || !doc.skills.soft.is_empty())
        }
        SectionKind::Template => doc.template.is_some(),
        SectionKind::Review => true,
        _ => valid,
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExperienceEntry, ProjectEntry, ReferenceEntry, SkillItem};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn experience(start: &str, end: Option<&str>, current: bool) -> ExperienceEntry {
        ExperienceEntry {
            id: Uuid::new_v4(),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: String::new(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").ok(),
            end_date: end.and_then(|e| NaiveDate::parse_from_str(e, "%Y-%m-%d").ok()),
            is_current_job: current,
            responsibilities: vec![],
            achievements: vec![],
        }
    }

    #[test]
    fn test_personal_info_requires_name_and_email() {
        let doc = CVDocument::default();
        let errors = validate_section(&doc, SectionKind::PersonalInfo);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"lastName"));
        assert!(fields.contains(&"email"));
    }

    #[test]
    fn test_malformed_email_is_flagged() {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace".to_string();
        doc.personal_info.email = "not-an-email".to_string();
        let errors = validate_section(&doc, SectionKind::PersonalInfo);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn test_end_date_while_current_is_rejected() {
        let mut doc = CVDocument::default();
        doc.experience
            .push(experience("2020-01-01", Some("2022-01-01"), true));
        let errors = validate_section(&doc, SectionKind::Experience);
        assert!(errors
            .iter()
            .any(|e| e.message.contains("current position")));
    }

    #[test]
    fn test_end_date_before_start_is_rejected() {
        let mut doc = CVDocument::default();
        doc.experience
            .push(experience("2022-01-01", Some("2020-01-01"), false));
        let errors = validate_section(&doc, SectionKind::Experience);
        assert!(errors.iter().any(|e| e.message.contains("precede")));
    }

    #[test]
    fn test_valid_current_experience_passes() {
        let mut doc = CVDocument::default();
        doc.experience.push(experience("2020-01-01", None, true));
        assert!(validate_section(&doc, SectionKind::Experience).is_empty());
        assert!(is_section_complete(&doc, SectionKind::Experience));
    }

    #[test]
    fn test_empty_experience_is_valid_but_incomplete() {
        let doc = CVDocument::default();
        assert!(validate_section(&doc, SectionKind::Experience).is_empty());
        assert!(!is_section_complete(&doc, SectionKind::Experience));
    }

    #[test]
    fn test_duplicate_technologies_are_flagged() {
        let mut doc = CVDocument::default();
        doc.projects.push(ProjectEntry {
            id: Uuid::new_v4(),
            name: "Engine".to_string(),
            role: String::new(),
            description: String::new(),
            technologies: vec!["Rust".to_string(), "rust".to_string()],
            start_date: None,
            end_date: None,
            is_ongoing: false,
            achievements: vec![],
            links: vec![],
        });
        let errors = validate_section(&doc, SectionKind::Projects);
        assert!(errors.iter().any(|e| e.message.contains("Duplicate")));
    }

    #[test]
    fn test_reference_requires_contact_fields() {
        let mut doc = CVDocument::default();
        doc.references.push(ReferenceEntry {
            id: Uuid::new_v4(),
            name: "Charles Babbage".to_string(),
            title: String::new(),
            organization: String::new(),
            email: "charles@engines.example".to_string(),
            phone: None,
            relationship: None,
        });
        let errors = validate_section(&doc, SectionKind::References);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"references[0].title"));
        assert!(fields.contains(&"references[0].organization"));
    }

    #[test]
    fn test_skills_completeness_needs_technical_or_soft() {
        let mut doc = CVDocument::default();
        assert!(!is_section_complete(&doc, SectionKind::Skills));
        doc.skills.soft.push(SkillItem {
            name: "Communication".to_string(),
            proficiency: None,
        });
        assert!(is_section_complete(&doc, SectionKind::Skills));
    }

    #[test]
    fn test_template_completeness_tracks_selection() {
        let mut doc = CVDocument::default();
        assert!(!is_section_complete(&doc, SectionKind::Template));
        doc.template = Some(crate::model::TemplateSelection {
            template_id: "modern-1".to_string(),
            style: crate::model::TemplateStyle::Modern,
            color: "blue".to_string(),
        });
        assert!(is_section_complete(&doc, SectionKind::Template));
    }
}
