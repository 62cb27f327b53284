//! Template renderer — pure mapping from `(CVDocument, TemplateSelection)` to
//! an abstract, format-agnostic render tree.
//!
//! Sections with no content are omitted entirely — never rendered as an empty
//! heading. Section ordering is fixed here and preserved verbatim by every
//! export writer.

pub mod dates;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{CVDocument, ExpiryStatus, SectionKind, TemplateSelection, TemplateStyle};
use crate::render::dates::{format_date_range, format_month_year};

/// Style metadata derived from the template selection; the only thing the
/// export writers know about visual styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleToken {
    pub style: TemplateStyle,
    pub color: String,
    pub hex: String,
}

/// Maps the catalog's color names to concrete hex values.
pub fn color_hex(color: &str) -> &'static str {
    match color {
        "gray" => "#757575",
        "purple" => "#9c27b0",
        "green" => "#388e3c",
        "orange" => "#f57c00",
        "navy" => "#1a237e",
        _ => "#1976d2", // blue, and the fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletGroup {
    pub label: Option<String>,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderItem {
    /// Document header: full name plus joined contact fields.
    Header { name: String, contact: Vec<String> },
    /// Free-flowing text (the professional summary).
    Paragraph { text: String },
    /// A dated entry: experience, education, project, certification, award,
    /// reference. `meta` lines render below the date line, unstyled.
    Entry {
        title: String,
        subtitle: Option<String>,
        date_line: Option<String>,
        meta: Vec<String>,
        bullet_groups: Vec<BulletGroup>,
    },
    /// `Label: text` single line (skills buckets).
    LabeledLine { label: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBlock {
    pub section: SectionKind,
    pub heading: Option<String>,
    pub style: StyleToken,
    pub items: Vec<RenderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTree {
    pub blocks: Vec<SectionBlock>,
}

impl RenderTree {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Builds the render tree. Pure: same document + template + `today` always
/// produce the same tree (`today` only feeds certification expiry labels).
pub fn build_render_tree(
    doc: &CVDocument,
    template: &TemplateSelection,
    today: NaiveDate,
) -> RenderTree {
    let style = StyleToken {
        style: template.style,
        color: template.color.clone(),
        hex: color_hex(&template.color).to_string(),
    };
    let block = |section: SectionKind, heading: Option<&str>, items: Vec<RenderItem>| SectionBlock {
        section,
        heading: heading.map(str::to_string),
        style: style.clone(),
        items,
    };

    let mut blocks = Vec::new();

    // Header is emitted whenever a name or email exists.
    let info = &doc.personal_info;
    let name = info.full_name();
    if !name.is_empty() || !info.email.is_empty() {
        let contact: Vec<String> = [
            &info.email,
            &info.phone,
            &info.location,
            &info.linkedin_url,
            &info.portfolio_url,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect();
        blocks.push(block(
            SectionKind::PersonalInfo,
            None,
            vec![RenderItem::Header { name, contact }],
        ));
    }

    if !info.professional_summary.is_empty() {
        blocks.push(block(
            SectionKind::PersonalInfo,
            Some("Professional Summary"),
            vec![RenderItem::Paragraph {
                text: info.professional_summary.clone(),
            }],
        ));
    }

    if !doc.experience.is_empty() {
        let items = doc
            .experience
            .iter()
            .map(|exp| {
                let mut bullet_groups = Vec::new();
                if !exp.responsibilities.is_empty() {
                    bullet_groups.push(BulletGroup {
                        label: Some("Key Responsibilities:".to_string()),
                        bullets: exp.responsibilities.clone(),
                    });
                }
                if !exp.achievements.is_empty() {
                    bullet_groups.push(BulletGroup {
                        label: Some("Key Achievements:".to_string()),
                        bullets: exp.achievements.clone(),
                    });
                }
                RenderItem::Entry {
                    title: exp.job_title.clone(),
                    subtitle: subtitle(&exp.company, &exp.location),
                    date_line: non_empty(format_date_range(
                        exp.start_date,
                        exp.end_date,
                        exp.is_current_job,
                    )),
                    meta: vec![],
                    bullet_groups,
                }
            })
            .collect();
        blocks.push(block(
            SectionKind::Experience,
            Some("Professional Experience"),
            items,
        ));
    }

    if !doc.education.is_empty() {
        let items = doc
            .education
            .iter()
            .map(|edu| {
                let mut meta = Vec::new();
                if let Some(gpa) = &edu.gpa {
                    meta.push(format!("GPA: {gpa}"));
                }
                if !edu.relevant_courses.is_empty() {
                    meta.push(format!(
                        "Relevant Courses: {}",
                        edu.relevant_courses.join(", ")
                    ));
                }
                RenderItem::Entry {
                    title: edu.degree.clone(),
                    subtitle: subtitle(&edu.institution, &edu.location),
                    date_line: edu.graduation_date.map(format_month_year),
                    meta,
                    bullet_groups: vec![],
                }
            })
            .collect();
        blocks.push(block(SectionKind::Education, Some("Education"), items));
    }

    if !doc.skills.is_empty() {
        let mut items = Vec::new();
        if !doc.skills.technical.is_empty() {
            items.push(RenderItem::LabeledLine {
                label: "Technical Skills".to_string(),
                text: join_skills(&doc.skills.technical),
            });
        }
        if !doc.skills.soft.is_empty() {
            items.push(RenderItem::LabeledLine {
                label: "Soft Skills".to_string(),
                text: join_skills(&doc.skills.soft),
            });
        }
        // The bucket line renders only when the dedicated languages section is
        // empty, so languages never show up twice.
        if doc.languages.is_empty() && !doc.skills.languages.is_empty() {
            items.push(RenderItem::LabeledLine {
                label: "Languages".to_string(),
                text: doc
                    .skills
                    .languages
                    .iter()
                    .map(|s| match &s.proficiency {
                        Some(p) => format!("{} ({p})", s.name),
                        None => s.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(" • "),
            });
        }
        if !items.is_empty() {
            blocks.push(block(SectionKind::Skills, Some("Core Competencies"), items));
        }
    }

    if !doc.languages.is_empty() {
        let items = doc
            .languages
            .iter()
            .map(|lang| RenderItem::LabeledLine {
                label: lang.name.clone(),
                text: match &lang.certification {
                    Some(cert) => format!("{} • {cert}", lang.proficiency.label()),
                    None => lang.proficiency.label().to_string(),
                },
            })
            .collect();
        blocks.push(block(SectionKind::Languages, Some("Languages"), items));
    }

    if !doc.projects.is_empty() {
        let items = doc
            .projects
            .iter()
            .map(|project| {
                let mut meta = Vec::new();
                if !project.description.is_empty() {
                    meta.push(project.description.clone());
                }
                if !project.technologies.is_empty() {
                    meta.push(format!("Technologies: {}", project.technologies.join(", ")));
                }
                for link in &project.links {
                    meta.push(link.clone());
                }
                let bullet_groups = if project.achievements.is_empty() {
                    vec![]
                } else {
                    vec![BulletGroup {
                        label: None,
                        bullets: project.achievements.clone(),
                    }]
                };
                RenderItem::Entry {
                    title: project.name.clone(),
                    subtitle: non_empty(project.role.clone()),
                    date_line: non_empty(format_date_range(
                        project.start_date,
                        project.end_date,
                        project.is_ongoing,
                    )),
                    meta,
                    bullet_groups,
                }
            })
            .collect();
        blocks.push(block(SectionKind::Projects, Some("Projects"), items));
    }

    if !doc.certifications.is_empty() {
        let items = doc
            .certifications
            .iter()
            .map(|cert| {
                let mut meta = Vec::new();
                if let Some(expiry) = cert.expiry_date {
                    let label = match cert.expiry_status(today) {
                        ExpiryStatus::Expired => "Expired",
                        ExpiryStatus::ExpiringSoon => "Expires soon",
                        ExpiryStatus::Active => "Expires",
                    };
                    meta.push(format!("{label}: {}", format_month_year(expiry)));
                }
                RenderItem::Entry {
                    title: cert.name.clone(),
                    subtitle: non_empty(cert.issuer.clone()),
                    date_line: cert.issue_date.map(format_month_year),
                    meta,
                    bullet_groups: vec![],
                }
            })
            .collect();
        blocks.push(block(
            SectionKind::Certifications,
            Some("Certifications"),
            items,
        ));
    }

    if !doc.awards.is_empty() {
        let items = doc
            .awards
            .iter()
            .map(|award| RenderItem::Entry {
                title: award.title.clone(),
                subtitle: non_empty(award.issuer.clone()),
                date_line: award.date.map(format_month_year),
                meta: award.description.clone().into_iter().collect(),
                bullet_groups: vec![],
            })
            .collect();
        blocks.push(block(SectionKind::Awards, Some("Awards"), items));
    }

    if !doc.references.is_empty() {
        let items = doc
            .references
            .iter()
            .map(|reference| {
                let mut meta: Vec<String> = Vec::new();
                let contact: Vec<&str> = [reference.email.as_str()]
                    .into_iter()
                    .chain(reference.phone.as_deref())
                    .filter(|s| !s.is_empty())
                    .collect();
                if !contact.is_empty() {
                    meta.push(contact.join(" • "));
                }
                if let Some(relationship) = &reference.relationship {
                    meta.push(format!("Relationship: {relationship}"));
                }
                RenderItem::Entry {
                    title: reference.name.clone(),
                    subtitle: subtitle(&reference.title, &reference.organization),
                    date_line: None,
                    meta,
                    bullet_groups: vec![],
                }
            })
            .collect();
        blocks.push(block(SectionKind::References, Some("References"), items));
    }

    RenderTree { blocks }
}

fn subtitle(primary: &str, secondary: &str) -> Option<String> {
    match (primary.is_empty(), secondary.is_empty()) {
        (true, true) => None,
        (false, true) => Some(primary.to_string()),
        (true, false) => Some(secondary.to_string()),
        (false, false) => Some(format!("{primary} • {secondary}")),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn join_skills(items: &[crate::model::SkillItem]) -> String {
    items
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AwardEntry, ExperienceEntry, LanguageEntry, LanguageProficiency, SkillItem,
    };
    use uuid::Uuid;

    fn template() -> TemplateSelection {
        TemplateSelection {
            template_id: "modern-1".to_string(),
            style: TemplateStyle::Modern,
            color: "blue".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn ada_doc() -> CVDocument {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace".to_string();
        doc.personal_info.email = "ada@x.com".to_string();
        doc.experience.push(ExperienceEntry {
            id: Uuid::new_v4(),
            job_title: "Lead Engineer".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            location: String::new(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: None,
            is_current_job: true,
            responsibilities: vec!["Designed the mill".to_string()],
            achievements: vec![],
        });
        doc
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let tree = build_render_tree(&ada_doc(), &template(), today());
        let sections: Vec<SectionKind> = tree.blocks.iter().map(|b| b.section).collect();
        assert_eq!(sections, vec![SectionKind::PersonalInfo, SectionKind::Experience]);
        // no empty headings anywhere
        assert!(tree
            .blocks
            .iter()
            .all(|b| !b.items.is_empty()));
    }

    #[test]
    fn test_header_emitted_with_name_and_email() {
        let tree = build_render_tree(&ada_doc(), &template(), today());
        match &tree.blocks[0].items[0] {
            RenderItem::Header { name, contact } => {
                assert_eq!(name, "Ada Lovelace");
                assert_eq!(contact, &vec!["ada@x.com".to_string()]);
            }
            other => panic!("Expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_ongoing_experience_renders_present() {
        let tree = build_render_tree(&ada_doc(), &template(), today());
        let experience = &tree.blocks[1];
        match &experience.items[0] {
            RenderItem::Entry { date_line, .. } => {
                assert_eq!(date_line.as_deref(), Some("Jan 2020 - Present"));
            }
            other => panic!("Expected entry, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_section_order() {
        let mut doc = ada_doc();
        doc.personal_info.professional_summary = "Pioneer of computing.".to_string();
        doc.awards.push(AwardEntry {
            id: Uuid::new_v4(),
            title: "Gold Medal".to_string(),
            issuer: String::new(),
            date: None,
            description: None,
        });
        doc.skills.technical.push(SkillItem {
            name: "Analysis".to_string(),
            proficiency: None,
        });
        doc.languages.push(LanguageEntry {
            id: Uuid::new_v4(),
            name: "French".to_string(),
            proficiency: LanguageProficiency::Fluent,
            certification: None,
        });

        let tree = build_render_tree(&doc, &template(), today());
        let sections: Vec<SectionKind> = tree.blocks.iter().map(|b| b.section).collect();
        assert_eq!(
            sections,
            vec![
                SectionKind::PersonalInfo, // header
                SectionKind::PersonalInfo, // summary
                SectionKind::Experience,
                SectionKind::Skills,
                SectionKind::Languages,
                SectionKind::Awards,
            ]
        );
    }

    #[test]
    fn test_skills_language_bucket_suppressed_by_language_section() {
        let mut doc = ada_doc();
        doc.skills.languages.push(SkillItem {
            name: "French".to_string(),
            proficiency: Some("Advanced".to_string()),
        });
        doc.languages.push(LanguageEntry {
            id: Uuid::new_v4(),
            name: "French".to_string(),
            proficiency: LanguageProficiency::Fluent,
            certification: Some("DALF C1".to_string()),
        });

        let tree = build_render_tree(&doc, &template(), today());
        let skills_block = tree
            .blocks
            .iter()
            .find(|b| b.section == SectionKind::Skills);
        // Only the languages bucket was populated under skills, and it is
        // suppressed, so no skills block at all.
        assert!(skills_block.is_none());
        let languages = tree
            .blocks
            .iter()
            .find(|b| b.section == SectionKind::Languages)
            .unwrap();
        match &languages.items[0] {
            RenderItem::LabeledLine { label, text } => {
                assert_eq!(label, "French");
                assert_eq!(text, "Fluent • DALF C1");
            }
            other => panic!("Expected labeled line, got {other:?}"),
        }
    }

    #[test]
    fn test_style_token_hex_mapping() {
        let mut selection = template();
        selection.color = "navy".to_string();
        let tree = build_render_tree(&ada_doc(), &selection, today());
        assert_eq!(tree.blocks[0].style.hex, "#1a237e");
        assert_eq!(color_hex("unknown-color"), "#1976d2");
    }
}
