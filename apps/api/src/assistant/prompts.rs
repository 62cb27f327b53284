//! Prompt contexts for the content assistant.
//!
//! A context is a structured, pre-built slice of the document — never a raw
//! document dump — so prompts stay deterministic and bounded in size. Each
//! builder picks out only the fields relevant to its section.

use crate::model::{CVDocument, ExperienceEntry, ProjectEntry, SectionKind};

/// Caps list material included in any prompt.
const MAX_CONTEXT_ITEMS: usize = 5;

#[derive(Debug, Clone)]
pub struct PromptContext {
    pub section: SectionKind,
    pub prompt: String,
}

impl PromptContext {
    pub fn section_key(&self) -> &'static str {
        self.section.key()
    }
}

/// Context for writing the professional summary: name, position count,
/// degrees, and skill names — nothing else.
pub fn summary_context(doc: &CVDocument) -> PromptContext {
    let degrees: Vec<&str> = doc
        .education
        .iter()
        .map(|e| e.degree.as_str())
        .filter(|d| !d.is_empty())
        .take(MAX_CONTEXT_ITEMS)
        .collect();
    let skills: Vec<&str> = doc
        .skills
        .technical
        .iter()
        .chain(doc.skills.soft.iter())
        .map(|s| s.name.as_str())
        .take(MAX_CONTEXT_ITEMS * 2)
        .collect();

    let prompt = format!(
        "Create a compelling professional summary for a job seeker with the following profile:\n\n\
         Name: {}\n\
         Experience: {} positions\n\
         Education: {}\n\
         Skills: {}\n\n\
         Create a 2-3 sentence professional summary that highlights their key strengths, \
         experience, and value proposition. Make it compelling and tailored to their background.",
        doc.personal_info.full_name(),
        doc.experience.len(),
        if degrees.is_empty() {
            "Not specified".to_string()
        } else {
            degrees.join(", ")
        },
        if skills.is_empty() {
            "Various skills".to_string()
        } else {
            skills.join(", ")
        },
    );

    PromptContext {
        section: SectionKind::PersonalInfo,
        prompt,
    }
}

/// Context for generating measurable achievement bullets for one experience
/// entry.
pub fn achievements_context(entry: &ExperienceEntry) -> PromptContext {
    let responsibilities = entry
        .responsibilities
        .iter()
        .take(MAX_CONTEXT_ITEMS)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Generate 3-4 measurable achievements for a {} at {} with these responsibilities:\n{}\n\n\
         Make achievements specific, quantifiable, and impactful. Use metrics, percentages, \
         or concrete outcomes where possible. Return one achievement per line.",
        entry.job_title, entry.company, responsibilities,
    );

    PromptContext {
        section: SectionKind::Experience,
        prompt,
    }
}

/// Context for rewriting a project description.
pub fn project_description_context(project: &ProjectEntry) -> PromptContext {
    let prompt = format!(
        "Improve this project description to be more professional, impactful, and compelling:\n\n\
         Project: {}\n\
         Technologies: {}\n\
         Original: {}\n\n\
         Provide an improved version that is more specific, action-oriented, and quantifiable \
         where possible.",
        project.name,
        project
            .technologies
            .iter()
            .take(MAX_CONTEXT_ITEMS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        project.description,
    );

    PromptContext {
        section: SectionKind::Projects,
        prompt,
    }
}
