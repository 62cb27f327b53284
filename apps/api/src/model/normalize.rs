//! Normalization boundary between historical/alternate document shapes and
//! the canonical schema.
//!
//! This is the ONLY place that understands legacy shapes (flat skills arrays,
//! `experiences` vs `experience` naming, numeric proficiency levels, loose
//! date strings). Everything past this function speaks the canonical schema.
//!
//! # Contract
//! - Total: never fails. Missing optional sections become empty collections,
//!   unparseable values become their empty/None equivalents.
//! - Idempotent: `normalize(to_json(normalize(x))) == normalize(x)`.
//! - Deterministic: items without an id get a UUIDv5 derived from the section
//!   key, index, and primary text — the same raw input always yields the same
//!   document.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{
    AwardEntry, CVDocument, CertificationEntry, EducationEntry, ExperienceEntry, LanguageEntry,
    LanguageProficiency, PersonalInfo, ProjectEntry, ReferenceEntry, SkillItem, Skills,
    TemplateSelection, TemplateStyle,
};

/// Numeric legacy skill levels (1–5) map to these labels.
const LEVEL_LABELS: [&str; 5] = ["Beginner", "Basic", "Intermediate", "Advanced", "Expert"];

/// Folds any historical draft shape into a canonical `CVDocument`.
pub fn normalize(raw: &Value) -> CVDocument {
    let Some(obj) = raw.as_object() else {
        return CVDocument::default();
    };

    let experience_raw = obj
        .get("experience")
        .or_else(|| obj.get("experiences"))
        .cloned()
        .unwrap_or(Value::Null);

    CVDocument {
        personal_info: normalize_personal(obj.get("personalInfo")),
        experience: entries(&experience_raw, normalize_experience),
        education: entries(&field(obj, "education"), normalize_education),
        skills: normalize_skills(obj.get("skills")),
        languages: entries(&field(obj, "languages"), normalize_language),
        projects: entries(&field(obj, "projects"), normalize_project),
        certifications: entries(&field(obj, "certifications"), normalize_certification),
        awards: entries(&field(obj, "awards"), normalize_award),
        references: entries(&field(obj, "references"), normalize_reference),
        template: normalize_template(obj.get("template").or_else(|| obj.get("templateSelection"))),
    }
}

fn field(obj: &serde_json::Map<String, Value>, key: &str) -> Value {
    obj.get(key).cloned().unwrap_or(Value::Null)
}

fn entries<T>(raw: &Value, f: impl Fn(usize, &serde_json::Map<String, Value>) -> T) -> Vec<T> {
    match raw.as_array() {
        Some(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_object().map(|o| f(i, o)))
            .collect(),
        None => Vec::new(),
    }
}

fn normalize_personal(raw: Option<&Value>) -> PersonalInfo {
    let Some(obj) = raw.and_then(Value::as_object) else {
        return PersonalInfo::default();
    };
    PersonalInfo {
        first_name: text(obj, &["firstName"]),
        last_name: text(obj, &["lastName"]),
        email: text(obj, &["email"]),
        phone: text(obj, &["phone"]),
        location: text(obj, &["location"]),
        professional_summary: text(obj, &["professionalSummary", "summary"]),
        linkedin_url: text(obj, &["linkedinUrl", "linkedin"]),
        portfolio_url: text(obj, &["portfolioUrl", "website", "portfolio"]),
    }
}

fn normalize_experience(index: usize, obj: &serde_json::Map<String, Value>) -> ExperienceEntry {
    let job_title = text(obj, &["jobTitle", "title", "position"]);
    let company = text(obj, &["company", "organization"]);
    let is_current_job = flag(obj, &["isCurrentJob", "isCurrentRole", "current"]);
    ExperienceEntry {
        id: item_id(obj, "experience", index, &job_title, &company),
        start_date: date(obj, &["startDate"]),
        // Ongoing wins: an end date on a current position is never kept.
        end_date: if is_current_job {
            None
        } else {
            date(obj, &["endDate"])
        },
        is_current_job,
        location: text(obj, &["location"]),
        responsibilities: text_list(obj.get("responsibilities")),
        achievements: text_list(obj.get("achievements")),
        job_title,
        company,
    }
}

fn normalize_education(index: usize, obj: &serde_json::Map<String, Value>) -> EducationEntry {
    let degree = text(obj, &["degree"]);
    let institution = text(obj, &["institution", "school"]);
    EducationEntry {
        id: item_id(obj, "education", index, &degree, &institution),
        location: text(obj, &["location"]),
        graduation_date: date(obj, &["graduationDate", "endDate"]),
        gpa: scalar_text(obj.get("gpa")),
        relevant_courses: text_list(obj.get("relevantCourses").or_else(|| obj.get("courses"))),
        degree,
        institution,
    }
}

fn normalize_skills(raw: Option<&Value>) -> Skills {
    match raw {
        // Legacy flat list: items tagged with a `category` field.
        Some(Value::Array(items)) => {
            let mut skills = Skills::default();
            for item in items {
                let Some(parsed) = skill_item(item) else {
                    continue;
                };
                let category = item
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or("technical")
                    .to_lowercase();
                let bucket = match category.as_str() {
                    "soft" => &mut skills.soft,
                    "language" | "languages" => &mut skills.languages,
                    // `other` and anything unrecognized folds into technical;
                    // three buckets are canonical and nothing may be dropped.
                    _ => &mut skills.technical,
                };
                push_unique(bucket, parsed);
            }
            skills
        }
        Some(Value::Object(obj)) => {
            let bucket = |key: &str| {
                let mut items = Vec::new();
                if let Some(list) = obj.get(key).and_then(Value::as_array) {
                    for item in list {
                        if let Some(parsed) = skill_item(item) {
                            push_unique(&mut items, parsed);
                        }
                    }
                }
                items
            };
            Skills {
                technical: bucket("technical"),
                soft: bucket("soft"),
                languages: bucket("languages"),
            }
        }
        _ => Skills::default(),
    }
}

fn skill_item(raw: &Value) -> Option<SkillItem> {
    match raw {
        Value::String(name) if !name.trim().is_empty() => Some(SkillItem {
            name: name.trim().to_string(),
            proficiency: None,
        }),
        Value::Object(obj) => {
            let name = text(obj, &["name"]);
            if name.is_empty() {
                return None;
            }
            let proficiency = scalar_text(obj.get("proficiency")).or_else(|| {
                obj.get("level")
                    .and_then(Value::as_u64)
                    .and_then(|level| LEVEL_LABELS.get(level.saturating_sub(1) as usize))
                    .map(|label| label.to_string())
            });
            Some(SkillItem { name, proficiency })
        }
        _ => None,
    }
}

fn push_unique(bucket: &mut Vec<SkillItem>, item: SkillItem) {
    let lower = item.name.to_lowercase();
    if !bucket.iter().any(|s| s.name.to_lowercase() == lower) {
        bucket.push(item);
    }
}

fn normalize_language(index: usize, obj: &serde_json::Map<String, Value>) -> LanguageEntry {
    let name = text(obj, &["name", "language"]);
    LanguageEntry {
        id: item_id(obj, "language", index, &name, ""),
        proficiency: language_proficiency(obj.get("proficiency")),
        certification: scalar_text(obj.get("certification")),
        name,
    }
}

fn language_proficiency(raw: Option<&Value>) -> LanguageProficiency {
    match raw
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "beginner" | "basic" => LanguageProficiency::Beginner,
        "advanced" | "proficient" => LanguageProficiency::Advanced,
        "fluent" => LanguageProficiency::Fluent,
        "native" => LanguageProficiency::Native,
        // Totality over strictness: unknown labels land mid-scale.
        _ => LanguageProficiency::Intermediate,
    }
}

fn normalize_project(index: usize, obj: &serde_json::Map<String, Value>) -> ProjectEntry {
    let name = text(obj, &["name", "title"]);
    let is_ongoing = flag(obj, &["isOngoing", "ongoing"]);

    let mut technologies: Vec<String> = Vec::new();
    match obj.get("technologies") {
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(tech) = item.as_str().map(str::trim).filter(|t| !t.is_empty()) {
                    if !technologies.iter().any(|t| t.eq_ignore_ascii_case(tech)) {
                        technologies.push(tech.to_string());
                    }
                }
            }
        }
        Some(Value::String(joined)) => {
            for tech in joined.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                if !technologies.iter().any(|t| t.eq_ignore_ascii_case(tech)) {
                    technologies.push(tech.to_string());
                }
            }
        }
        _ => {}
    }

    let mut links = text_list(obj.get("links"));
    for key in ["projectUrl", "link", "url"] {
        if let Some(url) = obj.get(key).and_then(Value::as_str) {
            let url = url.trim();
            if !url.is_empty() && !links.iter().any(|l| l == url) {
                links.push(url.to_string());
            }
        }
    }

    ProjectEntry {
        id: item_id(obj, "project", index, &name, ""),
        role: text(obj, &["role"]),
        description: text(obj, &["description"]),
        start_date: date(obj, &["startDate"]),
        end_date: if is_ongoing {
            None
        } else {
            date(obj, &["endDate"])
        },
        is_ongoing,
        achievements: text_list(obj.get("achievements")),
        technologies,
        links,
        name,
    }
}

fn normalize_certification(index: usize, obj: &serde_json::Map<String, Value>) -> CertificationEntry {
    let name = text(obj, &["name"]);
    let issuer = text(obj, &["issuer", "issuingOrganization"]);
    CertificationEntry {
        id: item_id(obj, "certification", index, &name, &issuer),
        issue_date: date(obj, &["issueDate", "date"]),
        expiry_date: date(obj, &["expiryDate"]),
        name,
        issuer,
    }
}

fn normalize_award(index: usize, obj: &serde_json::Map<String, Value>) -> AwardEntry {
    let title = text(obj, &["title", "name"]);
    let issuer = text(obj, &["issuer"]);
    AwardEntry {
        id: item_id(obj, "award", index, &title, &issuer),
        date: date(obj, &["date"]),
        description: scalar_text(obj.get("description")),
        title,
        issuer,
    }
}

fn normalize_reference(index: usize, obj: &serde_json::Map<String, Value>) -> ReferenceEntry {
    let name = text(obj, &["name"]);
    let organization = text(obj, &["organization", "company"]);
    ReferenceEntry {
        id: item_id(obj, "reference", index, &name, &organization),
        title: text(obj, &["title", "position"]),
        email: text(obj, &["email"]),
        phone: scalar_text(obj.get("phone")),
        relationship: scalar_text(obj.get("relationship")),
        name,
        organization,
    }
}

fn normalize_template(raw: Option<&Value>) -> Option<TemplateSelection> {
    let obj = raw.and_then(Value::as_object)?;
    let template_id = text(obj, &["templateId", "id"]);
    if template_id.is_empty() {
        return None;
    }
    let style = obj
        .get("style")
        .and_then(Value::as_str)
        .or_else(|| template_id.split('-').next())
        .map(parse_style)
        .unwrap_or(TemplateStyle::Modern);
    let color = {
        let c = text(obj, &["color"]);
        if c.is_empty() {
            "blue".to_string()
        } else {
            c
        }
    };
    Some(TemplateSelection {
        template_id,
        style,
        color,
    })
}

fn parse_style(raw: &str) -> TemplateStyle {
    match raw.to_lowercase().as_str() {
        "classic" => TemplateStyle::Classic,
        "creative" => TemplateStyle::Creative,
        "minimal" => TemplateStyle::Minimal,
        _ => TemplateStyle::Modern,
    }
}

// ── scalar helpers ──────────────────────────────────────────────────────────

/// First non-empty string among the given keys, trimmed.
fn text(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            let s = s.trim();
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }
    String::new()
}

/// A string or number rendered as trimmed text; None when absent or empty.
fn scalar_text(raw: Option<&Value>) -> Option<String> {
    match raw {
        Some(Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| obj.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

fn text_list(raw: Option<&Value>) -> Vec<String> {
    match raw.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM` (day defaults to 01), or an RFC3339
/// timestamp (date part). Anything else is None.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some((year, month)) = raw.split_once('-') {
        if let (Ok(y), Ok(m)) = (year.parse::<i32>(), month.parse::<u32>()) {
            if let Some(d) = NaiveDate::from_ymd_opt(y, m, 1) {
                return Some(d);
            }
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive())
}

fn date(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str).and_then(parse_date))
}

/// A present id is preserved; a missing one is derived deterministically so
/// normalization stays a pure function.
fn item_id(
    obj: &serde_json::Map<String, Value>,
    section: &str,
    index: usize,
    primary: &str,
    secondary: &str,
) -> Uuid {
    if let Some(id) = obj
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        return id;
    }
    let seed = format!("{section}:{index}:{primary}:{secondary}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_draft() -> Value {
        json!({
            "personalInfo": {
                "firstName": "  Ada ",
                "lastName": "Lovelace",
                "email": "ada@x.com",
                "linkedin": "https://linkedin.com/in/ada"
            },
            "experiences": [{
                "title": "Lead Engineer",
                "organization": "Analytical Engines Ltd",
                "startDate": "2020-01",
                "endDate": "2023-06-30",
                "isCurrentRole": true,
                "responsibilities": ["Built the engine", "", "  "],
                "achievements": ["Shipped v1"]
            }],
            "skills": [
                { "name": "Rust", "category": "Technical", "level": 5 },
                { "name": "Mentoring", "category": "Soft" },
                { "name": "French", "category": "Language", "level": 3 },
                { "name": "Gardening", "category": "Other" },
                { "name": "rust", "category": "technical" }
            ],
            "projects": [{
                "title": "Difference Engine",
                "technologies": "Brass, Steam, brass",
                "projectUrl": "https://example.com/engine",
                "isOngoing": true,
                "endDate": "2024-01-01"
            }],
            "certifications": [{
                "name": "Chartered Engineer",
                "issuingOrganization": "Royal Society",
                "date": "2021-05-10"
            }],
            "template": { "id": "classic-1", "color": "gray" }
        })
    }

    #[test]
    fn test_normalize_is_total_on_junk() {
        assert_eq!(normalize(&Value::Null), CVDocument::default());
        assert_eq!(normalize(&json!([1, 2, 3])), CVDocument::default());
        assert_eq!(normalize(&json!({"skills": 42})), CVDocument::default());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&legacy_draft());
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_experiences_alias_and_field_fallbacks() {
        let doc = normalize(&legacy_draft());
        assert_eq!(doc.experience.len(), 1);
        let exp = &doc.experience[0];
        assert_eq!(exp.job_title, "Lead Engineer");
        assert_eq!(exp.company, "Analytical Engines Ltd");
        assert_eq!(exp.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn test_ongoing_entry_never_keeps_end_date() {
        let doc = normalize(&legacy_draft());
        let exp = &doc.experience[0];
        assert!(exp.is_current_job);
        assert_eq!(exp.end_date, None);

        let project = &doc.projects[0];
        assert!(project.is_ongoing);
        assert_eq!(project.end_date, None);
    }

    #[test]
    fn test_flat_skills_fold_into_buckets_without_loss() {
        let doc = normalize(&legacy_draft());
        // "Rust" + duplicate "rust" collapse to one; "Gardening" (other) folds
        // into technical. 5 raw items → 4 bucketed, nothing invented.
        assert_eq!(doc.skills.technical.len(), 2);
        assert_eq!(doc.skills.soft.len(), 1);
        assert_eq!(doc.skills.languages.len(), 1);
        assert_eq!(doc.skills.technical[0].name, "Rust");
        assert_eq!(
            doc.skills.technical[0].proficiency.as_deref(),
            Some("Expert")
        );
        assert_eq!(
            doc.skills.languages[0].proficiency.as_deref(),
            Some("Intermediate")
        );
    }

    #[test]
    fn test_bucketed_skills_pass_through() {
        let raw = json!({
            "skills": {
                "technical": [{ "name": "Rust", "proficiency": "Expert" }],
                "soft": ["Communication"],
                "languages": []
            }
        });
        let doc = normalize(&raw);
        assert_eq!(doc.skills.technical.len(), 1);
        assert_eq!(doc.skills.soft[0].name, "Communication");
        assert!(doc.skills.languages.is_empty());
    }

    #[test]
    fn test_technology_tags_are_a_set() {
        let doc = normalize(&legacy_draft());
        assert_eq!(doc.projects[0].technologies, vec!["Brass", "Steam"]);
    }

    #[test]
    fn test_empty_strings_are_dropped_from_lists() {
        let doc = normalize(&legacy_draft());
        assert_eq!(doc.experience[0].responsibilities, vec!["Built the engine"]);
    }

    #[test]
    fn test_missing_ids_are_deterministic() {
        let a = normalize(&legacy_draft());
        let b = normalize(&legacy_draft());
        assert_eq!(a.experience[0].id, b.experience[0].id);
        assert_eq!(a.projects[0].id, b.projects[0].id);
    }

    #[test]
    fn test_existing_ids_are_preserved() {
        let id = Uuid::new_v4();
        let raw = json!({ "awards": [{ "id": id.to_string(), "title": "Gold" }] });
        assert_eq!(normalize(&raw).awards[0].id, id);
    }

    #[test]
    fn test_certification_issuer_alias() {
        let doc = normalize(&legacy_draft());
        assert_eq!(doc.certifications[0].issuer, "Royal Society");
        assert_eq!(
            doc.certifications[0].issue_date,
            NaiveDate::from_ymd_opt(2021, 5, 10)
        );
    }

    #[test]
    fn test_template_style_inferred_from_id() {
        let doc = normalize(&legacy_draft());
        let template = doc.template.unwrap();
        assert_eq!(template.template_id, "classic-1");
        assert_eq!(template.style, TemplateStyle::Classic);
        assert_eq!(template.color, "gray");
    }

    #[test]
    fn test_rfc3339_timestamps_take_date_part() {
        let raw = json!({
            "awards": [{ "title": "Gold", "date": "2022-11-05T10:30:00Z" }]
        });
        assert_eq!(
            normalize(&raw).awards[0].date,
            NaiveDate::from_ymd_opt(2022, 11, 5)
        );
    }
}
