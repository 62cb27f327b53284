//! Canonical CV document schema.
//!
//! All wire shapes are camelCase to match the persisted draft record and the
//! external service contracts. Historical/alternate shapes never appear here —
//! they are folded into this schema by `normalize` and nowhere else.

pub mod normalize;
pub mod validation;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub professional_summary: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub job_title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current_job: bool,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: Uuid,
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub graduation_date: Option<NaiveDate>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub relevant_courses: Vec<String>,
}

/// One named skill inside a bucket. Proficiency is a free-form label
/// ("Advanced", "Expert", ...) — only the languages section uses a fixed scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillItem {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
}

/// The canonical bucketed skills shape. Legacy flat lists (items tagged with
/// a `category` field) are folded into these buckets by `normalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    pub technical: Vec<SkillItem>,
    pub soft: Vec<SkillItem>,
    pub languages: Vec<SkillItem>,
}

impl Skills {
    pub fn is_empty(&self) -> bool {
        self.technical.is_empty() && self.soft.is_empty() && self.languages.is_empty()
    }
}

/// Fixed ordered proficiency scale for the languages section.
/// Variant order IS the scale order — `Ord` is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageProficiency {
    Beginner,
    Intermediate,
    Advanced,
    Fluent,
    Native,
}

impl LanguageProficiency {
    pub fn label(&self) -> &'static str {
        match self {
            LanguageProficiency::Beginner => "Beginner",
            LanguageProficiency::Intermediate => "Intermediate",
            LanguageProficiency::Advanced => "Advanced",
            LanguageProficiency::Fluent => "Fluent",
            LanguageProficiency::Native => "Native",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub id: Uuid,
    pub name: String,
    pub proficiency: LanguageProficiency,
    #[serde(default)]
    pub certification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    /// Set semantics: no duplicates. `normalize` dedups (first occurrence
    /// wins), `validate_section` flags duplicates on direct updates.
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryStatus {
    Active,
    ExpiringSoon,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationEntry {
    pub id: Uuid,
    pub name: String,
    pub issuer: String,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl CertificationEntry {
    /// Expiry state relative to `today`. "Expiring soon" means within six
    /// months. Certifications without an expiry date are always active.
    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        match self.expiry_date {
            None => ExpiryStatus::Active,
            Some(expiry) if expiry <= today => ExpiryStatus::Expired,
            Some(expiry) if expiry <= today + Months::new(6) => ExpiryStatus::ExpiringSoon,
            Some(_) => ExpiryStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardEntry {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub organization: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    Modern,
    Classic,
    Creative,
    Minimal,
}

/// Consumed only by the renderer — carries no document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSelection {
    pub template_id: String,
    pub style: TemplateStyle,
    pub color: String,
}

/// The aggregate root: one résumé's full content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CVDocument {
    pub personal_info: PersonalInfo,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Skills,
    pub languages: Vec<LanguageEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub awards: Vec<AwardEntry>,
    pub references: Vec<ReferenceEntry>,
    pub template: Option<TemplateSelection>,
}

/// Addressable sections (and the review pseudo-step the wizard appends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    PersonalInfo,
    Experience,
    Education,
    Skills,
    Languages,
    Projects,
    Certifications,
    Awards,
    References,
    Template,
    Review,
}

impl SectionKind {
    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::PersonalInfo => "personal-info",
            SectionKind::Experience => "experience",
            SectionKind::Education => "education",
            SectionKind::Skills => "skills",
            SectionKind::Languages => "languages",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
            SectionKind::Awards => "awards",
            SectionKind::References => "references",
            SectionKind::Template => "template",
            SectionKind::Review => "review",
        }
    }
}

/// Full-replace update of exactly one top-level section. Updates never patch
/// inside a section — replacing the whole value keeps change detection simple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "kebab-case")]
pub enum SectionUpdate {
    PersonalInfo(PersonalInfo),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Skills(Skills),
    Languages(Vec<LanguageEntry>),
    Projects(Vec<ProjectEntry>),
    Certifications(Vec<CertificationEntry>),
    Awards(Vec<AwardEntry>),
    References(Vec<ReferenceEntry>),
    Template(TemplateSelection),
}

impl SectionUpdate {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionUpdate::PersonalInfo(_) => SectionKind::PersonalInfo,
            SectionUpdate::Experience(_) => SectionKind::Experience,
            SectionUpdate::Education(_) => SectionKind::Education,
            SectionUpdate::Skills(_) => SectionKind::Skills,
            SectionUpdate::Languages(_) => SectionKind::Languages,
            SectionUpdate::Projects(_) => SectionKind::Projects,
            SectionUpdate::Certifications(_) => SectionKind::Certifications,
            SectionUpdate::Awards(_) => SectionKind::Awards,
            SectionUpdate::References(_) => SectionKind::References,
            SectionUpdate::Template(_) => SectionKind::Template,
        }
    }
}

impl CVDocument {
    /// Replaces the value of exactly one top-level section.
    pub fn apply(&mut self, update: SectionUpdate) {
        match update {
            SectionUpdate::PersonalInfo(v) => self.personal_info = v,
            SectionUpdate::Experience(v) => self.experience = v,
            SectionUpdate::Education(v) => self.education = v,
            SectionUpdate::Skills(v) => self.skills = v,
            SectionUpdate::Languages(v) => self.languages = v,
            SectionUpdate::Projects(v) => self.projects = v,
            SectionUpdate::Certifications(v) => self.certifications = v,
            SectionUpdate::Awards(v) => self.awards = v,
            SectionUpdate::References(v) => self.references = v,
            SectionUpdate::Template(v) => self.template = Some(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(expiry: Option<NaiveDate>) -> CertificationEntry {
        CertificationEntry {
            id: Uuid::new_v4(),
            name: "AWS Solutions Architect".to_string(),
            issuer: "Amazon".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2022, 3, 1),
            expiry_date: expiry,
        }
    }

    #[test]
    fn test_proficiency_scale_is_ordered() {
        assert!(LanguageProficiency::Beginner < LanguageProficiency::Intermediate);
        assert!(LanguageProficiency::Advanced < LanguageProficiency::Fluent);
        assert!(LanguageProficiency::Fluent < LanguageProficiency::Native);
    }

    #[test]
    fn test_cert_without_expiry_is_active() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(cert(None).expiry_status(today), ExpiryStatus::Active);
    }

    #[test]
    fn test_cert_past_expiry_is_expired() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let c = cert(NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(c.expiry_status(today), ExpiryStatus::Expired);
    }

    #[test]
    fn test_cert_within_six_months_is_expiring_soon() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let c = cert(NaiveDate::from_ymd_opt(2026, 5, 1));
        assert_eq!(c.expiry_status(today), ExpiryStatus::ExpiringSoon);
    }

    #[test]
    fn test_cert_beyond_six_months_is_active() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let c = cert(NaiveDate::from_ymd_opt(2027, 3, 1));
        assert_eq!(c.expiry_status(today), ExpiryStatus::Active);
    }

    #[test]
    fn test_apply_replaces_exactly_one_section() {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();

        doc.apply(SectionUpdate::Skills(Skills {
            technical: vec![SkillItem {
                name: "Rust".to_string(),
                proficiency: Some("Expert".to_string()),
            }],
            soft: vec![],
            languages: vec![],
        }));

        assert_eq!(doc.skills.technical.len(), 1);
        // untouched sections keep their values
        assert_eq!(doc.personal_info.first_name, "Ada");
        assert!(doc.experience.is_empty());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.experience.push(ExperienceEntry {
            id: Uuid::new_v4(),
            job_title: "Engineer".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            location: "London".to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: None,
            is_current_job: true,
            responsibilities: vec!["Programs".to_string()],
            achievements: vec![],
        });

        let json = serde_json::to_value(&doc).unwrap();
        // camelCase on the wire
        assert!(json["personalInfo"]["firstName"].is_string());
        assert!(json["experience"][0]["isCurrentJob"].as_bool().unwrap());

        let back: CVDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
