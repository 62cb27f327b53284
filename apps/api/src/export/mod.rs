//! Export engine — serializes a render tree into concrete byte formats.
//!
//! Both writers are deterministic: identical `(render tree, format)` input
//! always produces byte-identical output. No timestamps, no randomness, no
//! environment-dependent state reaches the writers.

pub mod docx;
pub mod pdf;

use std::str::FromStr;

use bytes::Bytes;
use thiserror::Error;

use crate::model::CVDocument;
use crate::render::RenderTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Word,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "word" | "docx" => Ok(ExportFormat::Word),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Render tree produced no content")]
    RenderTreeEmpty,

    #[error("PDF writer error: {0}")]
    Pdf(String),
}

/// Serializes the render tree into the requested format.
pub fn export(tree: &RenderTree, format: ExportFormat) -> Result<Bytes, ExportError> {
    if tree.is_empty() {
        return Err(ExportError::RenderTreeEmpty);
    }
    match format {
        ExportFormat::Pdf => pdf::write_pdf(tree).map(Bytes::from),
        ExportFormat::Word => Ok(Bytes::from(docx::write_docx(tree))),
    }
}

/// `CV_{firstName}_{lastName}.{pdf|docx}`, with filesystem-hostile characters
/// stripped from the name parts.
pub fn suggested_filename(doc: &CVDocument, format: ExportFormat) -> String {
    format!(
        "CV_{}_{}.{}",
        sanitize(&doc.personal_info.first_name),
        sanitize(&doc.personal_info.last_name),
        format.extension()
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CVDocument, TemplateSelection, TemplateStyle};
    use crate::render::build_render_tree;
    use chrono::NaiveDate;

    fn ada_tree() -> RenderTree {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace".to_string();
        doc.personal_info.email = "ada@x.com".to_string();
        doc.experience.push(crate::model::ExperienceEntry {
            id: uuid::Uuid::new_v4(),
            job_title: "Lead Engineer".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            location: String::new(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: None,
            is_current_job: true,
            responsibilities: vec!["Designed the mill".to_string()],
            achievements: vec![],
        });
        let template = TemplateSelection {
            template_id: "modern-1".to_string(),
            style: TemplateStyle::Modern,
            color: "blue".to_string(),
        };
        build_render_tree(&doc, &template, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_str("pdf").unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::from_str("word").unwrap(), ExportFormat::Word);
        assert_eq!(ExportFormat::from_str("DOCX").unwrap(), ExportFormat::Word);
        assert!(matches!(
            ExportFormat::from_str("rtf"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_tree_is_rejected() {
        let tree = RenderTree { blocks: vec![] };
        assert!(matches!(
            export(&tree, ExportFormat::Pdf),
            Err(ExportError::RenderTreeEmpty)
        ));
    }

    #[test]
    fn test_pdf_export_is_deterministic() {
        let tree = ada_tree();
        let first = export(&tree, ExportFormat::Pdf).unwrap();
        let second = export(&tree, ExportFormat::Pdf).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_word_export_is_deterministic() {
        let tree = ada_tree();
        let first = export(&tree, ExportFormat::Word).unwrap();
        let second = export(&tree, ExportFormat::Word).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_both_formats_contain_the_date_range_literal() {
        let tree = ada_tree();
        let needle = b"Jan 2020 - Present";

        let pdf = export(&tree, ExportFormat::Pdf).unwrap();
        assert!(
            pdf.windows(needle.len()).any(|w| w == needle),
            "PDF bytes must contain the rendered date range"
        );

        let docx = export(&tree, ExportFormat::Word).unwrap();
        assert!(
            docx.windows(needle.len()).any(|w| w == needle),
            "DOCX bytes must contain the rendered date range"
        );
    }

    #[test]
    fn test_suggested_filename() {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace King".to_string();
        assert_eq!(
            suggested_filename(&doc, ExportFormat::Pdf),
            "CV_Ada_Lovelace_King.pdf"
        );
        assert_eq!(
            suggested_filename(&doc, ExportFormat::Word),
            "CV_Ada_Lovelace_King.docx"
        );
    }
}
