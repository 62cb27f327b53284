//! Read-only template catalog. Reference data only — never mutated.

use axum::Json;
use serde::Serialize;

use crate::model::{TemplateSelection, TemplateStyle};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub style: TemplateStyle,
    pub color: &'static str,
    pub preview: &'static str,
}

pub const TEMPLATES: [TemplateDescriptor; 4] = [
    TemplateDescriptor {
        id: "modern-1",
        name: "Modern Professional",
        description: "Clean and contemporary design with bold typography",
        style: TemplateStyle::Modern,
        color: "blue",
        preview: "/template-previews/modern-1.jpg",
    },
    TemplateDescriptor {
        id: "classic-1",
        name: "Classic Executive",
        description: "Traditional professional layout perfect for corporate roles",
        style: TemplateStyle::Classic,
        color: "gray",
        preview: "/template-previews/classic-1.jpg",
    },
    TemplateDescriptor {
        id: "creative-1",
        name: "Creative Designer",
        description: "Eye-catching design for creative professionals",
        style: TemplateStyle::Creative,
        color: "purple",
        preview: "/template-previews/creative-1.jpg",
    },
    TemplateDescriptor {
        id: "minimal-1",
        name: "Minimal Tech",
        description: "Clean and simple design focusing on content",
        style: TemplateStyle::Minimal,
        color: "green",
        preview: "/template-previews/minimal-1.jpg",
    },
];

pub fn find_template(id: &str) -> Option<&'static TemplateDescriptor> {
    TEMPLATES.iter().find(|t| t.id == id)
}

impl TemplateDescriptor {
    pub fn selection(&self) -> TemplateSelection {
        TemplateSelection {
            template_id: self.id.to_string(),
            style: self.style,
            color: self.color.to_string(),
        }
    }
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateDescriptor>> {
    Json(TEMPLATES.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<&str> = TEMPLATES.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), TEMPLATES.len());
    }

    #[test]
    fn test_find_template() {
        assert_eq!(find_template("classic-1").unwrap().color, "gray");
        assert!(find_template("vaporwave-9").is_none());
    }

    #[test]
    fn test_selection_carries_style_metadata() {
        let selection = find_template("creative-1").unwrap().selection();
        assert_eq!(selection.template_id, "creative-1");
        assert_eq!(selection.style, TemplateStyle::Creative);
        assert_eq!(selection.color, "purple");
    }
}
