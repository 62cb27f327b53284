//! PDF writer.
//!
//! Drives lopdf in the writing direction: base-14 Helvetica fonts, one
//! content stream per page, greedy character-budget line wrap, automatic page
//! breaks. Content streams are left uncompressed — output stays byte-stable
//! across runs and the text content remains visible to byte-level assertions.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::export::ExportError;
use crate::render::{BulletGroup, RenderItem, RenderTree};

const PAGE_WIDTH: f64 = 612.0; // US letter
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 72.0; // 1 inch
const TEXT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const NAME_SIZE: f64 = 20.0;
const HEADING_SIZE: f64 = 12.0;
const TITLE_SIZE: f64 = 11.0;
const BODY_SIZE: f64 = 10.0;
const CONTACT_SIZE: f64 = 9.0;

/// Approximate Helvetica advance as a fraction of the font size, used for
/// wrapping and centering.
const AVG_CHAR_EM: f64 = 0.5;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const OBLIQUE: &str = "F3";

pub fn write_pdf(tree: &RenderTree) -> Result<Vec<u8>, ExportError> {
    let mut composer = Composer::new();

    for block in &tree.blocks {
        if let Some(heading) = &block.heading {
            let (r, g, b) = hex_rgb(&block.style.hex);
            composer.ensure_room(HEADING_SIZE * 3.0);
            composer.gap(HEADING_SIZE * 0.8);
            composer.line(
                MARGIN,
                &heading.to_uppercase(),
                BOLD,
                HEADING_SIZE,
                (r, g, b),
            );
            composer.gap(2.0);
        }
        for item in &block.items {
            composer.item(item, &block.style.hex);
        }
    }

    composer.finish()
}

struct Composer {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f64,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn item(&mut self, item: &RenderItem, hex: &str) {
        let color = hex_rgb(hex);
        let black = (0.0, 0.0, 0.0);
        match item {
            RenderItem::Header { name, contact } => {
                self.ensure_room(NAME_SIZE * 2.5);
                self.centered(name, BOLD, NAME_SIZE, color);
                if !contact.is_empty() {
                    self.centered(&contact.join(" \u{2022} "), REGULAR, CONTACT_SIZE, black);
                }
                self.gap(6.0);
            }
            RenderItem::Paragraph { text } => {
                self.wrapped(MARGIN, text, REGULAR, BODY_SIZE, black);
                self.gap(4.0);
            }
            RenderItem::Entry {
                title,
                subtitle,
                date_line,
                meta,
                bullet_groups,
            } => {
                self.ensure_room(TITLE_SIZE * 4.0);
                self.line(MARGIN, title, BOLD, TITLE_SIZE, black);
                if let Some(subtitle) = subtitle {
                    self.line(MARGIN, subtitle, BOLD, BODY_SIZE, color);
                }
                if let Some(date_line) = date_line {
                    self.line(MARGIN, date_line, OBLIQUE, BODY_SIZE, black);
                }
                for line in meta {
                    self.wrapped(MARGIN, line, REGULAR, BODY_SIZE, black);
                }
                for group in bullet_groups {
                    self.bullets(group, black);
                }
                self.gap(6.0);
            }
            RenderItem::LabeledLine { label, text } => {
                self.wrapped(MARGIN, &format!("{label}: {text}"), REGULAR, BODY_SIZE, black);
            }
        }
    }

    fn bullets(&mut self, group: &BulletGroup, color: (f64, f64, f64)) {
        if let Some(label) = &group.label {
            self.line(MARGIN, label, BOLD, BODY_SIZE, color);
        }
        for bullet in &group.bullets {
            self.wrapped(
                MARGIN + 12.0,
                &format!("\u{2022} {bullet}"),
                REGULAR,
                BODY_SIZE,
                color,
            );
        }
    }

    /// One line of text at `x`. Callers are responsible for wrapping.
    fn line(&mut self, x: f64, text: &str, font: &str, size: f64, color: (f64, f64, f64)) {
        self.ensure_room(size * 1.4);
        let (r, g, b) = color;
        self.ops.push(Operation::new(
            "rg",
            vec![(r as f32).into(), (g as f32).into(), (b as f32).into()],
        ));
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops
            .push(Operation::new("Td", vec![x.into(), self.y.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
        self.y -= size * 1.4;
    }

    fn centered(&mut self, text: &str, font: &str, size: f64, color: (f64, f64, f64)) {
        let width = text.chars().count() as f64 * size * AVG_CHAR_EM;
        let x = (MARGIN + (TEXT_WIDTH - width) / 2.0).max(MARGIN);
        self.line(x, text, font, size, color);
    }

    fn wrapped(&mut self, x: f64, text: &str, font: &str, size: f64, color: (f64, f64, f64)) {
        let budget = ((TEXT_WIDTH - (x - MARGIN)) / (size * AVG_CHAR_EM)).max(8.0) as usize;
        for line in wrap(text, budget) {
            self.line(x, &line, font, size, color);
        }
    }

    fn gap(&mut self, points: f64) {
        self.y -= points;
    }

    fn ensure_room(&mut self, needed: f64) {
        if self.y - needed < MARGIN {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        if !self.ops.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        self.break_page();
        if self.pages.is_empty() {
            return Err(ExportError::RenderTreeEmpty);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = |base: &str| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            }
        };
        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let oblique_id = doc.add_object(font("Helvetica-Oblique"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular_id,
                BOLD => bold_id,
                OBLIQUE => oblique_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in self.pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

/// Greedy word wrap against a character budget. Words longer than the budget
/// land on their own line rather than being split.
fn wrap(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= budget {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Encodes text as WinAnsi bytes for the base-14 fonts. ASCII passes through,
/// Latin-1 maps directly, common punctuation gets its WinAnsi slot, anything
/// else degrades to `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            c if (c as u32) < 0x100 => c as u8,
            _ => b'?',
        })
        .collect()
}

fn hex_rgb(hex: &str) -> (f64, f64, f64) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return (0.0, 0.0, 0.0);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f64 / 255.0
    };
    (channel(0..2), channel(2..4), channel(4..6))
}
