//! Word (OOXML) writer.
//!
//! Emits a minimal WordprocessingML package: `[Content_Types].xml`, the two
//! relationship parts, `word/styles.xml`, and a `word/document.xml` that
//! mirrors the PDF layout line for line — same ordering, full bullet lists,
//! same date strings.
//!
//! The ZIP container is written by hand with stored (method 0) entries and a
//! fixed DOS timestamp, so the package is deterministic and its text content
//! stays byte-visible. CRC32 comes from flate2.

use crate::render::{BulletGroup, RenderItem, RenderTree};

/// Half-point font sizes (OOXML `w:sz` units).
const SZ_NAME: u32 = 32;
const SZ_HEADING: u32 = 24;
const SZ_TITLE: u32 = 22;
const SZ_BODY: u32 = 20;
const SZ_SMALL: u32 = 18;

pub fn write_docx(tree: &RenderTree) -> Vec<u8> {
    let document = document_xml(tree);
    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/document.xml", document.as_bytes()),
    ];
    zip_stored(&parts)
}

// ── document.xml ────────────────────────────────────────────────────────────

fn document_xml(tree: &RenderTree) -> String {
    let mut body = String::new();
    for block in &tree.blocks {
        let hex = block.style.hex.trim_start_matches('#');
        if let Some(heading) = &block.heading {
            push_paragraph(
                &mut body,
                &[run(&heading.to_uppercase(), SZ_HEADING, RunStyle {
                    bold: true,
                    color: Some(hex),
                    underline: true,
                    ..RunStyle::default()
                })],
                ParagraphStyle::default(),
            );
        }
        for item in &block.items {
            push_item(&mut body, item, hex);
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}<w:sectPr/></w:body></w:document>"
    )
}

fn push_item(body: &mut String, item: &RenderItem, hex: &str) {
    match item {
        RenderItem::Header { name, contact } => {
            push_paragraph(
                body,
                &[run(name, SZ_NAME, RunStyle {
                    bold: true,
                    color: Some(hex),
                    ..RunStyle::default()
                })],
                ParagraphStyle {
                    centered: true,
                    ..ParagraphStyle::default()
                },
            );
            if !contact.is_empty() {
                push_paragraph(
                    body,
                    &[run(&contact.join(" \u{2022} "), SZ_BODY, RunStyle::default())],
                    ParagraphStyle {
                        centered: true,
                        ..ParagraphStyle::default()
                    },
                );
            }
        }
        RenderItem::Paragraph { text } => {
            push_paragraph(body, &[run(text, SZ_BODY, RunStyle::default())], ParagraphStyle::default());
        }
        RenderItem::Entry {
            title,
            subtitle,
            date_line,
            meta,
            bullet_groups,
        } => {
            let mut runs = vec![run(title, SZ_TITLE, RunStyle {
                bold: true,
                ..RunStyle::default()
            })];
            if let Some(subtitle) = subtitle {
                runs.push(run(&format!(" | {subtitle}"), SZ_TITLE, RunStyle {
                    bold: true,
                    color: Some(hex),
                    ..RunStyle::default()
                }));
            }
            push_paragraph(body, &runs, ParagraphStyle::default());

            if let Some(date_line) = date_line {
                push_paragraph(
                    body,
                    &[run(date_line, SZ_BODY, RunStyle {
                        italic: true,
                        ..RunStyle::default()
                    })],
                    ParagraphStyle::default(),
                );
            }
            for line in meta {
                push_paragraph(
                    body,
                    &[run(line, SZ_SMALL, RunStyle::default())],
                    ParagraphStyle::default(),
                );
            }
            for group in bullet_groups {
                push_bullets(body, group);
            }
        }
        RenderItem::LabeledLine { label, text } => {
            push_paragraph(
                body,
                &[
                    run(&format!("{label}: "), SZ_BODY, RunStyle {
                        bold: true,
                        ..RunStyle::default()
                    }),
                    run(text, SZ_BODY, RunStyle::default()),
                ],
                ParagraphStyle::default(),
            );
        }
    }
}

fn push_bullets(body: &mut String, group: &BulletGroup) {
    if let Some(label) = &group.label {
        push_paragraph(
            body,
            &[run(label, SZ_BODY, RunStyle {
                bold: true,
                ..RunStyle::default()
            })],
            ParagraphStyle::default(),
        );
    }
    for bullet in &group.bullets {
        push_paragraph(
            body,
            &[run(&format!("\u{2022} {bullet}"), SZ_BODY, RunStyle::default())],
            ParagraphStyle {
                indent: true,
                ..ParagraphStyle::default()
            },
        );
    }
}

#[derive(Default)]
struct RunStyle<'a> {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<&'a str>,
}

#[derive(Default)]
struct ParagraphStyle {
    centered: bool,
    indent: bool,
}

fn run(text: &str, half_points: u32, style: RunStyle) -> String {
    let mut props = String::new();
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if style.underline {
        props.push_str("<w:u w:val=\"single\"/>");
    }
    if let Some(color) = style.color {
        props.push_str(&format!("<w:color w:val=\"{color}\"/>"));
    }
    props.push_str(&format!("<w:sz w:val=\"{half_points}\"/>"));
    format!(
        "<w:r><w:rPr>{props}</w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r>",
        xml_escape(text)
    )
}

fn push_paragraph(body: &mut String, runs: &[String], style: ParagraphStyle) {
    let mut props = String::new();
    if style.centered {
        props.push_str("<w:jc w:val=\"center\"/>");
    }
    if style.indent {
        props.push_str("<w:ind w:left=\"720\"/>");
    }
    let p_pr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:pPr>{props}</w:pPr>")
    };
    body.push_str(&format!("<w:p>{p_pr}{}</w:p>", runs.concat()));
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ── static package parts ────────────────────────────────────────────────────

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
    <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
    <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
    <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
    <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
    <Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
    </Types>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
    <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
    <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
    </Relationships>";

const DOCUMENT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
    <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
    <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
    </Relationships>";

const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
    <w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
    <w:docDefaults><w:rPrDefault><w:rPr>\
    <w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\"/><w:sz w:val=\"22\"/>\
    </w:rPr></w:rPrDefault></w:docDefaults>\
    </w:styles>";

// ── ZIP container ───────────────────────────────────────────────────────────

/// Fixed DOS date 1980-01-01, time 00:00 — keeps the package byte-stable.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = 0x0021;

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

/// Writes a ZIP archive with stored (uncompressed) entries.
fn zip_stored(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();
    let mut offsets = Vec::with_capacity(parts.len());

    for (name, data) in parts {
        let offset = out.len() as u32;
        offsets.push(offset);
        let crc = crc32(data);
        let name_bytes = name.as_bytes();
        let size = data.len() as u32;

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes()); // local file header
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // method: stored
        out.extend_from_slice(&DOS_TIME.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes()); // compressed
        out.extend_from_slice(&size.to_le_bytes()); // uncompressed
        out.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(data);
    }

    for ((name, data), offset) in parts.iter().zip(&offsets) {
        let crc = crc32(data);
        let name_bytes = name.as_bytes();
        let size = data.len() as u32;

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes()); // central directory header
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&0u16.to_le_bytes()); // method
        central.extend_from_slice(&DOS_TIME.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra len
        central.extend_from_slice(&0u16.to_le_bytes()); // comment len
        central.extend_from_slice(&0u16.to_le_bytes()); // disk number
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name_bytes);
    }

    let central_offset = out.len() as u32;
    let central_size = central.len() as u32;
    let entry_count = parts.len() as u16;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes()); // end of central directory
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // central dir disk
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&entry_count.to_le_bytes());
    out.extend_from_slice(&central_size.to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out
}
