//! # PDF serializer
//!
//! Turns laid-out [`Page`]s into an in-memory PDF 1.7 file.
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog (+ AcroForm when interactive)
//! 2 0 obj  Pages
//! 3 0 obj  Helvetica          (/F1)
//! 4 0 obj  Helvetica-Bold     (/F2)
//! 5 0 obj  ZapfDingbats       (/ZaDb)
//! ...      per page: content stream, page, then one widget and two
//!          appearance streams per checkbox
//! xref / trailer / %%EOF
//! ```
//!
//! Only the standard Type1 fonts are used, so text goes out as
//! WinAnsiEncoding byte strings.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;
use thiserror::Error;

use super::layout::{BODY_FONT_SIZE, Page, Primitive, TextStyle};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const BODY_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const DINGBATS_FONT_ID: usize = 5;

/// ZapfDingbats glyph for a check mark.
const CHECK_GLYPH: &str = "4";
const CHECKBOX_ON: &str = "Yes";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot render a document without pages")]
    EmptyDocument,
}

/// Document-level metadata and output options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Turn every box primitive into a fillable checkbox.
    pub interactive: bool,
}

impl DocumentInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn interactive(self, interactive: bool) -> Self {
        Self {
            interactive,
            ..self
        }
    }
}

struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    fields: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 is the free-list head; 1..=5 are fixed above.
        Self {
            objects: vec![Vec::new(); DINGBATS_FONT_ID + 1],
            fields: Vec::new(),
        }
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn set(&mut self, id: usize, data: Vec<u8>) {
        self.objects[id] = data;
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.reserve();
        self.set(id, data);
        id
    }
}

/// Serialize `pages` into PDF bytes. One physical page per layout page, in
/// order; primitives drawn in emission order.
pub fn finalize(pages: &[Page], info: &DocumentInfo) -> Result<Vec<u8>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::EmptyDocument);
    }

    let mut builder = PdfBuilder::new();
    builder.set(BODY_FONT_ID, standard_font("Helvetica", true));
    builder.set(BOLD_FONT_ID, standard_font("Helvetica-Bold", true));
    builder.set(DINGBATS_FONT_ID, standard_font("ZapfDingbats", false));

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = content_stream(page);
        let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
        let mut content_data = Vec::new();
        let _ = write!(
            content_data,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        content_data.extend_from_slice(&compressed);
        content_data.extend_from_slice(b"\nendstream");
        let content_id = builder.push(content_data);

        let page_id = builder.reserve();
        let annotations = if info.interactive {
            write_checkboxes(&mut builder, page, page_id)
        } else {
            Vec::new()
        };

        let mut page_dict = format!(
            "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Contents {content_id} 0 R \
             /Resources << /Font << /F1 {BODY_FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> >>",
            page.width, page.height
        );
        if !annotations.is_empty() {
            let _ = write!(page_dict, " /Annots [{}]", references(&annotations));
        }
        page_dict.push_str(" >>");
        builder.set(page_id, page_dict.into_bytes());
        page_ids.push(page_id);
    }

    let mut catalog = format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R");
    if info.interactive && !builder.fields.is_empty() {
        let _ = write!(
            catalog,
            " /AcroForm << /Fields [{}] /DA (/ZaDb 0 Tf 0 g) \
             /DR << /Font << /ZaDb {DINGBATS_FONT_ID} 0 R >> >> >>",
            references(&builder.fields)
        );
    }
    catalog.push_str(" >>");
    builder.set(CATALOG_ID, catalog.into_bytes());

    builder.set(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            references(&page_ids),
            page_ids.len()
        )
        .into_bytes(),
    );

    let info_id = info_dictionary(info).map(|data| builder.push(data.into_bytes()));

    Ok(serialize(&builder, info_id))
}

fn standard_font(base: &str, win_ansi: bool) -> Vec<u8> {
    let encoding = if win_ansi {
        " /Encoding /WinAnsiEncoding"
    } else {
        ""
    };
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base}{encoding} >>").into_bytes()
}

fn references(ids: &[usize]) -> String {
    ids.iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn info_dictionary(info: &DocumentInfo) -> Option<String> {
    if info.title.is_none() && info.author.is_none() {
        return None;
    }
    let mut dict = String::from("<< ");
    if let Some(title) = &info.title {
        let _ = write!(dict, "/Title ({}) ", encode_text(title));
    }
    if let Some(author) = &info.author {
        let _ = write!(dict, "/Author ({}) ", encode_text(author));
    }
    dict.push_str("/Producer (questionnaire) >>");
    Some(dict)
}

fn style_operators(style: TextStyle) -> (&'static str, f64, &'static str) {
    match style {
        TextStyle::Heading => ("/F2", 16.0, "0 0 0.545 rg"),
        TextStyle::SectionTitle => ("/F2", 14.0, "0 0.502 0 rg"),
        TextStyle::Body => ("/F1", BODY_FONT_SIZE, "0 0 0 rg"),
    }
}

fn content_stream(page: &Page) -> String {
    let mut stream = String::new();
    for primitive in &page.primitives {
        match primitive {
            Primitive::Text { x, y, text, style } => {
                let (font, size, color) = style_operators(*style);
                let _ = writeln!(
                    stream,
                    "BT {font} {size} Tf {color} {x:.2} {y:.2} Td ({}) Tj ET",
                    encode_text(text)
                );
            }
            Primitive::Box { x, y, size, .. } => {
                let _ = writeln!(
                    stream,
                    "q 0 0 0 RG 1 w {x:.2} {y:.2} {size:.2} {size:.2} re S Q"
                );
            }
        }
    }
    stream
}

/// Emit one widget per box on `page`; returns the widget object ids.
fn write_checkboxes(builder: &mut PdfBuilder, page: &Page, page_id: usize) -> Vec<usize> {
    let mut widgets = Vec::new();
    for primitive in &page.primitives {
        let Primitive::Box {
            x,
            y,
            size,
            field,
            tooltip,
        } = primitive
        else {
            continue;
        };

        let on_id = builder.push(appearance_stream(*size, &checked_appearance(*size)));
        let off_id = builder.push(appearance_stream(*size, ""));
        let widget = format!(
            "<< /Type /Annot /Subtype /Widget /FT /Btn /F 4 /P {page_id} 0 R \
             /T ({}) /TU ({}) /Rect [{x:.2} {y:.2} {:.2} {:.2}] \
             /V /Off /AS /Off /DA (/ZaDb 0 Tf 0 g) /MK << /BC [0 0 0] /CA ({CHECK_GLYPH}) >> \
             /AP << /N << /{CHECKBOX_ON} {on_id} 0 R /Off {off_id} 0 R >> >> >>",
            encode_text(field),
            encode_text(tooltip),
            x + size,
            y + size,
        );
        let widget_id = builder.push(widget.into_bytes());
        builder.fields.push(widget_id);
        widgets.push(widget_id);
    }
    widgets
}

fn checked_appearance(size: f64) -> String {
    let font_size = size * 0.8;
    let inset = size * 0.15;
    format!(
        "q 0 g BT /ZaDb {font_size:.2} Tf {inset:.2} {inset:.2} Td ({CHECK_GLYPH}) Tj ET Q"
    )
}

fn appearance_stream(size: f64, content: &str) -> Vec<u8> {
    let mut data = Vec::new();
    let _ = write!(
        data,
        "<< /Type /XObject /Subtype /Form /BBox [0 0 {size:.2} {size:.2}] \
         /Resources << /Font << /ZaDb {DINGBATS_FONT_ID} 0 R >> >> /Length {} >>\nstream\n",
        content.len()
    );
    data.extend_from_slice(content.as_bytes());
    data.extend_from_slice(b"\nendstream");
    data
}

/// Encode `text` as the body of a PDF literal string in WinAnsiEncoding.
///
/// Delimiters are escaped, bytes above 0x7E are written as octal escapes and
/// characters WinAnsi cannot represent become `?`.
fn encode_text(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => encoded.push_str("\\\\"),
            '(' => encoded.push_str("\\("),
            ')' => encoded.push_str("\\)"),
            _ => match unicode_to_winansi(ch) {
                Some(byte) if byte < 0x80 => encoded.push(byte as char),
                Some(byte) => {
                    let _ = write!(encoded, "\\{byte:03o}");
                }
                None => encoded.push('?'),
            },
        }
    }
    encoded
}

fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

fn serialize(builder: &PdfBuilder, info_id: Option<usize>) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::new();
    let mut offsets = vec![0usize; builder.objects.len()];

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (id, data) in builder.objects.iter().enumerate().skip(1) {
        offsets[id] = output.len();
        let _ = write!(output, "{id} 0 obj\n");
        output.extend_from_slice(data);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        let _ = write!(output, "{offset:010} 00000 n \n");
    }

    let _ = write!(
        output,
        "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R",
        builder.objects.len()
    );
    if let Some(info_id) = info_id {
        let _ = write!(output, " /Info {info_id} 0 R");
    }
    let _ = write!(output, " >>\nstartxref\n{xref_offset}\n%%EOF\n");

    output
}

#[cfg(test)]
mod tests {
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    use super::*;
    use crate::application::render::layout::{LayoutConfig, render_document};
    use crate::domain::document::{Document, Prompt, Section};

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    fn occurrences(haystack: &[u8], needle: &str) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle.as_bytes())
            .count()
    }

    fn page(primitives: Vec<Primitive>) -> Page {
        Page {
            width: 595.28,
            height: 841.89,
            primitives,
            cursor: 0.0,
        }
    }

    fn text(value: &str, y: f64) -> Primitive {
        Primitive::Text {
            x: 50.0,
            y,
            text: value.to_string(),
            style: TextStyle::Body,
        }
    }

    fn checkbox(field: &str) -> Primitive {
        Primitive::Box {
            x: 50.0,
            y: 600.0,
            size: 12.0,
            field: field.to_string(),
            tooltip: "Oui".to_string(),
        }
    }

    /// Decompress the first FlateDecode stream in `bytes`.
    fn first_content_stream(bytes: &[u8]) -> String {
        let start = bytes
            .windows(7)
            .position(|w| w == b"stream\n")
            .expect("content stream")
            + 7;
        let end = start
            + bytes[start..]
                .windows(10)
                .position(|w| w == b"\nendstream")
                .expect("end of stream");
        let inflated = decompress_to_vec_zlib(&bytes[start..end]).expect("zlib stream");
        String::from_utf8(inflated).expect("ascii content")
    }

    #[test]
    fn empty_page_list_is_rejected() {
        assert_eq!(
            finalize(&[], &DocumentInfo::default()),
            Err(RenderError::EmptyDocument)
        );
    }

    #[test]
    fn writes_a_well_formed_file() {
        let bytes = finalize(&[page(vec![])], &DocumentInfo::default()).expect("pdf");

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, "xref"));
        assert!(contains(&bytes, "trailer"));
        assert!(contains(&bytes, "/Count 1"));
        assert!(!contains(&bytes, "/Info"));
    }

    #[test]
    fn one_physical_page_per_layout_page() {
        let pages = vec![page(vec![text("Un", 700.0)]), page(vec![text("Deux", 700.0)])];
        let bytes = finalize(&pages, &DocumentInfo::default()).expect("pdf");

        assert!(contains(&bytes, "/Count 2"));
        assert_eq!(occurrences(&bytes, "/Type /Page "), 2);
    }

    #[test]
    fn text_is_drawn_with_style_and_escaped() {
        let pages = vec![page(vec![
            Primitive::Text {
                x: 56.69,
                y: 785.2,
                text: "Étude (pilote) – 5 000 FCFA ✓".to_string(),
                style: TextStyle::Heading,
            },
            text("Nom", 700.0),
        ])];
        let bytes = finalize(&pages, &DocumentInfo::default()).expect("pdf");
        let content = first_content_stream(&bytes);

        assert!(content.contains(
            "BT /F2 16 Tf 0 0 0.545 rg 56.69 785.20 Td (\\311tude \\(pilote\\) \\226 5 000 FCFA ?) Tj ET"
        ));
        assert!(content.contains("BT /F1 12 Tf 0 0 0 rg 50.00 700.00 Td (Nom) Tj ET"));
        assert!(content.find("\\311tude") < content.find("(Nom)"));
    }

    #[test]
    fn boxes_are_stroked_and_become_widgets_when_interactive() {
        let pages = vec![page(vec![checkbox("s1_q1_0"), checkbox("s1_q1_1")])];

        let flat = finalize(&pages, &DocumentInfo::default()).expect("pdf");
        assert!(first_content_stream(&flat).contains("50.00 600.00 12.00 12.00 re S"));
        assert!(!contains(&flat, "/AcroForm"));
        assert!(!contains(&flat, "/Widget"));

        let form = finalize(&pages, &DocumentInfo::default().interactive(true)).expect("pdf");
        assert!(contains(&form, "/AcroForm"));
        assert_eq!(occurrences(&form, "/Subtype /Widget"), 2);
        assert!(contains(&form, "/T (s1_q1_0)"));
        assert!(contains(&form, "/T (s1_q1_1)"));
        assert!(contains(&form, "/Rect [50.00 600.00 62.00 612.00]"));
        assert!(contains(&form, "/BaseFont /ZapfDingbats"));
    }

    #[test]
    fn info_dictionary_carries_title() {
        let info = DocumentInfo {
            title: Some("Réponse n°7".to_string()),
            author: None,
            interactive: false,
        };
        let bytes = finalize(&[page(vec![])], &info).expect("pdf");
        assert!(contains(&bytes, "/Title (R\\351ponse n\\2607)"));
        assert!(contains(&bytes, "/Info "));
    }

    #[test]
    fn output_is_byte_identical_across_calls() {
        let document = Document::new(vec![Section::new(
            "Section",
            vec![Prompt::choice("Sexe :", ["Homme", "Femme"])],
        )]);
        let pages = render_document(&document, &LayoutConfig::a4()).expect("layout");
        let info = DocumentInfo::titled("Questionnaire").interactive(true);

        assert_eq!(finalize(&pages, &info), finalize(&pages, &info));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pages = vec![page(vec![text("Nom", 700.0), checkbox("s1_q1_0")])];
        let bytes = finalize(&pages, &DocumentInfo::default().interactive(true)).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);

        let xref = text.find("\nxref\n").expect("xref") + 1;
        let entries: Vec<usize> = text[xref..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().expect("offset"))
            .collect();
        assert!(!entries.is_empty());
        for (index, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", index + 1);
            assert!(bytes[*offset..].starts_with(header.as_bytes()), "{header}");
        }
    }
}
