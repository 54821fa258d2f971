//! # Questionnaire layout
//!
//! Walks a [`Document`] top to bottom with a single vertical cursor and
//! emits positioned drawing primitives into fixed-height pages.
//!
//! Coordinates follow PDF conventions: points, origin at the bottom-left
//! corner, `y` growing upwards. The cursor starts at
//! `page_height - top_margin` and only ever moves down within a page.
//!
//! Page breaks are decided at section titles only. Prompts inside a section
//! are never checked individually, so a tall section can run into the bottom
//! margin unless `min_space_before_break` leaves room for it; see
//! [`min_space_to_fit`].

use thiserror::Error;

use crate::domain::document::{Document, Prompt, Section};

/// One centimetre in PDF points.
pub const CM: f64 = 72.0 / 2.54;
pub const A4_WIDTH: f64 = 595.2756;
pub const A4_HEIGHT: f64 = 841.8898;

/// Point size of [`TextStyle::Body`] text in the PDF.
pub const BODY_FONT_SIZE: f64 = 12.0;
/// Mean Helvetica glyph advance, in ems.
pub const AVERAGE_ADVANCE: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("invalid layout configuration: {reason}")]
    InvalidLayoutConfig { reason: String },
}

impl LayoutError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidLayoutConfig {
            reason: reason.into(),
        }
    }
}

/// Fixed vertical advances (and a few horizontal offsets) used while laying out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub heading: f64,
    pub title: f64,
    pub question: f64,
    pub label: f64,
    pub option: f64,
    /// Extra drop after the last option of a choice prompt.
    pub choice_gap: f64,
    /// Extra drop after the last prompt of a section.
    pub section_gap: f64,
    /// Horizontal distance between a checkbox and its option text.
    pub option_indent: f64,
    pub box_size: f64,
    /// How far the checkbox's lower edge sits below the option baseline.
    pub box_drop: f64,
}

impl Default for LineMetrics {
    fn default() -> Self {
        Self {
            heading: 1.5 * CM,
            title: 1.0 * CM,
            question: 0.7 * CM,
            label: 0.7 * CM,
            option: 0.7 * CM,
            choice_gap: 0.3 * CM,
            section_gap: 1.0 * CM,
            option_indent: 0.6 * CM,
            box_size: 12.0,
            box_drop: 0.2 * CM,
        }
    }
}

impl LineMetrics {
    fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("heading", self.heading),
            ("title", self.title),
            ("question", self.question),
            ("label", self.label),
            ("option", self.option),
            ("choice_gap", self.choice_gap),
            ("section_gap", self.section_gap),
            ("option_indent", self.option_indent),
            ("box_size", self.box_size),
            ("box_drop", self.box_drop),
        ]
    }

    fn prompt_extent(&self, prompt: &Prompt) -> f64 {
        match prompt {
            Prompt::FreeText(_) => self.question,
            Prompt::Choice { options, .. } => {
                self.label + self.option * options.len() as f64 + self.choice_gap
            }
        }
    }

    /// Vertical distance consumed by a section, excluding the trailing section gap.
    pub fn section_extent(&self, section: &Section) -> f64 {
        self.title
            + section
                .prompts
                .iter()
                .map(|prompt| self.prompt_extent(prompt))
                .sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub top_margin: f64,
    pub left_margin: f64,
    pub min_space_before_break: f64,
    pub metrics: LineMetrics,
}

impl LayoutConfig {
    /// A4 page width with the given vertical geometry and default metrics.
    pub fn new(page_height: f64, top_margin: f64, min_space_before_break: f64) -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height,
            top_margin,
            left_margin: 2.0 * CM,
            min_space_before_break,
            metrics: LineMetrics::default(),
        }
    }

    /// A4 portrait with 2 cm margins.
    pub fn a4() -> Self {
        Self::new(A4_HEIGHT, 2.0 * CM, 2.0 * CM)
    }

    pub fn with_metrics(self, metrics: LineMetrics) -> Self {
        Self { metrics, ..self }
    }

    pub fn with_min_space(self, min_space_before_break: f64) -> Self {
        Self {
            min_space_before_break,
            ..self
        }
    }

    /// Raise `min_space_before_break` so that every section of `document`
    /// ends above `bottom_margin`.
    pub fn fitted_to(self, document: &Document, bottom_margin: f64) -> Self {
        let required = min_space_to_fit(document, &self, bottom_margin);
        self.with_min_space(self.min_space_before_break.max(required))
    }

    /// Height between the top margin and the page bottom.
    pub fn usable_height(&self) -> f64 {
        self.page_height - self.top_margin
    }

    /// Horizontal room for body text, mirroring the left margin on the right.
    pub fn text_width(&self) -> f64 {
        self.page_width - 2.0 * self.left_margin
    }

    /// How many body characters of average width fit on one line.
    pub fn body_line_capacity(&self) -> usize {
        let capacity = self.text_width() / (BODY_FONT_SIZE * AVERAGE_ADVANCE);
        if capacity.is_finite() && capacity >= 1.0 {
            capacity.floor() as usize
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let finite = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("top_margin", self.top_margin),
            ("left_margin", self.left_margin),
            ("min_space_before_break", self.min_space_before_break),
        ];
        for (name, value) in finite.into_iter().chain(self.metrics.entries()) {
            if !value.is_finite() {
                return Err(LayoutError::invalid(format!("{name} must be finite")));
            }
        }
        if self.top_margin <= 0.0 {
            return Err(LayoutError::invalid("top_margin must be positive"));
        }
        if self.page_height <= self.top_margin {
            return Err(LayoutError::invalid(
                "page_height must exceed top_margin",
            ));
        }
        if self.left_margin < 0.0 || self.page_width <= self.left_margin {
            return Err(LayoutError::invalid(
                "left_margin must be non-negative and below page_width",
            ));
        }
        if self.min_space_before_break < 0.0 {
            return Err(LayoutError::invalid(
                "min_space_before_break must not be negative",
            ));
        }
        if self.min_space_before_break >= self.usable_height() {
            return Err(LayoutError::invalid(format!(
                "min_space_before_break ({:.2}) must be below the usable height ({:.2})",
                self.min_space_before_break,
                self.usable_height()
            )));
        }
        if let Some((name, _)) = self
            .metrics
            .entries()
            .into_iter()
            .find(|(_, value)| *value < 0.0)
        {
            return Err(LayoutError::invalid(format!("{name} must not be negative")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Heading,
    SectionTitle,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    /// A square checkbox whose lower-left corner sits at `(x, y)`.
    Box {
        x: f64,
        y: f64,
        size: f64,
        field: String,
        tooltip: String,
    },
}

impl Primitive {
    pub fn is_box(&self) -> bool {
        matches!(self, Primitive::Box { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Primitive::Text { text, .. } => Some(text),
            Primitive::Box { .. } => None,
        }
    }

    pub fn y(&self) -> f64 {
        match self {
            Primitive::Text { y, .. } | Primitive::Box { y, .. } => *y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
    /// Cursor position when the page was closed.
    pub cursor: f64,
}

struct PageBuilder<'a> {
    config: &'a LayoutConfig,
    finished: Vec<Page>,
    primitives: Vec<Primitive>,
    cursor: f64,
}

impl<'a> PageBuilder<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            finished: Vec::new(),
            primitives: Vec::new(),
            cursor: config.usable_height(),
        }
    }

    fn is_blank(&self) -> bool {
        self.primitives.is_empty()
    }

    fn advance(&mut self, by: f64) {
        self.cursor -= by;
    }

    fn text(&mut self, x: f64, text: &str, style: TextStyle) {
        self.primitives.push(Primitive::Text {
            x,
            y: self.cursor,
            text: text.to_string(),
            style,
        });
    }

    fn checkbox(&mut self, x: f64, field: String, tooltip: &str) {
        let metrics = &self.config.metrics;
        self.primitives.push(Primitive::Box {
            x,
            y: self.cursor - metrics.box_drop,
            size: metrics.box_size,
            field,
            tooltip: tooltip.to_string(),
        });
    }

    fn break_page(&mut self) {
        let primitives = std::mem::take(&mut self.primitives);
        self.finished.push(Page {
            width: self.config.page_width,
            height: self.config.page_height,
            primitives,
            cursor: self.cursor,
        });
        self.cursor = self.config.usable_height();
    }

    fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.finished
    }
}

/// Lay out `document` into pages.
///
/// The result depends only on the arguments. An empty section list yields a
/// single page carrying the heading, if any.
pub fn render_document(
    document: &Document,
    config: &LayoutConfig,
) -> Result<Vec<Page>, LayoutError> {
    config.validate()?;

    let metrics = &config.metrics;
    let left = config.left_margin;
    let mut pages = PageBuilder::new(config);

    if let Some(heading) = document.heading.as_deref() {
        pages.text(left, heading, TextStyle::Heading);
        pages.advance(metrics.heading);
    }

    for (section_index, section) in document.sections.iter().enumerate() {
        if pages.cursor - metrics.title < config.min_space_before_break && !pages.is_blank() {
            pages.break_page();
        }

        pages.text(left, &section.title, TextStyle::SectionTitle);
        pages.advance(metrics.title);

        for (prompt_index, prompt) in section.prompts.iter().enumerate() {
            match prompt {
                Prompt::FreeText(label) => {
                    pages.text(left, label, TextStyle::Body);
                    pages.advance(metrics.question);
                }
                Prompt::Choice { label, options } => {
                    pages.text(left, label, TextStyle::Body);
                    pages.advance(metrics.label);
                    for (option_index, option) in options.iter().enumerate() {
                        let field = format!(
                            "s{}_q{}_{}",
                            section_index + 1,
                            prompt_index + 1,
                            option_index
                        );
                        pages.checkbox(left, field, option);
                        pages.text(left + metrics.option_indent, option, TextStyle::Body);
                        pages.advance(metrics.option);
                    }
                    pages.advance(metrics.choice_gap);
                }
            }
        }

        pages.advance(metrics.section_gap);
    }

    Ok(pages.finish())
}

/// Smallest `min_space_before_break` that keeps every section of `document`
/// above `bottom_margin`, given the section-level break policy.
pub fn min_space_to_fit(document: &Document, config: &LayoutConfig, bottom_margin: f64) -> f64 {
    let metrics = &config.metrics;
    document
        .sections
        .iter()
        .map(|section| bottom_margin + metrics.section_extent(section) - metrics.title)
        .fold(bottom_margin, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_metrics() -> LineMetrics {
        LineMetrics {
            heading: 40.0,
            title: 100.0,
            question: 20.0,
            label: 20.0,
            option: 20.0,
            choice_gap: 10.0,
            section_gap: 30.0,
            option_indent: 15.0,
            box_size: 10.0,
            box_drop: 5.0,
        }
    }

    fn three_sections() -> Document {
        Document::new(vec![
            Section::new("Un", vec![Prompt::free_text("Nom")]),
            Section::new("Deux", vec![Prompt::free_text("Ville")]),
            Section::new("Trois", vec![Prompt::choice("Sexe", ["Homme", "Femme"])]),
        ])
    }

    fn config(page_height: f64) -> LayoutConfig {
        LayoutConfig::new(page_height, 50.0, 100.0).with_metrics(round_metrics())
    }

    #[test]
    fn three_sections_fit_on_one_page() {
        let pages = render_document(&three_sections(), &config(800.0)).expect("layout");

        assert_eq!(pages.len(), 1);
        let primitives = &pages[0].primitives;
        assert_eq!(primitives.len(), 10);
        assert_eq!(primitives.iter().filter(|p| p.is_box()).count(), 2);

        let texts: Vec<_> = primitives.iter().filter_map(Primitive::text).collect();
        assert_eq!(
            texts,
            ["Un", "Nom", "Deux", "Ville", "Trois", "Sexe", "Homme", "Femme"]
        );
        assert_eq!(primitives[0].y(), 750.0);
        assert_eq!(pages[0].cursor, 250.0);
    }

    #[test]
    fn third_section_title_moves_to_second_page() {
        let pages = render_document(&three_sections(), &config(500.0)).expect("layout");

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].primitives.len(), 4);
        assert_eq!(pages[0].cursor, 150.0);
        assert_eq!(pages[1].primitives[0].text(), Some("Trois"));
        assert_eq!(pages[1].primitives[0].y(), 450.0);
        assert_eq!(pages[1].primitives.len(), 6);
    }

    #[test]
    fn choice_emits_box_and_text_per_option_in_order() {
        let document = Document::new(vec![Section::new(
            "Achat",
            vec![Prompt::choice("Où ?", ["Marchés", "Pharmacies", "En ligne"])],
        )]);
        let pages = render_document(&document, &config(800.0)).expect("layout");
        let primitives = &pages[0].primitives;

        assert_eq!(primitives.len(), 1 + 1 + 3 * 2);
        let fields: Vec<_> = primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Box { field, tooltip, .. } => Some((field.as_str(), tooltip.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            [
                ("s1_q1_0", "Marchés"),
                ("s1_q1_1", "Pharmacies"),
                ("s1_q1_2", "En ligne")
            ]
        );

        // box, then its label, one option line lower each time
        match (&primitives[2], &primitives[3]) {
            (Primitive::Box { y: box_y, x: box_x, .. }, Primitive::Text { y, x, .. }) => {
                assert_eq!(*y, 630.0);
                assert_eq!(*box_y, 625.0);
                assert_eq!(*x, box_x + 15.0);
            }
            other => panic!("unexpected primitives {other:?}"),
        }
        assert_eq!(primitives[4].y(), 605.0);
    }

    #[test]
    fn empty_document_yields_one_page_with_heading() {
        let document = Document::default().with_heading("Questionnaire");
        let pages = render_document(&document, &config(800.0)).expect("layout");

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].primitives.len(), 1);
        assert_eq!(pages[0].primitives[0].text(), Some("Questionnaire"));

        let pages = render_document(&Document::default(), &config(800.0)).expect("layout");
        assert_eq!(pages.len(), 1);
        assert!(pages[0].primitives.is_empty());
    }

    #[test]
    fn heading_shares_the_first_page() {
        let document = three_sections().with_heading("Titre");
        let pages = render_document(&document, &config(800.0)).expect("layout");
        assert_eq!(pages[0].primitives[0].text(), Some("Titre"));
        assert_eq!(pages[0].primitives[1].y(), 710.0);
    }

    #[test]
    fn oversized_title_on_blank_page_does_not_loop() {
        let document = Document::new(vec![Section::new("Seul", vec![])]);
        let config = LayoutConfig::new(200.0, 50.0, 100.0).with_metrics(round_metrics());
        let pages = render_document(&document, &config).expect("layout");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].primitives.len(), 1);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let document = three_sections();
        let cases = [
            LayoutConfig::new(800.0, 0.0, 10.0),
            LayoutConfig::new(800.0, -5.0, 10.0),
            LayoutConfig::new(50.0, 50.0, 10.0),
            LayoutConfig::new(800.0, 50.0, 750.0),
            LayoutConfig::new(800.0, 50.0, -1.0),
            LayoutConfig::new(f64::NAN, 50.0, 10.0),
            LayoutConfig::new(800.0, 50.0, 10.0).with_metrics(LineMetrics {
                option: -1.0,
                ..LineMetrics::default()
            }),
        ];
        for config in cases {
            let result = render_document(&document, &config);
            assert!(
                matches!(result, Err(LayoutError::InvalidLayoutConfig { .. })),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn cursor_never_increases_within_a_page() {
        let document = crate::domain::questionnaire::blank_questionnaire();
        let pages = render_document(&document, &LayoutConfig::a4()).expect("layout");
        for page in &pages {
            let baselines: Vec<f64> = page
                .primitives
                .iter()
                .filter(|p| !p.is_box())
                .map(Primitive::y)
                .collect();
            assert!(baselines.windows(2).all(|pair| pair[1] <= pair[0]));
        }
    }

    #[test]
    fn fitted_config_keeps_blank_questionnaire_above_bottom_margin() {
        let document = crate::domain::questionnaire::blank_questionnaire();
        let bottom = 2.0 * CM;
        let config = LayoutConfig::a4().fitted_to(&document, bottom);
        let pages = render_document(&document, &config).expect("layout");

        assert!(pages.len() > 1);
        for page in &pages {
            for primitive in &page.primitives {
                assert!(
                    primitive.y() >= bottom - config.metrics.box_drop - 1e-9,
                    "{primitive:?} below the bottom margin"
                );
            }
        }
    }

    #[test]
    fn a4_body_lines_hold_eighty_characters() {
        let config = LayoutConfig::a4();
        assert_eq!(config.body_line_capacity(), 80);

        let narrow = LayoutConfig {
            left_margin: config.page_width / 2.0,
            ..config
        };
        assert_eq!(narrow.body_line_capacity(), 1);
    }

    #[test]
    fn min_space_to_fit_uses_the_tallest_section() {
        let metrics = round_metrics();
        let config = config(800.0);
        let document = three_sections();
        // "Trois": 100 + 20 + 2 * 20 + 10 = 170
        assert_eq!(metrics.section_extent(&document.sections[2]), 170.0);
        assert_eq!(min_space_to_fit(&document, &config, 40.0), 40.0 + 170.0 - 100.0);
        assert_eq!(min_space_to_fit(&Document::default(), &config, 40.0), 40.0);
    }
}
