//! Maps a stored response onto a printable [`Document`].

use std::collections::BTreeMap;

use time::macros::format_description;

use super::layout::LayoutConfig;
use crate::domain::{
    document::{Document, Prompt, Section},
    entities::{FieldValue, ResponseRecord},
    error::DomainError,
    schema::{FieldGroup, FieldKind, FieldSpec, RESPONSE_SCHEMA},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub group: FieldGroup,
    pub label: &'static str,
    pub value: String,
}

impl RecordEntry {
    /// `label : value` as body lines of at most `width` characters.
    fn prompts(&self, width: usize) -> impl Iterator<Item = Prompt> {
        wrap_words(&format!("{} : {}", self.label, self.value), width)
            .into_iter()
            .map(Prompt::free_text)
    }
}

/// Greedy word wrap on character counts. Runs of whitespace collapse to one
/// space and words longer than `width` are cut.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            if line_len > 0 && line_len + 1 + piece.len() > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(piece);
            line_len += piece.len();
        }
    }

    if line_len > 0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// One entry per non-relation field of `schema`, in schema order.
pub fn record_entries(
    record: &ResponseRecord,
    schema: &[FieldSpec],
) -> Result<Vec<RecordEntry>, DomainError> {
    schema
        .iter()
        .filter(|spec| !spec.is_relation())
        .map(|spec| {
            let value = record.field_value(spec.name)?;
            Ok(RecordEntry {
                group: spec.group,
                label: spec.label,
                value: display_value(spec, value),
            })
        })
        .collect()
}

fn display_value(spec: &FieldSpec, value: FieldValue) -> String {
    match (spec.kind, value) {
        (_, FieldValue::Absent) => String::new(),
        (FieldKind::Choice(_), FieldValue::Text(raw)) => spec
            .choice_label(&raw)
            .map(str::to_string)
            .unwrap_or(raw),
        (_, FieldValue::Boolean(true)) => "Oui".to_string(),
        (_, FieldValue::Boolean(false)) => "Non".to_string(),
        (_, FieldValue::Timestamp(at)) => at
            .format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
            .unwrap_or_else(|_| at.to_string()),
        (_, other) => other.to_string(),
    }
}

/// The filled-in questionnaire for one response: a section per field group.
///
/// Values are wrapped to the body text width of `config`. A group too tall
/// to fit between the top margin and `min_space_before_break` carries on in
/// "(suite)" sections, so every section can be placed whole on a page.
pub fn record_document(
    record: &ResponseRecord,
    config: &LayoutConfig,
) -> Result<Document, DomainError> {
    let width = config.body_line_capacity();
    let mut groups: BTreeMap<FieldGroup, Vec<Prompt>> = BTreeMap::new();
    for entry in record_entries(record, RESPONSE_SCHEMA)? {
        groups
            .entry(entry.group)
            .or_default()
            .extend(entry.prompts(width));
    }

    let per_section = lines_per_section(config);
    let sections = groups
        .into_iter()
        .flat_map(|(group, prompts)| {
            prompts
                .chunks(per_section)
                .enumerate()
                .map(|(index, chunk)| {
                    let title = match index {
                        0 => group.title().to_string(),
                        _ => format!("{} (suite)", group.title()),
                    };
                    Section::new(title, chunk.to_vec())
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(Document::new(sections).with_heading(format!("Réponse n°{}", record.id)))
}

/// Body lines that fit under one section title within the breakable height.
fn lines_per_section(config: &LayoutConfig) -> usize {
    let metrics = &config.metrics;
    if metrics.question <= 0.0 {
        return usize::MAX;
    }
    let room = config.usable_height() - config.min_space_before_break - metrics.title;
    let lines = room / metrics.question;
    if lines.is_finite() && lines >= 1.0 {
        lines.floor() as usize
    } else {
        1
    }
}
