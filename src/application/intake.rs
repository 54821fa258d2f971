//! Schema-driven validation of submitted questionnaire forms.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{
    entities::{FieldValue, ResponseDraft},
    schema::{ChoiceOption, FieldKind, FieldSpec},
};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }
}

/// Validate `form` against `schema`.
///
/// Every field is optional. Keys outside the schema are ignored, as are
/// store-assigned fields.
pub fn validate_submission(
    form: &HashMap<String, String>,
    schema: &[FieldSpec],
) -> Result<ResponseDraft, FieldErrors> {
    let mut draft = ResponseDraft::default();
    let mut errors = FieldErrors::default();

    for spec in schema.iter().filter(|spec| spec.is_editable()) {
        let raw = form.get(spec.name).map(|value| value.trim()).unwrap_or("");
        match parse_value(spec, raw) {
            Ok(value) => {
                if let Err(err) = draft.apply(spec.name, value) {
                    errors.push(spec.name, err.to_string());
                }
            }
            Err(message) => errors.push(spec.name, message),
        }
    }

    if errors.is_empty() {
        Ok(draft)
    } else {
        Err(errors)
    }
}

fn parse_value(spec: &FieldSpec, raw: &str) -> Result<FieldValue, String> {
    match spec.kind {
        FieldKind::Boolean => Ok(FieldValue::Boolean(checkbox_checked(raw))),
        _ if raw.is_empty() => Ok(FieldValue::Absent),
        FieldKind::Text { max_len } | FieldKind::LongText { max_len } => {
            let length = raw.chars().count();
            if length > max_len {
                return Err(format!(
                    "Assurez-vous que cette valeur comporte au plus {max_len} caractères \
                     (actuellement {length})."
                ));
            }
            Ok(FieldValue::Text(raw.to_string()))
        }
        FieldKind::Integer { min } => {
            let number: i32 = raw
                .parse()
                .map_err(|_| "Saisissez un nombre entier.".to_string())?;
            if i64::from(number) < min {
                return Err(format!(
                    "Assurez-vous que cette valeur est supérieure ou égale à {min}."
                ));
            }
            Ok(FieldValue::Integer(number.into()))
        }
        FieldKind::Choice(options) => parse_choice(options, raw),
        FieldKind::Identifier | FieldKind::Timestamp | FieldKind::Relation => {
            Ok(FieldValue::Absent)
        }
    }
}

fn parse_choice(options: &[ChoiceOption], raw: &str) -> Result<FieldValue, String> {
    if options.iter().any(|option| option.value == raw) {
        Ok(FieldValue::Text(raw.to_string()))
    } else {
        Err(format!(
            "Sélectionnez un choix valide. {raw} n'est pas un choix disponible."
        ))
    }
}

fn checkbox_checked(raw: &str) -> bool {
    !matches!(raw.to_ascii_lowercase().as_str(), "" | "false" | "0" | "off")
}
