//! Survey response records mirrored from persistent storage.

use std::fmt;

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::error::DomainError;

/// A stored survey response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub sex: String,
    pub city: String,
    pub occupation: String,
    pub knows_natural_medicine: bool,
    pub plant_usage: String,
    pub care_types: String,
    pub frequency: String,
    pub purchase_places: String,
    pub product_type: String,
    pub motivations: String,
    pub purchase_criteria: String,
    pub service_interests: String,
    pub budget: String,
    pub suggestions: String,
    pub comments: String,
    pub created_at: OffsetDateTime,
}

/// A validated response ready to be appended to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDraft {
    pub name: String,
    pub age: Option<i32>,
    pub sex: String,
    pub city: String,
    pub occupation: String,
    pub knows_natural_medicine: bool,
    pub plant_usage: String,
    pub care_types: String,
    pub frequency: String,
    pub purchase_places: String,
    pub product_type: String,
    pub motivations: String,
    pub purchase_criteria: String,
    pub service_interests: String,
    pub budget: String,
    pub suggestions: String,
    pub comments: String,
}

impl ResponseDraft {
    pub fn into_record(self, id: i64, created_at: OffsetDateTime) -> ResponseRecord {
        ResponseRecord {
            id,
            name: self.name,
            age: self.age,
            sex: self.sex,
            city: self.city,
            occupation: self.occupation,
            knows_natural_medicine: self.knows_natural_medicine,
            plant_usage: self.plant_usage,
            care_types: self.care_types,
            frequency: self.frequency,
            purchase_places: self.purchase_places,
            product_type: self.product_type,
            motivations: self.motivations,
            purchase_criteria: self.purchase_criteria,
            service_interests: self.service_interests,
            budget: self.budget,
            suggestions: self.suggestions,
            comments: self.comments,
            created_at,
        }
    }

    /// Store a validated value under its schema name.
    pub fn apply(&mut self, name: &str, value: FieldValue) -> Result<(), DomainError> {
        match (name, value) {
            ("age", FieldValue::Absent) => self.age = None,
            ("age", FieldValue::Integer(age)) => {
                self.age = Some(i32::try_from(age).map_err(|_| DomainError::invalid_value(name))?)
            }
            ("knows_natural_medicine", FieldValue::Boolean(flag)) => {
                self.knows_natural_medicine = flag
            }
            ("age" | "knows_natural_medicine", _) => {
                return Err(DomainError::invalid_value(name));
            }
            (_, FieldValue::Text(text)) => *self.text_slot(name)? = text,
            (_, FieldValue::Absent) => self.text_slot(name)?.clear(),
            _ => return Err(DomainError::invalid_value(name)),
        }
        Ok(())
    }

    fn text_slot(&mut self, name: &str) -> Result<&mut String, DomainError> {
        let slot = match name {
            "name" => &mut self.name,
            "sex" => &mut self.sex,
            "city" => &mut self.city,
            "occupation" => &mut self.occupation,
            "plant_usage" => &mut self.plant_usage,
            "care_types" => &mut self.care_types,
            "frequency" => &mut self.frequency,
            "purchase_places" => &mut self.purchase_places,
            "product_type" => &mut self.product_type,
            "motivations" => &mut self.motivations,
            "purchase_criteria" => &mut self.purchase_criteria,
            "service_interests" => &mut self.service_interests,
            "budget" => &mut self.budget,
            "suggestions" => &mut self.suggestions,
            "comments" => &mut self.comments,
            other => return Err(DomainError::unknown_field(other)),
        };
        Ok(slot)
    }
}

/// Typed value of one schema field on one record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(OffsetDateTime),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Boolean(value) => write!(f, "{value}"),
            FieldValue::Timestamp(value) => match value.format(&Rfc3339) {
                Ok(formatted) => f.write_str(&formatted),
                Err(_) => write!(f, "{value}"),
            },
        }
    }
}

impl ResponseRecord {
    /// Look up a field by its schema name.
    pub fn field_value(&self, name: &str) -> Result<FieldValue, DomainError> {
        let text = |value: &String| FieldValue::Text(value.clone());
        let value = match name {
            "id" => FieldValue::Integer(self.id),
            "name" => text(&self.name),
            "age" => self
                .age
                .map(|age| FieldValue::Integer(age.into()))
                .unwrap_or(FieldValue::Absent),
            "sex" => text(&self.sex),
            "city" => text(&self.city),
            "occupation" => text(&self.occupation),
            "knows_natural_medicine" => FieldValue::Boolean(self.knows_natural_medicine),
            "plant_usage" => text(&self.plant_usage),
            "care_types" => text(&self.care_types),
            "frequency" => text(&self.frequency),
            "purchase_places" => text(&self.purchase_places),
            "product_type" => text(&self.product_type),
            "motivations" => text(&self.motivations),
            "purchase_criteria" => text(&self.purchase_criteria),
            "service_interests" => text(&self.service_interests),
            "budget" => text(&self.budget),
            "suggestions" => text(&self.suggestions),
            "comments" => text(&self.comments),
            "created_at" => FieldValue::Timestamp(self.created_at),
            other => return Err(DomainError::unknown_field(other)),
        };
        Ok(value)
    }

    /// Short human label used in listings.
    pub fn summary(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "Anonyme"
        } else {
            self.name.trim()
        };
        let date = self.created_at.date();
        if self.city.trim().is_empty() {
            format!("{name} ({date})")
        } else {
            format!("{name} - {} ({date})", self.city.trim())
        }
    }
}
