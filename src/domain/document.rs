//! Static description of a printable questionnaire.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    FreeText(String),
    Choice { label: String, options: Vec<String> },
}

impl Prompt {
    pub fn free_text(label: impl Into<String>) -> Self {
        Prompt::FreeText(label.into())
    }

    pub fn choice<I, S>(label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Prompt::Choice {
            label: label.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// A titled group of prompts; the unit of page-break granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub prompts: Vec<Prompt>,
}

impl Section {
    pub fn new(title: impl Into<String>, prompts: Vec<Prompt>) -> Self {
        Self {
            title: title.into(),
            prompts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub heading: Option<String>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            heading: None,
            sections,
        }
    }

    pub fn with_heading(self, heading: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            ..self
        }
    }
}
