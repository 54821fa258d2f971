use std::collections::HashMap;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::intake::FieldErrors;
use crate::domain::schema::{FieldGroup, FieldKind, FieldSpec};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "La page n'a pas pu être affichée.",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// HTML error page for `status`. Falls back to plain text when the template
/// itself cannot render, so it never recurses through [`HttpError`].
pub fn render_error_page(status: StatusCode, message: &str) -> Response {
    let view = LayoutContext::new(
        ErrorPageView::title_for(status),
        ErrorPageView::new(status, message),
    );
    match (ErrorTemplate { view }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message.to_string()).into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let mut response = render_error_page(StatusCode::NOT_FOUND, ErrorPageView::NOT_FOUND_MESSAGE);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: &'static str,
    pub href: &'static str,
}

const NAVIGATION: &[NavigationLinkView] = &[
    NavigationLinkView {
        label: "Accueil",
        href: "/",
    },
    NavigationLinkView {
        label: "Remplir le questionnaire",
        href: "/questionnaire/",
    },
    NavigationLinkView {
        label: "Questionnaire PDF",
        href: "/generate-pdf/",
    },
    NavigationLinkView {
        label: "Tableau de bord",
        href: "/dashboard/",
    },
    NavigationLinkView {
        label: "Réponses",
        href: "/liste-reponses/",
    },
];

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub meta: PageMetaView,
    pub navigation: Vec<NavigationLinkView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(title: impl Into<String>, content: T) -> Self {
        Self {
            meta: PageMetaView {
                title: title.into(),
            },
            navigation: NAVIGATION.to_vec(),
            content,
        }
    }
}

pub struct HomeView {
    pub heading: &'static str,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeView>,
}

pub struct FormOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub struct FormFieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub is_text: bool,
    pub is_textarea: bool,
    pub is_number: bool,
    pub is_checkbox: bool,
    pub is_select: bool,
    pub checked: bool,
    pub max_len: usize,
    pub min: i64,
    pub options: Vec<FormOptionView>,
    pub errors: Vec<String>,
}

impl FormFieldView {
    fn from_spec(spec: &FieldSpec, raw: &str, errors: &[String]) -> Self {
        let mut view = Self {
            name: spec.name,
            label: spec.label,
            value: raw.to_string(),
            is_text: false,
            is_textarea: false,
            is_number: false,
            is_checkbox: false,
            is_select: false,
            checked: false,
            max_len: 0,
            min: 0,
            options: Vec::new(),
            errors: errors.to_vec(),
        };
        match spec.kind {
            FieldKind::Text { max_len } => {
                view.is_text = true;
                view.max_len = max_len;
            }
            FieldKind::LongText { max_len } => {
                view.is_textarea = true;
                view.max_len = max_len;
            }
            FieldKind::Integer { min } => {
                view.is_number = true;
                view.min = min;
            }
            FieldKind::Boolean => {
                view.is_checkbox = true;
                view.checked = !matches!(raw, "" | "false" | "0" | "off");
            }
            FieldKind::Choice(options) => {
                view.is_select = true;
                view.options = options
                    .iter()
                    .map(|option| FormOptionView {
                        value: option.value,
                        label: option.label,
                        selected: option.value == raw,
                    })
                    .collect();
            }
            FieldKind::Identifier | FieldKind::Timestamp | FieldKind::Relation => {}
        }
        view
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct FormGroupView {
    pub title: &'static str,
    pub fields: Vec<FormFieldView>,
}

pub struct FormView {
    pub groups: Vec<FormGroupView>,
    pub error_count: usize,
    pub general_error: Option<String>,
}

impl FormView {
    /// Editable fields of `schema` grouped by section, prefilled with
    /// `values` and annotated with `errors`.
    pub fn from_schema(
        schema: &[FieldSpec],
        values: &HashMap<String, String>,
        errors: &FieldErrors,
    ) -> Self {
        let mut groups: Vec<(FieldGroup, Vec<FormFieldView>)> = Vec::new();
        for spec in schema.iter().filter(|spec| spec.is_editable()) {
            let raw = values.get(spec.name).map(String::as_str).unwrap_or("");
            let field = FormFieldView::from_spec(spec, raw, errors.messages_for(spec.name));
            match groups.last_mut() {
                Some((group, fields)) if *group == spec.group => fields.push(field),
                _ => groups.push((spec.group, vec![field])),
            }
        }

        Self {
            groups: groups
                .into_iter()
                .map(|(group, fields)| FormGroupView {
                    title: group.title(),
                    fields,
                })
                .collect(),
            error_count: errors.len(),
            general_error: None,
        }
    }

    pub fn blank(schema: &[FieldSpec]) -> Self {
        Self::from_schema(schema, &HashMap::new(), &FieldErrors::default())
    }

    pub fn with_general_error(self, message: impl Into<String>) -> Self {
        Self {
            general_error: Some(message.into()),
            ..self
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormTemplate {
    pub view: LayoutContext<FormView>,
}

pub struct ThanksView;

#[derive(Template)]
#[template(path = "thanks.html")]
pub struct ThanksTemplate {
    pub view: LayoutContext<ThanksView>,
}

pub struct DistributionRowView {
    pub label: String,
    pub count: i64,
    pub percent: String,
}

pub struct DistributionView {
    pub title: &'static str,
    pub rows: Vec<DistributionRowView>,
    /// `{"labels": [...], "data": [...]}` for the chart widget.
    pub chart_json: String,
}

impl DistributionView {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

pub struct DashboardView {
    pub total: i64,
    pub average_age: String,
    pub distributions: Vec<DistributionView>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub view: LayoutContext<DashboardView>,
}

pub struct ResponseRowView {
    pub id: i64,
    pub summary: String,
    pub created_at: String,
    pub pdf_href: String,
}

pub struct ResponsesView {
    pub rows: Vec<ResponseRowView>,
}

impl ResponsesView {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Template)]
#[template(path = "responses.html")]
pub struct ResponsesTemplate {
    pub view: LayoutContext<ResponsesView>,
}

pub struct ErrorPageView {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
    pub primary_action: ErrorAction,
}

impl ErrorPageView {
    pub const NOT_FOUND_MESSAGE: &'static str = "La page demandée est introuvable.";

    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status: status.as_u16(),
            title: Self::title_for(status),
            message: message.to_string(),
            primary_action: ErrorAction::home(),
        }
    }

    fn title_for(status: StatusCode) -> &'static str {
        match status {
            StatusCode::NOT_FOUND => "Page introuvable",
            StatusCode::SERVICE_UNAVAILABLE => "Service indisponible",
            status if status.is_client_error() => "Requête invalide",
            _ => "Erreur serveur",
        }
    }
}

pub struct ErrorAction {
    pub href: &'static str,
    pub label: &'static str,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/",
            label: "Retour à l'accueil",
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::RESPONSE_SCHEMA;

    #[test]
    fn blank_form_lists_editable_fields_by_section() {
        let view = FormView::blank(RESPONSE_SCHEMA);

        assert_eq!(view.groups.len(), 6);
        assert_eq!(view.groups[0].title, FieldGroup::General.title());
        let names: Vec<_> = view.groups[0].fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["name", "age", "sex", "city", "occupation"]);
        let total: usize = view.groups.iter().map(|g| g.fields.len()).sum();
        assert_eq!(total, RESPONSE_SCHEMA.len() - 2);
        assert!(!view.has_errors());
    }

    #[test]
    fn submitted_values_and_errors_are_carried() {
        let values: HashMap<String, String> = [
            ("sex".to_string(), "Femme".to_string()),
            ("knows_natural_medicine".to_string(), "on".to_string()),
            ("age".to_string(), "abc".to_string()),
        ]
        .into_iter()
        .collect();
        let mut errors = FieldErrors::default();
        errors.push("age", "Saisissez un nombre entier.");

        let view = FormView::from_schema(RESPONSE_SCHEMA, &values, &errors);
        let field = |name: &str| {
            view.groups
                .iter()
                .flat_map(|group| group.fields.iter())
                .find(|field| field.name == name)
                .expect("field")
        };

        assert!(view.has_errors());
        assert_eq!(field("age").value, "abc");
        assert!(field("age").has_errors());
        assert!(field("knows_natural_medicine").checked);
        let selected: Vec<_> = field("sex")
            .options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect();
        assert_eq!(selected, ["Femme"]);
    }

    #[test]
    fn error_page_is_html_with_status() {
        let response = render_error_page(StatusCode::SERVICE_UNAVAILABLE, "Indisponible");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let html = ErrorTemplate {
            view: LayoutContext::new(
                "Page introuvable",
                ErrorPageView::new(StatusCode::NOT_FOUND, ErrorPageView::NOT_FOUND_MESSAGE),
            ),
        }
        .render()
        .expect("render");
        assert!(html.contains("404"));
        assert!(html.contains("La page demandée est introuvable."));
    }
}
