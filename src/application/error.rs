use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::documents::DocumentError, application::export::ExportError,
    config::LoadError, domain::error::DomainError,
    infra::error::InfraError, presentation::views::render_error_page,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// A failed request: the status and French copy shown to the respondent, plus
/// the internal detail the logging middleware picks up.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::NOT_FOUND,
            "La page demandée est introuvable.",
            detail,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }

    pub fn report(&self) -> &ErrorReport {
        &self.report
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = render_error_page(self.status, self.public_message);
        self.report.attach(&mut response);
        response
    }
}

impl From<DocumentError> for HttpError {
    fn from(error: DocumentError) -> Self {
        let source = "application::documents::DocumentError";
        match error {
            DocumentError::NotFound { id } => {
                HttpError::not_found(source, format!("response {id} does not exist"))
            }
            DocumentError::Repo(err) => HttpError::from_error(
                source,
                StatusCode::SERVICE_UNAVAILABLE,
                "Le service est temporairement indisponible.",
                &err,
            ),
            other => HttpError::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Le document n'a pas pu être généré.",
                &other,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::Document(DocumentError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Infra(InfraError::Database { .. }) | AppError::Export(ExportError::Repo(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "La page demandée est introuvable.",
            StatusCode::SERVICE_UNAVAILABLE => "Le service est temporairement indisponible.",
            _ => "Une erreur inattendue est survenue.",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = render_error_page(status, self.presentation_message());
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn report_walks_the_source_chain() {
        let error = Outer(std::io::Error::other("disk full"));
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &error);
        assert_eq!(report.messages, ["outer failure", "disk full"]);
    }

    #[test]
    fn missing_record_maps_to_not_found() {
        let error = HttpError::from(DocumentError::NotFound { id: 42 });
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.report().messages, ["response 42 does not exist"]);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }

    #[test]
    fn app_error_statuses() {
        let db = AppError::from(InfraError::connect(sqlx::Error::PoolClosed));
        assert_eq!(db.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let missing = AppError::from(DomainError::not_found("response"));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::unexpected("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
