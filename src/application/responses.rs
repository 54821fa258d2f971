use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use metrics::counter;
use time::macros::format_description;
use tracing::{info, warn};

use crate::application::error::HttpError;
use crate::application::intake::{FieldErrors, validate_submission};
use crate::application::repos::{RepoError, ResponsesRepo};
use crate::domain::entities::ResponseRecord;
use crate::domain::schema::RESPONSE_SCHEMA;
use crate::presentation::views::{ResponseRowView, ResponsesView};

pub const METRIC_RESPONSES_SUBMITTED: &str = "questionnaire_responses_submitted_total";
pub const METRIC_VALIDATION_FAILURES: &str = "questionnaire_validation_failures_total";

const SOURCE: &str = "application::responses::ResponseService";

#[derive(Debug)]
pub enum SubmissionOutcome {
    Saved(ResponseRecord),
    Invalid(FieldErrors),
}

#[derive(Clone)]
pub struct ResponseService {
    responses: Arc<dyn ResponsesRepo>,
}

impl ResponseService {
    pub fn new(responses: Arc<dyn ResponsesRepo>) -> Self {
        Self { responses }
    }

    /// Validate and store one submitted form.
    pub async fn submit(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<SubmissionOutcome, HttpError> {
        let draft = match validate_submission(form, RESPONSE_SCHEMA) {
            Ok(draft) => draft,
            Err(errors) => {
                counter!(METRIC_VALIDATION_FAILURES).increment(1);
                info!(
                    target = "application::responses::submit",
                    fields = errors.len(),
                    "submission rejected"
                );
                return Ok(SubmissionOutcome::Invalid(errors));
            }
        };

        let record = self
            .responses
            .insert_response(draft)
            .await
            .map_err(|err| repo_failure("insert_response", err))?;

        counter!(METRIC_RESPONSES_SUBMITTED).increment(1);
        info!(
            target = "application::responses::submit",
            id = record.id,
            "response stored"
        );
        Ok(SubmissionOutcome::Saved(record))
    }

    pub async fn list(&self) -> Result<Vec<ResponseRecord>, HttpError> {
        self.responses
            .list_responses()
            .await
            .map_err(|err| repo_failure("list_responses", err))
    }

    /// Listing rows, newest first, each linking to its PDF.
    pub async fn listing_view(&self) -> Result<ResponsesView, HttpError> {
        let records = self.list().await?;
        Ok(ResponsesView {
            rows: records.iter().map(response_row).collect(),
        })
    }

    pub async fn find(&self, id: i64) -> Result<Option<ResponseRecord>, HttpError> {
        self.responses
            .find_response(id)
            .await
            .map_err(|err| repo_failure("find_response", err))
    }

    /// Database connectivity probe.
    pub async fn probe(&self) -> Result<(), RepoError> {
        self.responses.health_check().await.inspect_err(|err| {
            warn!(
                target = "application::responses::probe",
                error = %err,
                "database probe failed"
            );
        })
    }
}

fn response_row(record: &ResponseRecord) -> ResponseRowView {
    ResponseRowView {
        id: record.id,
        summary: record.summary(),
        created_at: record
            .created_at
            .format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
            .unwrap_or_else(|_| record.created_at.to_string()),
        pdf_href: format!("/pdf/{}/", record.id),
    }
}

fn repo_failure(operation: &'static str, err: RepoError) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::SERVICE_UNAVAILABLE,
        "Le service est temporairement indisponible. Veuillez réessayer plus tard.",
        format!("{operation} failed: {err}"),
    )
}
