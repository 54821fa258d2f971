//! CSV export of every stored response.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::info;

use crate::application::error::HttpError;
use crate::application::repos::{RepoError, ResponsesRepo};
use crate::domain::entities::ResponseRecord;
use crate::domain::error::DomainError;
use crate::domain::schema::{FieldSpec, RESPONSE_SCHEMA, exportable_field_names};

pub const CSV_FILENAME: &str = "reponses_questionnaire.csv";

const SOURCE: &str = "application::export::ExportService";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv buffer: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Serialize `records` as CSV: a header row with the exportable field names
/// of `schema`, then one row per record in the given order.
pub fn write_csv(records: &[ResponseRecord], schema: &[FieldSpec]) -> Result<Vec<u8>, ExportError> {
    let header = exportable_field_names(schema);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;

    for record in records {
        let row = header
            .iter()
            .map(|name| record.field_value(name).map(|value| value.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|err| err.into_error().into())
}

#[derive(Clone)]
pub struct ExportService {
    responses: Arc<dyn ResponsesRepo>,
}

impl ExportService {
    pub fn new(responses: Arc<dyn ResponsesRepo>) -> Self {
        Self { responses }
    }

    /// All responses, oldest first, against the live schema.
    pub async fn export_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut records = self.responses.list_responses().await?;
        records.sort_by_key(|record| record.id);

        let bytes = write_csv(&records, RESPONSE_SCHEMA)?;
        info!(
            target = "application::export::export_csv",
            rows = records.len(),
            bytes = bytes.len(),
            "csv export built"
        );
        Ok(bytes)
    }

    pub async fn export_csv_response(&self) -> Result<Vec<u8>, HttpError> {
        self.export_csv().await.map_err(|err| {
            HttpError::from_error(
                SOURCE,
                StatusCode::SERVICE_UNAVAILABLE,
                "L'export n'a pas pu être généré.",
                &err,
            )
        })
    }
}
