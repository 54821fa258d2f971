//! PDF documents served over HTTP and written by the CLI.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::render::{
    DocumentInfo, LayoutConfig, LayoutError, RenderError, finalize, record_document,
    render_document,
};
use crate::application::repos::{RepoError, ResponsesRepo};
use crate::config::DocumentSettings;
use crate::domain::document::Document;
use crate::domain::error::DomainError;
use crate::domain::questionnaire::{QUESTIONNAIRE_HEADING, blank_questionnaire};

pub const METRIC_DOCUMENTS_RENDERED: &str = "questionnaire_documents_rendered_total";

const AUTHOR: &str = "Étude de marché – Médecine naturelle";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("response {id} does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A rendered PDF and the filename it should be served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lay out `document` on A4 pages, keeping every section above the
/// configured bottom margin, and serialize it.
fn render_pdf(
    document: &Document,
    info: &DocumentInfo,
    settings: &DocumentSettings,
) -> Result<Vec<u8>, DocumentError> {
    let config =
        page_config(settings).fitted_to(document, settings.min_space_before_break);
    let pages = render_document(document, &config)?;
    debug!(
        target = "application::documents::render_pdf",
        pages = pages.len(),
        min_space = config.min_space_before_break,
        "document laid out"
    );
    Ok(finalize(&pages, info)?)
}

fn page_config(settings: &DocumentSettings) -> LayoutConfig {
    LayoutConfig::a4().with_min_space(settings.min_space_before_break)
}

/// The blank questionnaire, with fillable checkboxes when enabled.
pub fn render_blank_questionnaire(settings: &DocumentSettings) -> Result<Vec<u8>, DocumentError> {
    let info = DocumentInfo {
        author: Some(AUTHOR.to_string()),
        ..DocumentInfo::titled(QUESTIONNAIRE_HEADING)
    }
    .interactive(settings.interactive_checkboxes);

    let bytes = render_pdf(&blank_questionnaire(), &info, settings)?;
    counter!(METRIC_DOCUMENTS_RENDERED, "kind" => "blank").increment(1);
    Ok(bytes)
}

#[derive(Clone)]
pub struct DocumentService {
    responses: Arc<dyn ResponsesRepo>,
    settings: DocumentSettings,
}

impl DocumentService {
    pub fn new(responses: Arc<dyn ResponsesRepo>, settings: DocumentSettings) -> Self {
        Self {
            responses,
            settings,
        }
    }

    pub fn blank_pdf(&self) -> Result<Vec<u8>, DocumentError> {
        render_blank_questionnaire(&self.settings)
    }

    /// One stored response laid out as a read-only questionnaire.
    pub async fn record_pdf(&self, id: i64) -> Result<RenderedPdf, DocumentError> {
        let record = self
            .responses
            .find_response(id)
            .await?
            .ok_or(DocumentError::NotFound { id })?;

        let document = record_document(&record, &page_config(&self.settings))?;
        let info = DocumentInfo {
            author: Some(AUTHOR.to_string()),
            ..DocumentInfo::titled(format!("Réponse n°{id}"))
        };
        let bytes = render_pdf(&document, &info, &self.settings)?;

        counter!(METRIC_DOCUMENTS_RENDERED, "kind" => "record").increment(1);
        info!(
            target = "application::documents::record_pdf",
            id,
            bytes = bytes.len(),
            "response pdf rendered"
        );

        Ok(RenderedPdf {
            filename: format!("reponse_{id}.pdf"),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::memory::MemoryResponses;
    use crate::domain::entities::fixtures::sample_record;
    use crate::domain::schema::LONG_TEXT_MAX_LEN;

    fn service(repo: MemoryResponses) -> DocumentService {
        DocumentService::new(Arc::new(repo), DocumentSettings::default())
    }

    fn count(haystack: &[u8], needle: &str) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle.as_bytes())
            .count()
    }

    #[test]
    fn blank_questionnaire_is_interactive_by_default() {
        let bytes = render_blank_questionnaire(&DocumentSettings::default()).expect("pdf");

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(count(&bytes, "/AcroForm") == 1);
        assert!(count(&bytes, "/FT /Btn") > 0);
    }

    #[test]
    fn blank_questionnaire_can_be_static() {
        let settings = DocumentSettings {
            interactive_checkboxes: false,
            ..DocumentSettings::default()
        };
        let bytes = render_blank_questionnaire(&settings).expect("pdf");

        assert_eq!(count(&bytes, "/AcroForm"), 0);
        assert_eq!(count(&bytes, "/FT /Btn"), 0);
    }

    #[test]
    fn oversized_bottom_margin_fails_the_render_only() {
        let settings = DocumentSettings {
            min_space_before_break: 10_000.0,
            ..DocumentSettings::default()
        };
        let err = render_blank_questionnaire(&settings).expect_err("layout error");
        assert!(matches!(err, DocumentError::Layout(_)));
    }

    #[tokio::test]
    async fn record_pdf_uses_the_response_id() {
        let service = service(MemoryResponses::with_records(vec![sample_record()]));

        let pdf = service.record_pdf(7).await.expect("pdf");
        assert_eq!(pdf.filename, "reponse_7.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(count(&pdf.bytes, "/AcroForm"), 0);
    }

    #[tokio::test]
    async fn record_with_maximal_answers_still_renders() {
        let mut record = sample_record();
        let essay = "x".repeat(LONG_TEXT_MAX_LEN);
        record.suggestions = essay.clone();
        record.comments = essay;
        let service = service(MemoryResponses::with_records(vec![record]));

        let pdf = service.record_pdf(7).await.expect("pdf");
        assert!(count(&pdf.bytes, "/Type /Page ") >= 2);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let service = service(MemoryResponses::default());

        let err = service.record_pdf(42).await.expect_err("missing");
        assert!(matches!(err, DocumentError::NotFound { id: 42 }));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_repo_error() {
        let service = service(MemoryResponses::failing());

        let err = service.record_pdf(1).await.expect_err("store down");
        assert!(matches!(err, DocumentError::Repo(_)));
    }
}
