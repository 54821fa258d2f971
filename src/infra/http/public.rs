use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Router,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tracing::error;

use crate::{
    application::{
        dashboard::DashboardService,
        documents::DocumentService,
        error::HttpError,
        export::{CSV_FILENAME, ExportService},
        repos::ResponsesRepo,
        responses::{ResponseService, SubmissionOutcome},
    },
    config::DocumentSettings,
    domain::{
        questionnaire::{BLANK_FILENAME, QUESTIONNAIRE_HEADING},
        schema::RESPONSE_SCHEMA,
    },
    presentation::views::{
        DashboardTemplate, FormTemplate, FormView, HomeTemplate, HomeView, LayoutContext,
        ResponsesTemplate, ThanksTemplate, ThanksView, render_not_found_response,
        render_template_response,
    },
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

const FORM_TITLE: &str = "Questionnaire";

#[derive(Clone)]
pub struct HttpState {
    pub responses: Arc<ResponseService>,
    pub export: Arc<ExportService>,
    pub dashboard: Arc<DashboardService>,
    pub documents: Arc<DocumentService>,
}

impl HttpState {
    /// Wire every service onto one response store.
    pub fn new(store: Arc<dyn ResponsesRepo>, documents: DocumentSettings) -> Self {
        Self {
            responses: Arc::new(ResponseService::new(store.clone())),
            export: Arc::new(ExportService::new(store.clone())),
            dashboard: Arc::new(DashboardService::new(store.clone())),
            documents: Arc::new(DocumentService::new(store, documents)),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/questionnaire/", get(show_form).post(submit_form))
        .route("/remplir/", get(show_form).post(submit_form))
        .route("/merci/", get(thanks))
        .route("/generate-pdf/", get(blank_pdf))
        .route("/pdf/{id}/", get(record_pdf))
        .route("/export-csv/", get(export_csv))
        .route("/dashboard/", get(dashboard))
        .route("/liste-reponses/", get(list_responses))
        .route("/test-db/", get(test_db))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn home() -> Response {
    let view = LayoutContext::new(
        "Accueil",
        HomeView {
            heading: QUESTIONNAIRE_HEADING,
        },
    );
    render_template_response(HomeTemplate { view }, StatusCode::OK)
}

async fn show_form() -> Response {
    let view = LayoutContext::new(FORM_TITLE, FormView::blank(RESPONSE_SCHEMA));
    render_template_response(FormTemplate { view }, StatusCode::OK)
}

async fn submit_form(
    State(state): State<HttpState>,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    match state.responses.submit(&values).await {
        Ok(SubmissionOutcome::Saved(_)) => Redirect::to("/merci/").into_response(),
        Ok(SubmissionOutcome::Invalid(errors)) => {
            let form = FormView::from_schema(RESPONSE_SCHEMA, &values, &errors);
            let view = LayoutContext::new(FORM_TITLE, form);
            render_template_response(FormTemplate { view }, StatusCode::OK)
        }
        Err(err) => {
            let form = FormView::from_schema(RESPONSE_SCHEMA, &values, &Default::default())
                .with_general_error(err.public_message());
            let view = LayoutContext::new(FORM_TITLE, form);
            let mut response = render_template_response(FormTemplate { view }, err.status());
            err.report().clone().attach(&mut response);
            response
        }
    }
}

async fn thanks() -> Response {
    let view = LayoutContext::new("Merci", ThanksView);
    render_template_response(ThanksTemplate { view }, StatusCode::OK)
}

async fn blank_pdf(State(state): State<HttpState>) -> Response {
    match state.documents.blank_pdf() {
        Ok(bytes) => pdf_response(bytes, "inline", BLANK_FILENAME),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn record_pdf(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response();
    };

    match state.documents.record_pdf(id).await {
        Ok(pdf) => pdf_response(pdf.bytes, "attachment", &pdf.filename),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn export_csv(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let bytes = state.export.export_csv_response().await?;
    Ok(download_response(
        bytes,
        "text/csv; charset=utf-8",
        "attachment",
        CSV_FILENAME,
    ))
}

async fn dashboard(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let content = state.dashboard.dashboard_view().await?;
    let view = LayoutContext::new("Tableau de bord", content);
    Ok(render_template_response(
        DashboardTemplate { view },
        StatusCode::OK,
    ))
}

async fn list_responses(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let content = state.responses.listing_view().await?;
    let view = LayoutContext::new("Liste des réponses", content);
    Ok(render_template_response(
        ResponsesTemplate { view },
        StatusCode::OK,
    ))
}

async fn test_db(State(state): State<HttpState>) -> Response {
    db_health_response(state.responses.probe().await)
}

async fn fallback() -> Response {
    render_not_found_response()
}

fn pdf_response(bytes: Vec<u8>, disposition: &str, filename: &str) -> Response {
    download_response(bytes, "application/pdf", disposition, filename)
}

fn download_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    disposition: &str,
    filename: &str,
) -> Response {
    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    match HeaderValue::from_str(&format!("{disposition}; filename=\"{filename}\"")) {
        Ok(value) => {
            headers.insert(CONTENT_DISPOSITION, value);
        }
        Err(err) => {
            error!(
                target = "infra::http::public::download_response",
                filename,
                error = %err,
                "content disposition rejected"
            );
            headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static("attachment"));
        }
    }

    response
}
