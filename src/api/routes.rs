use axum::{
    routing::post,
    Router,
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use chrono::Utc;

use crate::error::{Result, AppError};
use crate::api::models::{AnalyzeRequest, AnalyzeResponse};
use crate::api::response;
use crate::parser::SummaryRecord;
use crate::report::{render_report, report_filename};
use crate::scraper::{extract_content, fetch_html, ScrapedContent};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/report", post(report_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Run the pipeline and return the parsed record as JSON.
async fn analyze_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    match run_pipeline(&state, &req.url).await {
        Ok(outcome) => {
            tracing::info!(url = %req.url, "analysis complete");
            response::success(AnalyzeResponse {
                url: req.url,
                summary: outcome.summary,
                scraped_at: Utc::now(),
                word_count: outcome.word_count,
                status: "success".to_string(),
            })
            .into_response()
        }
        Err(err) => error_response(&req.url, err),
    }
}

/// Run the pipeline and return the rendered PDF as a downloadable
/// attachment named with the current date.
async fn report_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let outcome = match run_pipeline(&state, &req.url).await {
        Ok(outcome) => outcome,
        Err(err) => return error_response(&req.url, err),
    };

    match render_report(&outcome.summary) {
        Ok(bytes) => {
            tracing::info!(url = %req.url, bytes = bytes.len(), "report rendered");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", report_filename()),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => error_response(&req.url, err),
    }
}

struct PipelineOutcome {
    summary: SummaryRecord,
    word_count: usize,
}

/// One user action: fetch the page, extract its text, summarize, parse.
///
/// Fetch and extraction failures abort the pipeline. Summarization
/// failures do not: they come back embedded in the record's fields so the
/// caller still gets a (degraded) result to render.
async fn run_pipeline(state: &AppState, url: &str) -> Result<PipelineOutcome> {
    tracing::info!(%url, "fetching page");
    let html = fetch_html(url).await?;

    let text = match extract_content(&html) {
        ScrapedContent::Text(text) => text,
        ScrapedContent::Error(message) => return Err(AppError::ExtractError(message)),
    };
    if text.trim().is_empty() {
        return Err(AppError::ExtractError(
            "No content scraped. Page might be empty or protected.".to_string(),
        ));
    }

    let word_count = text.split_whitespace().count();
    tracing::info!(%url, word_count, chars = text.len(), "content extracted");

    let summary = state.summarizer.summarize(&text).await;

    Ok(PipelineOutcome {
        summary,
        word_count,
    })
}

fn error_response(url: &str, err: AppError) -> Response {
    let (status, msg) = match &err {
        AppError::FetchError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AppError::ExtractError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
        AppError::RenderError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
    };
    tracing::error!(%url, error = %err, "request failed");
    response::error::<()>(status, msg).into_response()
}
