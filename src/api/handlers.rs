//! HTTP request handlers

use super::assets;
use super::types::{AskRequest, AskResponse, ErrorResponse, SubjectsResponse};
use super::AppState;
use crate::responder::{find_match, Match};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(serve_page))
        // Static assets (embedded or filesystem fallback)
        .route("/static/*path", get(serve_static))
        // Chat turns; replies are never cached
        .route(
            "/ask",
            post(ask).layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .route("/subjects", get(list_subjects))
        .route("/version", get(get_version))
        .fallback(not_found)
        .with_state(state)
}

// ============================================================
// Page and assets
// ============================================================

async fn serve_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    assets::index_html(&state.config.ui_dir)
        .map(Html)
        .ok_or_else(|| AppError::NotFound("index.html not found".to_string()))
}

async fn serve_static(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let asset = format!("static/{path}");
    assets::serve(&state.config.ui_dir, &asset).ok_or_else(|| {
        tracing::debug!(path = %asset, "Static asset not found");
        AppError::NotFound(format!("{asset} not found"))
    })
}

// ============================================================
// Chat
// ============================================================

async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Json<AskResponse> {
    let subject = req.subject_or(&state.config.default_subject);

    let table = state.knowledge.snapshot();
    let found = subject.map_or(Match::UnknownSubject, |subject| {
        find_match(&table, subject, &req.message)
    });

    match found {
        Match::Answer { rule, keyword, .. } => {
            tracing::debug!(?subject, rule, keyword, "Rule matched");
        }
        Match::NoMatch => tracing::debug!(?subject, "No rule matched"),
        Match::UnknownSubject => tracing::info!(?subject, "Unknown subject requested"),
    }

    Json(AskResponse {
        reply: found.reply().to_string(),
    })
}

async fn list_subjects(State(state): State<AppState>) -> Json<SubjectsResponse> {
    let table = state.knowledge.snapshot();
    Json(SubjectsResponse {
        subjects: table.subjects().into_iter().map(str::to_string).collect(),
        default: state.config.default_subject.clone(),
    })
}

async fn get_version() -> &'static str {
    concat!("adaptlearn-chatbot ", env!("CARGO_PKG_VERSION"))
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
