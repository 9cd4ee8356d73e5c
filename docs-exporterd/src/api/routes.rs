use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use shared::protocol::ABOUT_PATH;
use crate::exporter::http::{render_index, HttpExporter};

#[derive(Clone)]
pub struct AppState {
    pub exporter: Arc<HttpExporter>,
}

/// Representations the index endpoint can produce.
#[derive(Debug, PartialEq, Eq)]
enum Representation {
    Json,
    Html,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ABOUT_PATH, get(get_about))
        .with_state(state)
}

/// Always 200; an empty accumulation renders an empty array or an empty
/// table.
async fn get_about(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let abouts = state.exporter.snapshot();
    match negotiate(&headers) {
        Representation::Json => Json(abouts).into_response(),
        Representation::Html => Html(render_index(&abouts)).into_response(),
    }
}

/// Ordered preference check over the parsed Accept header: JSON wins when
/// the client lists it explicitly, HTML is the fallback for everything else
/// (including `*/*` and an absent header, so browsers get the page).
fn negotiate(headers: &HeaderMap) -> Representation {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    for part in accept.split(',') {
        let media_type = part.split(';').next().unwrap_or("").trim();
        if media_type == "application/json" {
            return Representation::Json;
        }
    }

    Representation::Html
}
