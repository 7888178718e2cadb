use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::status::report::{build_report, render_csv, render_html};
use crate::status::AppState;

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    format: Option<String>,
}

/// Serve the status report. `?format=` selects html (default), json
/// or csv; anything else is a 400.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Response {
    let engine = state.engine.load_full();
    let report = build_report(&engine);

    match query.format.as_deref() {
        None | Some("html") => Html(render_html(&report)).into_response(),
        Some("json") => Json(report).into_response(),
        Some("csv") => (
            [(header::CONTENT_TYPE, "text/csv")],
            render_csv(&report),
        )
            .into_response(),
        Some(other) => (
            StatusCode::BAD_REQUEST,
            format!("unknown format \"{other}\""),
        )
            .into_response(),
    }
}
