use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::server::AppState;

pub fn create_dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(handle_stats))
        .route("/dashboard/urgent", get(handle_urgent_items))
        .route("/dashboard/calendar", get(handle_calendar))
}

async fn handle_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.dashboard_service.stats().await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

async fn handle_urgent_items(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.dashboard_service.urgent_items().await?;
    Ok(Json(json!({ "success": true, "data": items })))
}

#[derive(Deserialize)]
struct CalendarParams {
    year: Option<i32>,
    month: Option<u32>,
}

async fn handle_calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<impl IntoResponse> {
    let now = Local::now().date_naive();
    let year = params.year.unwrap_or_else(|| now.year());
    let month = params.month.unwrap_or_else(|| now.month());

    let calendar = state.dashboard_service.calendar(year, month).await?;
    Ok(Json(json!({ "success": true, "data": calendar })))
}
