use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::repositories::{AppointmentFilters, AppointmentInput};
use crate::routes::non_empty;
use crate::server::AppState;

pub fn create_appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments",
            get(handle_list_appointments).post(handle_create_appointment),
        )
        .route(
            "/appointments/{id}",
            get(handle_get_appointment)
                .put(handle_update_appointment)
                .delete(handle_delete_appointment),
        )
        .route(
            "/appointments/{id}/next-steps",
            post(handle_generate_next_steps),
        )
}

#[derive(Deserialize)]
struct AppointmentListParams {
    #[serde(alias = "data_inicio")]
    date_from: Option<String>,
    #[serde(alias = "data_fim")]
    date_to: Option<String>,
    #[serde(alias = "palavra_chave")]
    keyword: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

async fn handle_list_appointments(
    State(state): State<AppState>,
    Query(params): Query<AppointmentListParams>,
) -> Result<impl IntoResponse> {
    let filters = AppointmentFilters {
        date_from: non_empty(params.date_from),
        date_to: non_empty(params.date_to),
        keyword: non_empty(params.keyword),
    };
    let has_any =
        filters.date_from.is_some() || filters.date_to.is_some() || filters.keyword.is_some();

    let appointments = state
        .appointment_service
        .list(
            has_any.then_some(filters),
            params.page.as_deref(),
            params.per_page.as_deref(),
        )
        .await?;

    let page = params
        .page
        .as_deref()
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(1);
    let per_page = params
        .per_page
        .as_deref()
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(appointments.len() as i64);

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "meta": { "page": page, "per_page": per_page }
    })))
}

async fn handle_get_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let appointment = state.appointment_service.get(id).await?;
    Ok(Json(json!({ "success": true, "data": appointment })))
}

async fn handle_create_appointment(
    State(state): State<AppState>,
    Json(input): Json<AppointmentInput>,
) -> Result<impl IntoResponse> {
    let appointment = state.appointment_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": appointment })),
    ))
}

async fn handle_update_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AppointmentInput>,
) -> Result<impl IntoResponse> {
    let appointment = state.appointment_service.update(id, input).await?;
    Ok(Json(json!({ "success": true, "data": appointment })))
}

async fn handle_delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.appointment_service.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

#[derive(Deserialize)]
struct NextStepsRequest {
    meeting_notes: Option<String>,
}

async fn handle_generate_next_steps(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NextStepsRequest>,
) -> Result<impl IntoResponse> {
    let notes = body
        .meeting_notes
        .ok_or_else(|| AppError::ValidationError(vec!["Meeting notes not provided".to_string()]))?;

    let next_steps = state
        .appointment_service
        .generate_next_steps(id, &notes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "next_steps": next_steps }
    })))
}
