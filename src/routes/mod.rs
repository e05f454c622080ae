use axum::Router;

use crate::server::AppState;

mod appointments;
mod dashboard;
mod tasks;

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(tasks::create_task_routes())
        .merge(appointments::create_appointment_routes())
        .merge(dashboard::create_dashboard_routes())
}

/// Query parameters bound to empty strings are treated as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
