use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sqlx::sqlite::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use serde_json::json;

use crate::config::Config;
use crate::repositories::{
    AppointmentRepository, SqliteAppointmentRepository, SqliteTaskRepository, TaskRepository,
};
use crate::routes::create_api_routes;
use crate::services::{AppointmentService, DashboardService, TaskService};

/// Shared application state: configuration plus the service layer.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub task_service: Arc<TaskService>,
    pub appointment_service: Arc<AppointmentService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let task_repo: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let appointment_repo: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(pool));

        Self {
            config: Arc::new(config),
            task_service: Arc::new(TaskService::new(task_repo.clone())),
            appointment_service: Arc::new(AppointmentService::new(appointment_repo.clone())),
            dashboard_service: Arc::new(DashboardService::new(task_repo, appointment_repo)),
        }
    }
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let allowed_origins = state.config.server.get_allowed_origins(&addr)?;

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(vec![header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(handle_index))
        .nest("/api", create_api_routes())
        .fallback(handle_not_found)
        .with_state(state)
        .layer(cors);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": { "service": "agenda-server", "version": env!("CARGO_PKG_VERSION") }
    }))
}

async fn handle_not_found() -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Resource not found" })),
    )
}
