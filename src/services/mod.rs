mod appointment_service;
mod dashboard_service;
mod task_service;

pub use appointment_service::AppointmentService;
pub use dashboard_service::DashboardService;
pub use task_service::TaskService;
