use chrono::{NaiveDate, NaiveTime};

use crate::repositories::{AppointmentInput, TaskInput};

pub const TASK_PRIORITIES: [&str; 4] = ["urgent", "high", "medium", "low"];
pub const TASK_STATUSES: [&str; 4] = ["pending", "in_progress", "done", "postponed"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Checks task input and returns every violation found; an empty vec
/// means the input is valid. Normalization (lower-casing, sanitizing)
/// is deliberately not done here so storage-layer callers can choose
/// whether to validate at all.
pub fn validate_task(input: &TaskInput) -> Vec<String> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("title", &input.title),
        ("category", &input.category),
        ("priority", &input.priority),
        ("status", &input.status),
    ] {
        if is_blank(value) {
            errors.push(format!("Field '{}' is required", field));
        }
    }

    if let Some(priority) = input.priority.as_deref() {
        if !priority.is_empty() && !TASK_PRIORITIES.contains(&priority.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid priority. Must be one of: {}",
                TASK_PRIORITIES.join(", ")
            ));
        }
    }

    if let Some(status) = input.status.as_deref() {
        if !status.is_empty() && !TASK_STATUSES.contains(&status.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid status. Must be one of: {}",
                TASK_STATUSES.join(", ")
            ));
        }
    }

    if let Some(due_date) = input.due_date.as_deref() {
        if !due_date.is_empty() && NaiveDate::parse_from_str(due_date, DATE_FORMAT).is_err() {
            errors.push("Invalid due date. Use YYYY-MM-DD format".to_string());
        }
    }

    if !errors.is_empty() {
        tracing::warn!("task validation failed: {:?}", errors);
    }

    errors
}

/// Same contract as [`validate_task`], for appointments.
pub fn validate_appointment(input: &AppointmentInput) -> Vec<String> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("title", &input.title),
        ("date", &input.date),
        ("start_time", &input.start_time),
        ("end_time", &input.end_time),
    ] {
        if is_blank(value) {
            errors.push(format!("Field '{}' is required", field));
        }
    }

    if let Some(date) = input.date.as_deref() {
        if !date.is_empty() && NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
            errors.push("Invalid date. Use YYYY-MM-DD format".to_string());
        }
    }

    if let (Some(start), Some(end)) = (input.start_time.as_deref(), input.end_time.as_deref()) {
        if !start.is_empty() && !end.is_empty() {
            match (
                NaiveTime::parse_from_str(start, TIME_FORMAT),
                NaiveTime::parse_from_str(end, TIME_FORMAT),
            ) {
                (Ok(start), Ok(end)) => {
                    if end <= start {
                        errors.push("End time must be after start time".to_string());
                    }
                }
                _ => errors.push("Invalid times. Use HH:MM format".to_string()),
            }
        }
    }

    if !errors.is_empty() {
        tracing::warn!("appointment validation failed: {:?}", errors);
    }

    errors
}
