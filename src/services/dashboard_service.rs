use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::repositories::{Appointment, AppointmentFilters, AppointmentRepository, Task, TaskRepository};
use crate::validation::DATE_FORMAT;

#[derive(Debug, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub postponed: usize,
}

#[derive(Debug, Serialize)]
pub struct PriorityCounts {
    pub urgent: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub by_category: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub today: usize,
    pub next_7_days: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub tasks: TaskStats,
    pub appointments: AppointmentStats,
}

#[derive(Debug, Serialize)]
pub struct UrgentItems {
    pub urgent_tasks: Vec<Task>,
    pub upcoming_appointments: Vec<Appointment>,
}

#[derive(Debug, Default, Serialize)]
pub struct CalendarDay {
    pub appointments: Vec<Appointment>,
    pub tasks: Vec<Task>,
}

/// How close a deadline has to be (in days) before an open task counts
/// as urgent. Overdue tasks always count.
const URGENT_DEADLINE_DAYS: i64 = 3;

pub struct DashboardService {
    tasks: Arc<dyn TaskRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl DashboardService {
    pub fn new(tasks: Arc<dyn TaskRepository>, appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { tasks, appointments }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.stats_on(Local::now().date_naive()).await
    }

    async fn stats_on(&self, today: NaiveDate) -> Result<DashboardStats> {
        let tasks = self.tasks.find_all(None).await?;

        let mut by_status = StatusCounts {
            pending: 0,
            in_progress: 0,
            done: 0,
            postponed: 0,
        };
        let mut by_priority = PriorityCounts {
            urgent: 0,
            high: 0,
            medium: 0,
            low: 0,
        };
        let mut by_category: HashMap<String, usize> = HashMap::new();

        for task in &tasks {
            match task.status.as_str() {
                "pending" => by_status.pending += 1,
                "in_progress" => by_status.in_progress += 1,
                "done" => by_status.done += 1,
                "postponed" => by_status.postponed += 1,
                _ => {}
            }
            match task.priority.as_str() {
                "urgent" => by_priority.urgent += 1,
                "high" => by_priority.high += 1,
                "medium" => by_priority.medium += 1,
                "low" => by_priority.low += 1,
                _ => {}
            }
            *by_category.entry(task.category.clone()).or_insert(0) += 1;
        }

        let appointments = self.appointments.find_all(None, None, None).await?;

        let today_str = today.format(DATE_FORMAT).to_string();
        let week_later = (today + Duration::days(7)).format(DATE_FORMAT).to_string();

        let today_count = appointments
            .iter()
            .filter(|a| a.date.trim() == today_str)
            .count();
        // Lexicographic comparison is chronological for YYYY-MM-DD.
        let next_7_days = appointments
            .iter()
            .filter(|a| a.date.as_str() >= today_str.as_str() && a.date.as_str() <= week_later.as_str())
            .count();

        Ok(DashboardStats {
            tasks: TaskStats {
                total: tasks.len(),
                by_status,
                by_priority,
                by_category,
            },
            appointments: AppointmentStats {
                total: appointments.len(),
                today: today_count,
                next_7_days,
            },
        })
    }

    pub async fn urgent_items(&self) -> Result<UrgentItems> {
        self.urgent_items_on(Local::now().date_naive()).await
    }

    async fn urgent_items_on(&self, today: NaiveDate) -> Result<UrgentItems> {
        let tasks = self.tasks.find_all(None).await?;

        let urgent_tasks = tasks
            .into_iter()
            .filter(|task| task.status != "done" && is_urgent(task, today))
            .collect();

        let today_str = today.format(DATE_FORMAT).to_string();
        let tomorrow_str = (today + Duration::days(1)).format(DATE_FORMAT).to_string();

        let upcoming_appointments = self
            .appointments
            .find_all(None, None, None)
            .await?
            .into_iter()
            .filter(|a| a.date == today_str || a.date == tomorrow_str)
            .collect();

        Ok(UrgentItems {
            urgent_tasks,
            upcoming_appointments,
        })
    }

    /// Buckets the month's appointments and due tasks by day.
    /// Map ordering is unspecified; consumers sort by key as needed.
    pub async fn calendar(&self, year: i32, month: u32) -> Result<HashMap<String, CalendarDay>> {
        let invalid = || AppError::ValidationError(vec!["Invalid year or month".to_string()]);

        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last_day = if month == 12 {
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
                .and_then(|d| d.pred_opt())
                .ok_or_else(invalid)?
        };

        let filters = AppointmentFilters {
            date_from: Some(first_day.format(DATE_FORMAT).to_string()),
            date_to: Some(last_day.format(DATE_FORMAT).to_string()),
            ..Default::default()
        };
        let appointments = self.appointments.find_all(Some(&filters), None, None).await?;

        let tasks = self.tasks.find_all(None).await?;

        let mut calendar: HashMap<String, CalendarDay> = HashMap::new();

        for appointment in appointments {
            calendar
                .entry(appointment.date.clone())
                .or_default()
                .appointments
                .push(appointment);
        }

        for task in tasks {
            let Some(due) = task
                .due_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            else {
                continue;
            };
            if due >= first_day && due <= last_day {
                calendar
                    .entry(due.format(DATE_FORMAT).to_string())
                    .or_default()
                    .tasks
                    .push(task);
            }
        }

        Ok(calendar)
    }
}

fn is_urgent(task: &Task, today: NaiveDate) -> bool {
    if task.priority == "urgent" {
        return true;
    }

    // A malformed deadline never makes a task urgent and never errors.
    task.due_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
        .map_or(false, |due| (due - today).num_days() <= URGENT_DEADLINE_DAYS)
}
