use chrono::{Duration, Local};
use serde_json::json;
use sqlx::sqlite::SqlitePool;

use crate::error::Result;
use crate::repositories::{
    AppointmentInput, AppointmentRepository, SqliteAppointmentRepository, SqliteTaskRepository,
    TaskInput, TaskRepository,
};
use crate::validation::DATE_FORMAT;

/// Populates the database with sample records for local development.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    tracing::info!("seeding sample data");

    let today = Local::now().date_naive();
    let in_days = |days: i64| (today + Duration::days(days)).format(DATE_FORMAT).to_string();

    let task_repo = SqliteTaskRepository::new(pool.clone());
    let tasks = [
        TaskInput {
            title: Some("Implement user authentication".into()),
            description: Some("Add login and registration with session tokens".into()),
            category: Some("Development".into()),
            keyword: Some("BACKEND".into()),
            priority: Some("high".into()),
            status: Some("in_progress".into()),
            due_date: Some(in_days(5)),
            owners: Some("Joana Silva, Marcos Santos".into()),
            notes: Some("Coordinate with the frontend team on the token format".into()),
            checklist: Some(json!([
                { "item": "Design session schema", "done": true },
                { "item": "Implement login endpoint", "done": false },
                { "item": "Implement logout endpoint", "done": false }
            ])),
        },
        TaskInput {
            title: Some("Review project documentation".into()),
            description: Some("Update the README and add usage examples".into()),
            category: Some("Documentation".into()),
            keyword: Some("DOCS".into()),
            priority: Some("medium".into()),
            status: Some("pending".into()),
            due_date: Some(in_days(7)),
            owners: Some("Ana Costa".into()),
            notes: Some("Include architecture diagrams".into()),
            ..Default::default()
        },
        TaskInput {
            title: Some("Fix signup form bug".into()),
            description: Some("Email validation accepts malformed addresses".into()),
            category: Some("Bug Fix".into()),
            keyword: Some("URGENT".into()),
            priority: Some("urgent".into()),
            status: Some("pending".into()),
            due_date: Some(in_days(1)),
            owners: Some("Pedro Oliveira".into()),
            notes: Some("Reported by a premium customer".into()),
            ..Default::default()
        },
        TaskInput {
            title: Some("Optimize database queries".into()),
            description: Some("Add indexes and improve slow report queries".into()),
            category: Some("Performance".into()),
            keyword: Some("OPTIMIZATION".into()),
            priority: Some("medium".into()),
            status: Some("postponed".into()),
            due_date: Some(in_days(14)),
            owners: Some("Carlos Mendes".into()),
            notes: Some("Waiting for infra approval".into()),
            ..Default::default()
        },
        TaskInput {
            title: Some("Publish release notes".into()),
            description: Some("Summarize the changes shipped last sprint".into()),
            category: Some("Documentation".into()),
            keyword: Some("RELEASE".into()),
            priority: Some("low".into()),
            status: Some("done".into()),
            due_date: Some(in_days(-2)),
            owners: Some("Ana Costa".into()),
            ..Default::default()
        },
    ];
    for task in &tasks {
        task_repo.create(task).await?;
    }

    let appointment_repo = SqliteAppointmentRepository::new(pool.clone());
    let appointments = [
        AppointmentInput {
            title: Some("Sprint planning".into()),
            participants: Some("Whole team".into()),
            main_subject: Some("Next sprint scope".into()),
            keyword: Some("PLANNING".into()),
            location_or_link: Some("https://meet.example.com/sprint".into()),
            date: Some(in_days(0)),
            start_time: Some("10:00".into()),
            end_time: Some("11:30".into()),
            objective: Some("Commit to the sprint backlog".into()),
            ..Default::default()
        },
        AppointmentInput {
            title: Some("Client status call".into()),
            participants: Some("Joana Silva, client stakeholders".into()),
            main_subject: Some("Delivery progress".into()),
            keyword: Some("CLIENT".into()),
            location_or_link: Some("Meeting room 2".into()),
            date: Some(in_days(1)),
            start_time: Some("14:00".into()),
            end_time: Some("15:00".into()),
            reminders: Some("Bring the burn-down chart".into()),
            ..Default::default()
        },
        AppointmentInput {
            title: Some("Architecture review".into()),
            participants: Some("Backend guild".into()),
            main_subject: Some("Storage layer redesign".into()),
            keyword: Some("ARCHITECTURE".into()),
            location_or_link: Some("https://meet.example.com/arch".into()),
            date: Some(in_days(3)),
            start_time: Some("09:00".into()),
            end_time: Some("10:30".into()),
            ..Default::default()
        },
        AppointmentInput {
            title: Some("Quarterly retrospective".into()),
            participants: Some("Whole team".into()),
            main_subject: Some("What went well and what did not".into()),
            keyword: Some("RETRO".into()),
            location_or_link: Some("Main auditorium".into()),
            date: Some(in_days(10)),
            start_time: Some("16:00".into()),
            end_time: Some("17:00".into()),
            ..Default::default()
        },
    ];
    for appointment in &appointments {
        appointment_repo.create(appointment).await?;
    }

    tracing::info!(
        "seeded {} tasks and {} appointments",
        tasks.len(),
        appointments.len()
    );
    Ok(())
}
