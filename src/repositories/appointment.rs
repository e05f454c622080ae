use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{AppError, Result};
use crate::repositories::{apply_predicates, Predicate};
use crate::sanitize::sanitize;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub title: String,
    pub participants: String,
    pub main_subject: String,
    pub keyword: String,
    pub location_or_link: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub objective: String,
    pub reminders: String,
    pub meeting_notes: String,
    pub next_steps: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentInput {
    pub title: Option<String>,
    pub participants: Option<String>,
    pub main_subject: Option<String>,
    pub keyword: Option<String>,
    pub location_or_link: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub objective: Option<String>,
    pub reminders: Option<String>,
    pub meeting_notes: Option<String>,
    pub next_steps: Option<String>,
}

impl AppointmentInput {
    pub fn merged_with(&self, existing: &Appointment) -> AppointmentInput {
        AppointmentInput {
            title: self.title.clone().or_else(|| Some(existing.title.clone())),
            participants: self
                .participants
                .clone()
                .or_else(|| Some(existing.participants.clone())),
            main_subject: self
                .main_subject
                .clone()
                .or_else(|| Some(existing.main_subject.clone())),
            keyword: self
                .keyword
                .clone()
                .or_else(|| Some(existing.keyword.clone())),
            location_or_link: self
                .location_or_link
                .clone()
                .or_else(|| Some(existing.location_or_link.clone())),
            date: self.date.clone().or_else(|| Some(existing.date.clone())),
            start_time: self
                .start_time
                .clone()
                .or_else(|| Some(existing.start_time.clone())),
            end_time: self
                .end_time
                .clone()
                .or_else(|| Some(existing.end_time.clone())),
            objective: self
                .objective
                .clone()
                .or_else(|| Some(existing.objective.clone())),
            reminders: self
                .reminders
                .clone()
                .or_else(|| Some(existing.reminders.clone())),
            meeting_notes: self
                .meeting_notes
                .clone()
                .or_else(|| Some(existing.meeting_notes.clone())),
            next_steps: self
                .next_steps
                .clone()
                .or_else(|| Some(existing.next_steps.clone())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilters {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub keyword: Option<String>,
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, input: &AppointmentInput) -> Result<i64>;
    async fn find_all(
        &self,
        filters: Option<&AppointmentFilters>,
        page: Option<&str>,
        per_page: Option<&str>,
    ) -> Result<Vec<Appointment>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>>;
    async fn update(&self, id: i64, input: &AppointmentInput) -> Result<u64>;
    async fn delete(&self, id: i64) -> Result<u64>;
}

pub struct SqliteAppointmentRepository {
    pool: SqlitePool,
}

impl SqliteAppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    async fn create(&self, input: &AppointmentInput) -> Result<i64> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO appointments (
                title, participants, main_subject, keyword, location_or_link,
                date, start_time, end_time, objective, reminders,
                meeting_notes, next_steps, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(sanitize(input.title.as_deref()))
        .bind(sanitize(input.participants.as_deref()))
        .bind(sanitize(input.main_subject.as_deref()))
        .bind(sanitize(input.keyword.as_deref()))
        .bind(sanitize(input.location_or_link.as_deref()))
        .bind(input.date.as_deref().unwrap_or_default())
        .bind(input.start_time.as_deref().unwrap_or_default())
        .bind(input.end_time.as_deref().unwrap_or_default())
        .bind(sanitize(input.objective.as_deref()))
        .bind(sanitize(input.reminders.as_deref()))
        .bind(sanitize(input.meeting_notes.as_deref()))
        .bind(sanitize(input.next_steps.as_deref()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::info!("appointment created with id {}", id);
        Ok(id)
    }

    async fn find_all(
        &self,
        filters: Option<&AppointmentFilters>,
        page: Option<&str>,
        per_page: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        let mut predicates = Vec::new();
        if let Some(filters) = filters {
            if let Some(date_from) = &filters.date_from {
                predicates.push(Predicate::Gte("date", date_from.clone()));
            }
            if let Some(date_to) = &filters.date_to {
                predicates.push(Predicate::Lte("date", date_to.clone()));
            }
            if let Some(keyword) = &filters.keyword {
                predicates.push(Predicate::LikeAny(&["keyword", "title"], keyword.clone()));
            }
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM appointments WHERE 1=1");
        apply_predicates(&mut builder, predicates);
        builder.push(" ORDER BY date ASC, start_time ASC");

        // Pagination only applies when both values parse; anything else
        // silently falls back to the full result.
        if let (Some(page), Some(per_page)) = (page, per_page) {
            if let (Ok(page), Ok(per_page)) = (page.parse::<i64>(), per_page.parse::<i64>()) {
                builder.push(" LIMIT ");
                builder.push_bind(per_page);
                builder.push(" OFFSET ");
                builder.push_bind((page - 1) * per_page);
            }
        }

        builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn update(&self, id: i64, input: &AppointmentInput) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE appointments SET ");
        let mut recognized = 0usize;

        {
            let mut sets = builder.separated(", ");

            let sanitized_fields = [
                ("title", input.title.as_deref()),
                ("participants", input.participants.as_deref()),
                ("main_subject", input.main_subject.as_deref()),
                ("keyword", input.keyword.as_deref()),
                ("location_or_link", input.location_or_link.as_deref()),
                ("objective", input.objective.as_deref()),
                ("reminders", input.reminders.as_deref()),
                ("meeting_notes", input.meeting_notes.as_deref()),
                ("next_steps", input.next_steps.as_deref()),
            ];
            for (column, value) in sanitized_fields {
                if let Some(value) = value {
                    sets.push(format!("{} = ", column));
                    sets.push_bind_unseparated(sanitize(Some(value)));
                    recognized += 1;
                }
            }

            let raw_fields = [
                ("date", input.date.as_deref()),
                ("start_time", input.start_time.as_deref()),
                ("end_time", input.end_time.as_deref()),
            ];
            for (column, value) in raw_fields {
                if let Some(value) = value {
                    sets.push(format!("{} = ", column));
                    sets.push_bind_unseparated(value.to_string());
                    recognized += 1;
                }
            }

            if recognized == 0 {
                return Ok(0);
            }

            sets.push("updated_at = ");
            sets.push_bind_unseparated(Utc::now());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!("appointment {} updated", id);
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "appointment {} delete, rows affected: {}",
            id,
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn input(title: &str, date: &str, start: &str) -> AppointmentInput {
        AppointmentInput {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            start_time: Some(start.to_string()),
            end_time: Some("23:59".to_string()),
            ..Default::default()
        }
    }

    async fn repo() -> SqliteAppointmentRepository {
        SqliteAppointmentRepository::new(memory_pool().await)
    }

    #[tokio::test]
    async fn find_all_orders_by_date_then_start_time() {
        let repo = repo().await;
        repo.create(&input("late", "2025-04-02", "09:00")).await.unwrap();
        repo.create(&input("second", "2025-04-01", "14:00")).await.unwrap();
        repo.create(&input("first", "2025-04-01", "08:30")).await.unwrap();

        let appointments = repo.find_all(None, None, None).await.unwrap();
        let titles: Vec<&str> = appointments.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "late"]);
    }

    #[tokio::test]
    async fn date_range_bounds_are_inclusive() {
        let repo = repo().await;
        repo.create(&input("before", "2025-03-31", "10:00")).await.unwrap();
        repo.create(&input("start", "2025-04-01", "10:00")).await.unwrap();
        repo.create(&input("end", "2025-04-30", "10:00")).await.unwrap();
        repo.create(&input("after", "2025-05-01", "10:00")).await.unwrap();

        let filters = AppointmentFilters {
            date_from: Some("2025-04-01".to_string()),
            date_to: Some("2025-04-30".to_string()),
            ..Default::default()
        };
        let appointments = repo.find_all(Some(&filters), None, None).await.unwrap();
        let titles: Vec<&str> = appointments.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["start", "end"]);
    }

    #[tokio::test]
    async fn keyword_filter_matches_keyword_or_title() {
        let repo = repo().await;
        let mut by_keyword = input("status call", "2025-04-01", "10:00");
        by_keyword.keyword = Some("PLANNING".to_string());
        repo.create(&by_keyword).await.unwrap();

        repo.create(&input("planning session", "2025-04-02", "10:00"))
            .await
            .unwrap();
        repo.create(&input("retro", "2025-04-03", "10:00")).await.unwrap();

        let filters = AppointmentFilters {
            keyword: Some("plan".to_string()),
            ..Default::default()
        };
        let appointments = repo.find_all(Some(&filters), None, None).await.unwrap();
        assert_eq!(appointments.len(), 2);
    }

    #[tokio::test]
    async fn pagination_applies_limit_and_offset() {
        let repo = repo().await;
        for day in 1..=5 {
            repo.create(&input(
                &format!("day {}", day),
                &format!("2025-04-{:02}", day),
                "10:00",
            ))
            .await
            .unwrap();
        }

        let page = repo.find_all(None, Some("2"), Some("2")).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["day 3", "day 4"]);
    }

    #[tokio::test]
    async fn unparseable_pagination_is_silently_skipped() {
        let repo = repo().await;
        for day in 1..=3 {
            repo.create(&input(
                &format!("day {}", day),
                &format!("2025-04-{:02}", day),
                "10:00",
            ))
            .await
            .unwrap();
        }

        let all = repo.find_all(None, Some("abc"), Some("2")).await.unwrap();
        assert_eq!(all.len(), 3);

        let also_all = repo.find_all(None, Some("1"), None).await.unwrap();
        assert_eq!(also_all.len(), 3);
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let repo = repo().await;
        let id = repo.create(&input("sync", "2025-04-01", "10:00")).await.unwrap();

        let rows = repo
            .update(
                id,
                &AppointmentInput {
                    meeting_notes: Some("Decided to ship on Friday".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let appointment = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(appointment.meeting_notes, "Decided to ship on Friday");
        assert_eq!(appointment.title, "sync");
        assert_eq!(appointment.date, "2025-04-01");
    }

    #[tokio::test]
    async fn update_without_fields_is_a_noop() {
        let repo = repo().await;
        let id = repo.create(&input("sync", "2025-04-01", "10:00")).await.unwrap();
        assert_eq!(repo.update(id, &AppointmentInput::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_signals_existence_through_rows_affected() {
        let repo = repo().await;
        assert_eq!(repo.delete(42).await.unwrap(), 0);

        let id = repo.create(&input("sync", "2025-04-01", "10:00")).await.unwrap();
        assert_eq!(repo.delete(id).await.unwrap(), 1);
        assert_eq!(repo.delete(id).await.unwrap(), 0);
    }
}
