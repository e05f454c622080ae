use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{AppError, Result};
use crate::repositories::{apply_predicates, Predicate};
use crate::sanitize::sanitize;

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub keyword: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub owners: String,
    pub notes: String,
    pub checklist: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    keyword: String,
    priority: String,
    status: String,
    due_date: Option<String>,
    owners: String,
    notes: String,
    checklist: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        // A checklist that no longer parses degrades to an empty list
        // rather than failing the whole read.
        let checklist = row
            .checklist
            .map(|raw| serde_json::from_str(&raw).unwrap_or_else(|_| Value::Array(Vec::new())));

        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            keyword: row.keyword,
            priority: row.priority,
            status: row.status,
            due_date: row.due_date,
            owners: row.owners,
            notes: row.notes,
            checklist,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Incoming task fields. Everything is optional so the same shape
/// serves create (validated first) and partial update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub owners: Option<String>,
    pub notes: Option<String>,
    pub checklist: Option<Value>,
}

impl TaskInput {
    /// Overlays this partial input on an existing record, producing the
    /// full field set used for re-validation on update.
    pub fn merged_with(&self, existing: &Task) -> TaskInput {
        TaskInput {
            title: self.title.clone().or_else(|| Some(existing.title.clone())),
            description: self
                .description
                .clone()
                .or_else(|| Some(existing.description.clone())),
            category: self
                .category
                .clone()
                .or_else(|| Some(existing.category.clone())),
            keyword: self
                .keyword
                .clone()
                .or_else(|| Some(existing.keyword.clone())),
            priority: self
                .priority
                .clone()
                .or_else(|| Some(existing.priority.clone())),
            status: self.status.clone().or_else(|| Some(existing.status.clone())),
            due_date: self.due_date.clone().or_else(|| existing.due_date.clone()),
            owners: self.owners.clone().or_else(|| Some(existing.owners.clone())),
            notes: self.notes.clone().or_else(|| Some(existing.notes.clone())),
            checklist: self.checklist.clone().or_else(|| existing.checklist.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
}

fn serialize_checklist(checklist: Option<&Value>) -> Option<String> {
    match checklist {
        Some(Value::Null) | None => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(value) => serde_json::to_string(value).ok(),
    }
}

/// Priority rank first, then deadline; tasks without a deadline come
/// last within their priority band.
const TASK_ORDER: &str = " ORDER BY \
    CASE priority \
        WHEN 'urgent' THEN 1 \
        WHEN 'high' THEN 2 \
        WHEN 'medium' THEN 3 \
        ELSE 4 \
    END, \
    due_date ASC NULLS LAST";

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, input: &TaskInput) -> Result<i64>;
    async fn find_all(&self, filters: Option<&TaskFilters>) -> Result<Vec<Task>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>>;
    async fn update(&self, id: i64, input: &TaskInput) -> Result<u64>;
    async fn delete(&self, id: i64) -> Result<u64>;
    async fn find_completed(&self) -> Result<Vec<Task>>;
}

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, input: &TaskInput) -> Result<i64> {
        let priority = input
            .priority
            .as_deref()
            .unwrap_or("medium")
            .to_lowercase();
        let status = input.status.as_deref().unwrap_or("pending").to_lowercase();
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tasks (
                title, description, category, keyword, priority, status,
                due_date, owners, notes, checklist, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(sanitize(input.title.as_deref()))
        .bind(sanitize(input.description.as_deref()))
        .bind(sanitize(input.category.as_deref()))
        .bind(sanitize(input.keyword.as_deref()))
        .bind(priority)
        .bind(status)
        .bind(input.due_date.as_deref())
        .bind(sanitize(input.owners.as_deref()))
        .bind(sanitize(input.notes.as_deref()))
        .bind(serialize_checklist(input.checklist.as_ref()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::info!("task created with id {}", id);
        Ok(id)
    }

    async fn find_all(&self, filters: Option<&TaskFilters>) -> Result<Vec<Task>> {
        let mut predicates = Vec::new();
        if let Some(filters) = filters {
            if let Some(status) = &filters.status {
                predicates.push(Predicate::Eq("status", status.to_lowercase()));
            }
            if let Some(priority) = &filters.priority {
                predicates.push(Predicate::Eq("priority", priority.to_lowercase()));
            }
            if let Some(category) = &filters.category {
                predicates.push(Predicate::Like("category", category.clone()));
            }
            if let Some(keyword) = &filters.keyword {
                predicates.push(Predicate::Like("keyword", keyword.clone()));
            }
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tasks WHERE 1=1");
        apply_predicates(&mut builder, predicates);
        builder.push(TASK_ORDER);

        let rows: Vec<TaskRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Task::from))
    }

    async fn update(&self, id: i64, input: &TaskInput) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE tasks SET ");
        let mut recognized = 0usize;

        {
            let mut sets = builder.separated(", ");

            if let Some(title) = input.title.as_deref() {
                sets.push("title = ");
                sets.push_bind_unseparated(sanitize(Some(title)));
                recognized += 1;
            }
            if let Some(description) = input.description.as_deref() {
                sets.push("description = ");
                sets.push_bind_unseparated(sanitize(Some(description)));
                recognized += 1;
            }
            if let Some(category) = input.category.as_deref() {
                sets.push("category = ");
                sets.push_bind_unseparated(sanitize(Some(category)));
                recognized += 1;
            }
            if let Some(keyword) = input.keyword.as_deref() {
                sets.push("keyword = ");
                sets.push_bind_unseparated(sanitize(Some(keyword)));
                recognized += 1;
            }
            if let Some(priority) = input.priority.as_deref() {
                sets.push("priority = ");
                sets.push_bind_unseparated(priority.to_lowercase());
                recognized += 1;
            }
            if let Some(status) = input.status.as_deref() {
                sets.push("status = ");
                sets.push_bind_unseparated(status.to_lowercase());
                recognized += 1;
            }
            if let Some(due_date) = input.due_date.as_deref() {
                sets.push("due_date = ");
                sets.push_bind_unseparated(due_date.to_string());
                recognized += 1;
            }
            if let Some(owners) = input.owners.as_deref() {
                sets.push("owners = ");
                sets.push_bind_unseparated(sanitize(Some(owners)));
                recognized += 1;
            }
            if let Some(notes) = input.notes.as_deref() {
                sets.push("notes = ");
                sets.push_bind_unseparated(sanitize(Some(notes)));
                recognized += 1;
            }
            if let Some(checklist) = input.checklist.as_ref() {
                sets.push("checklist = ");
                sets.push_bind_unseparated(serialize_checklist(Some(checklist)));
                recognized += 1;
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

        tracing::info!("task {} updated", id);
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "task {} delete, rows affected: {}",
            id,
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    async fn find_completed(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE status = ? ORDER BY updated_at DESC",
        )
        .bind("done")
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Task::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use serde_json::json;

    fn input(title: &str, priority: &str, status: &str, due_date: Option<&str>) -> TaskInput {
        TaskInput {
            title: Some(title.to_string()),
            category: Some("General".to_string()),
            priority: Some(priority.to_string()),
            status: Some(status.to_string()),
            due_date: due_date.map(str::to_string),
            ..Default::default()
        }
    }

    async fn repo() -> SqliteTaskRepository {
        SqliteTaskRepository::new(memory_pool().await)
    }

    #[tokio::test]
    async fn create_lowercases_enums_and_sanitizes_text() {
        let repo = repo().await;
        let mut task_input = input("  <b>Ship it</b>  ", "HIGH", "Pending", None);
        task_input.notes = Some("note\0 <script>x</script>".to_string());

        let id = repo.create(&task_input).await.unwrap();
        let task = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(task.title, "Ship it");
        assert_eq!(task.priority, "high");
        assert_eq!(task.status, "pending");
        assert_eq!(task.notes, "note x");
    }

    #[tokio::test]
    async fn create_defaults_priority_and_status() {
        let repo = repo().await;
        let id = repo
            .create(&TaskInput {
                title: Some("bare".into()),
                category: Some("General".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let task = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.priority, "medium");
        assert_eq!(task.status, "pending");
    }

    #[tokio::test]
    async fn find_all_orders_by_priority_rank_then_due_date() {
        let repo = repo().await;
        repo.create(&input("low", "low", "pending", Some("2025-01-01")))
            .await
            .unwrap();
        repo.create(&input("medium", "medium", "pending", Some("2025-01-01")))
            .await
            .unwrap();
        repo.create(&input("urgent-late", "urgent", "pending", Some("2025-03-01")))
            .await
            .unwrap();
        repo.create(&input("urgent-undated", "urgent", "pending", None))
            .await
            .unwrap();
        repo.create(&input("urgent-early", "urgent", "pending", Some("2025-01-15")))
            .await
            .unwrap();
        repo.create(&input("high", "high", "pending", Some("2024-12-01")))
            .await
            .unwrap();

        let tasks = repo.find_all(None).await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "urgent-early",
                "urgent-late",
                "urgent-undated",
                "high",
                "medium",
                "low"
            ]
        );
    }

    #[tokio::test]
    async fn status_filter_is_case_insensitive() {
        let repo = repo().await;
        repo.create(&input("a", "low", "pending", None)).await.unwrap();
        repo.create(&input("b", "low", "done", None)).await.unwrap();

        let filters = TaskFilters {
            status: Some("PENDING".to_string()),
            ..Default::default()
        };
        let tasks = repo.find_all(Some(&filters)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "a");
    }

    #[tokio::test]
    async fn category_filter_matches_literal_wildcards() {
        let repo = repo().await;
        let mut with_percent = input("percent", "low", "pending", None);
        with_percent.category = Some("Over 100% done".to_string());
        repo.create(&with_percent).await.unwrap();

        let mut without = input("plain", "low", "pending", None);
        without.category = Some("Over 100x done".to_string());
        repo.create(&without).await.unwrap();

        let filters = TaskFilters {
            category: Some("100%".to_string()),
            ..Default::default()
        };
        let tasks = repo.find_all(Some(&filters)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "percent");
    }

    #[tokio::test]
    async fn filters_compose_with_and() {
        let repo = repo().await;
        let mut a = input("a", "high", "pending", None);
        a.keyword = Some("BACKEND".to_string());
        repo.create(&a).await.unwrap();

        let mut b = input("b", "high", "done", None);
        b.keyword = Some("BACKEND".to_string());
        repo.create(&b).await.unwrap();

        let filters = TaskFilters {
            status: Some("pending".to_string()),
            keyword: Some("back".to_string()),
            ..Default::default()
        };
        let tasks = repo.find_all(Some(&filters)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "a");
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let repo = repo().await;
        let id = repo
            .create(&input("original", "low", "pending", Some("2025-05-01")))
            .await
            .unwrap();

        let rows = repo
            .update(
                id,
                &TaskInput {
                    status: Some("DONE".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let task = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.status, "done");
        assert_eq!(task.title, "original");
        assert_eq!(task.due_date.as_deref(), Some("2025-05-01"));
        assert!(task.updated_at >= task.created_at);
    }

    #[tokio::test]
    async fn update_with_no_recognized_field_is_a_noop() {
        let repo = repo().await;
        let id = repo.create(&input("x", "low", "pending", None)).await.unwrap();
        let before = repo.find_by_id(id).await.unwrap().unwrap();

        let rows = repo.update(id, &TaskInput::default()).await.unwrap();
        assert_eq!(rows, 0);

        let after = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn delete_signals_existence_through_rows_affected() {
        let repo = repo().await;
        assert_eq!(repo.delete(999).await.unwrap(), 0);

        let id = repo.create(&input("x", "low", "pending", None)).await.unwrap();
        assert_eq!(repo.delete(id).await.unwrap(), 1);
        assert_eq!(repo.delete(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn checklist_round_trips_in_order() {
        let repo = repo().await;
        let checklist = json!([
            { "item": "draft", "done": true },
            { "item": "review", "done": false },
            { "item": "publish", "done": false }
        ]);

        let mut task_input = input("with list", "low", "pending", None);
        task_input.checklist = Some(checklist.clone());

        let id = repo.create(&task_input).await.unwrap();
        let task = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.checklist, Some(checklist));
    }

    #[tokio::test]
    async fn empty_checklist_is_stored_as_null() {
        let repo = repo().await;
        let mut task_input = input("empty list", "low", "pending", None);
        task_input.checklist = Some(json!([]));

        let id = repo.create(&task_input).await.unwrap();
        let task = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.checklist, None);
    }

    #[tokio::test]
    async fn completed_history_is_newest_first() {
        let repo = repo().await;
        let first = repo.create(&input("first", "low", "done", None)).await.unwrap();
        let second = repo.create(&input("second", "low", "done", None)).await.unwrap();
        repo.create(&input("open", "low", "pending", None)).await.unwrap();

        // Touch the older one so it becomes the most recently updated.
        repo.update(
            first,
            &TaskInput {
                notes: Some("touched".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let completed = repo.find_completed().await.unwrap();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].id, first);
        assert_eq!(completed[1].id, second);
    }
}
