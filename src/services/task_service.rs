use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::repositories::{Task, TaskFilters, TaskInput, TaskRepository};
use crate::validation::{validate_task, TASK_STATUSES};

pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filters: Option<TaskFilters>) -> Result<Vec<Task>> {
        self.repo.find_all(filters.as_ref()).await
    }

    pub async fn get(&self, id: i64) -> Result<Task> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))
    }

    pub async fn create(&self, input: TaskInput) -> Result<Task> {
        let errors = validate_task(&input);
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        let id = self.repo.create(&input).await?;
        self.get(id).await
    }

    /// Partial update. The merged record is re-validated only when the
    /// payload touches one of the validated fields; an update limited
    /// to other fields goes through unchecked, so a stale enum value
    /// already in storage is not re-examined.
    pub async fn update(&self, id: i64, input: TaskInput) -> Result<Task> {
        let existing = self.get(id).await?;

        let touches_validated_field = input.title.is_some()
            || input.category.is_some()
            || input.priority.is_some()
            || input.status.is_some();

        if touches_validated_field {
            let errors = validate_task(&input.merged_with(&existing));
            if !errors.is_empty() {
                return Err(AppError::ValidationError(errors));
            }
        }

        self.repo.update(id, &input).await?;
        self.get(id).await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<Task> {
        self.get(id).await?;

        if !TASK_STATUSES.contains(&status.to_lowercase().as_str()) {
            return Err(AppError::ValidationError(vec![format!(
                "Invalid status. Use: {}",
                TASK_STATUSES.join(", ")
            )]));
        }

        let input = TaskInput {
            status: Some(status.to_string()),
            ..Default::default()
        };
        self.repo.update(id, &input).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let rows = self.repo.delete(id).await?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    pub async fn completed(&self) -> Result<Vec<Task>> {
        self.repo.find_completed().await
    }
}
