use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::repositories::{
    Appointment, AppointmentFilters, AppointmentInput, AppointmentRepository,
};
use crate::validation::validate_appointment;

/// Trigger words scanned in meeting notes, each mapped to a suggested
/// follow-up action.
const NEXT_STEP_TRIGGERS: [(&str, &str); 8] = [
    ("decision", "Document the decision made"),
    ("action", "Assign an owner and a deadline"),
    ("blocker", "Follow up on the blocker"),
    ("deadline", "Add the deadline to the calendar"),
    ("review", "Schedule a review"),
    ("approve", "Request approval"),
    ("schedule", "Schedule a follow-up meeting"),
    ("send", "Send the material by email"),
];

pub struct AppointmentService {
    repo: Arc<dyn AppointmentRepository>,
}

impl AppointmentService {
    pub fn new(repo: Arc<dyn AppointmentRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filters: Option<AppointmentFilters>,
        page: Option<&str>,
        per_page: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        self.repo.find_all(filters.as_ref(), page, per_page).await
    }

    pub async fn get(&self, id: i64) -> Result<Appointment> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    pub async fn create(&self, input: AppointmentInput) -> Result<Appointment> {
        let errors = validate_appointment(&input);
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        let id = self.repo.create(&input).await?;
        self.get(id).await
    }

    /// Partial update. Unlike tasks, the merged record is always
    /// re-validated, so an update can never leave an appointment with
    /// an end time before its start.
    pub async fn update(&self, id: i64, input: AppointmentInput) -> Result<Appointment> {
        let existing = self.get(id).await?;

        let errors = validate_appointment(&input.merged_with(&existing));
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        self.repo.update(id, &input).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let rows = self.repo.delete(id).await?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("Appointment {} not found", id)));
        }
        Ok(())
    }

    /// Derives suggested next steps from the meeting notes, persists
    /// them on the appointment and returns the generated text.
    pub async fn generate_next_steps(&self, id: i64, notes: &str) -> Result<String> {
        self.get(id).await?;

        if notes.trim().is_empty() {
            return Ok(String::new());
        }

        let notes_lower = notes.to_lowercase();
        let mut steps: Vec<String> = NEXT_STEP_TRIGGERS
            .iter()
            .filter(|(trigger, _)| notes_lower.contains(trigger))
            .map(|(_, action)| format!("• {}", action))
            .collect();

        if steps.is_empty() {
            steps.push("• Review the meeting notes".to_string());
            steps.push("• Define the next actions".to_string());
        }

        let generated = steps.join("\n");

        let input = AppointmentInput {
            next_steps: Some(generated.clone()),
            ..Default::default()
        };
        self.repo.update(id, &input).await?;

        tracing::info!("next steps generated for appointment {}", id);
        Ok(generated)
    }
}
