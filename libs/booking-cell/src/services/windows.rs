use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use scheduling_cell::{validate_weekly_windows, WorkingWindow};

use crate::error::BookingError;
use crate::models::WorkingWindowInput;
use crate::services::store::SchedulingStore;

/// Weekly schedule administration for professionals.
pub struct WorkingWindowService {
    store: Arc<dyn SchedulingStore>,
}

impl WorkingWindowService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, company_id: Uuid, professional_id: Uuid) -> Result<Vec<WorkingWindow>, BookingError> {
        self.ensure_professional(company_id, professional_id).await?;
        self.store.list_working_windows(company_id, professional_id).await
    }

    /// Replaces the whole week. Rejected as a unit when any window is inverted or two
    /// windows on the same weekday overlap.
    pub async fn replace(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        inputs: Vec<WorkingWindowInput>,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let windows: Vec<WorkingWindow> = inputs
            .into_iter()
            .map(|input| input.into_window(company_id, professional_id))
            .collect();
        validate_weekly_windows(&windows)?;

        self.ensure_professional(company_id, professional_id).await?;
        let saved = self
            .store
            .replace_working_windows(company_id, professional_id, windows)
            .await?;

        info!("Saved {} working windows for professional {}", saved.len(), professional_id);
        Ok(saved)
    }

    async fn ensure_professional(&self, company_id: Uuid, professional_id: Uuid) -> Result<(), BookingError> {
        if !self.store.professional_exists(company_id, professional_id).await? {
            return Err(BookingError::ProfessionalNotFound(professional_id));
        }
        Ok(())
    }
}
