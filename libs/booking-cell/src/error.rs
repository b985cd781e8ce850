use thiserror::Error;
use uuid::Uuid;

use scheduling_cell::{AppointmentStatus, SchedulingError};
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error(transparent)]
    Rejected(#[from] SchedulingError),

    #[error("Professional {0} not found")]
    ProfessionalNotFound(Uuid),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is already {0} and can no longer change")]
    AppointmentClosed(AppointmentStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store did not answer within {seconds} seconds")]
    StoreTimeout { seconds: u64 },

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Rejected(reason) => AppError::Rejected {
                reason: reason.code().to_string(),
                message: reason.to_string(),
            },
            BookingError::ProfessionalNotFound(_) | BookingError::AppointmentNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            BookingError::InvalidStatusTransition { .. } | BookingError::AppointmentClosed(_) => {
                AppError::Conflict(e.to_string())
            }
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            BookingError::StoreTimeout { .. } | BookingError::NotificationFailed(_) => {
                AppError::ExternalService(e.to_string())
            }
            BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        }
    }
}
