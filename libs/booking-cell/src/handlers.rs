// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use scheduling_cell::ValidationOutcome;
use shared_models::error::AppError;

use crate::error::BookingError;
use crate::models::{
    BookAppointmentRequest, ReplaceWindowsRequest, RescheduleRequest, SlotsQuery, StatusUpdateRequest,
    ValidateSlotRequest,
};
use crate::state::BookingState;

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<BookingState>>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let request = query.to_slot_request(company_id).map_err(BookingError::from)?;
    let listing = state.availability.list_slots(&request, state.clock.now()).await?;

    Ok(Json(json!({
        "professional_id": request.professional,
        "date": listing.date,
        "total_duration_minutes": listing.total_duration_minutes,
        "slots": listing.slots,
    })))
}

/// Rule rejections are a normal answer here (`ok: false` plus a reason); only store
/// and lookup failures become HTTP errors.
#[axum::debug_handler]
pub async fn validate_slot(
    State(state): State<Arc<BookingState>>,
    Path(company_id): Path<Uuid>,
    Json(body): Json<ValidateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let result = match body.to_slot_request(company_id) {
        Ok((request, time)) => state.availability.validate(&request, time, state.clock.now()).await,
        Err(e) => Err(BookingError::Rejected(e)),
    };

    let outcome = match result {
        Ok(()) => ValidationOutcome::from(&Ok(())),
        Err(BookingError::Rejected(reason)) => ValidationOutcome::from(&Err(reason)),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(json!(outcome)))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<BookingState>>,
    Path(company_id): Path<Uuid>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.committer.book(company_id, request, state.clock.now()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked and awaiting confirmation"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<BookingState>>,
    Path((company_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .committer
        .reschedule(company_id, appointment_id, request, state.clock.now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<BookingState>>,
    Path((company_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .committer
        .transition_status(company_id, appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn send_reminder(
    State(state): State<Arc<BookingState>>,
    Path((company_id, appointment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.committer.send_reminder(company_id, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "notification": outcome
    })))
}

// ==============================================================================
// WORKING WINDOW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_working_windows(
    State(state): State<Arc<BookingState>>,
    Path((company_id, professional_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let windows = state.windows.list(company_id, professional_id).await?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "windows": windows
    })))
}

#[axum::debug_handler]
pub async fn replace_working_windows(
    State(state): State<Arc<BookingState>>,
    Path((company_id, professional_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ReplaceWindowsRequest>,
) -> Result<Json<Value>, AppError> {
    let windows = state
        .windows
        .replace(company_id, professional_id, request.windows)
        .await?;

    Ok(Json(json!({
        "success": true,
        "professional_id": professional_id,
        "windows": windows
    })))
}
