// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers;
use crate::state::BookingState;

pub fn booking_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        // Availability
        .route("/companies/{company_id}/slots", get(handlers::list_slots))
        .route("/companies/{company_id}/slots/validate", post(handlers::validate_slot))

        // Appointments
        .route("/companies/{company_id}/appointments", post(handlers::book_appointment))
        .route(
            "/companies/{company_id}/appointments/{appointment_id}/schedule",
            put(handlers::reschedule_appointment),
        )
        .route(
            "/companies/{company_id}/appointments/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/companies/{company_id}/appointments/{appointment_id}/reminder",
            post(handlers::send_reminder),
        )

        // Weekly schedules
        .route(
            "/companies/{company_id}/professionals/{professional_id}/working-windows",
            get(handlers::get_working_windows).put(handlers::replace_working_windows),
        )
        .with_state(state)
}
