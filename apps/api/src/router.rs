use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::{booking_routes, BookingState};

pub fn create_router(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Booking API is running!" }))
        .merge(booking_routes(state))
}
