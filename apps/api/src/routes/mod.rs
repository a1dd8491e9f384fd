pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::documents::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/document-types", get(handlers::handle_document_types))
        // Letter generation
        .route(
            "/generate-offer-letter",
            post(handlers::handle_offer_letter),
        )
        .route(
            "/generate-appointment-letter",
            post(handlers::handle_appointment_letter),
        )
        .route(
            "/generate-termination-letter",
            post(handlers::handle_termination_letter),
        )
        .route(
            "/generate-experience-letter",
            post(handlers::handle_experience_letter),
        )
        .route("/download/:filename", get(handlers::handle_download))
        .with_state(state)
}
