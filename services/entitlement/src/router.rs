use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use daypass_core::health::{healthz, readyz};
use daypass_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    claim::{claim_voucher, get_claim_status},
    contact::submit_message,
    verification::{complete_signup, request_password_reset, request_signup_code, reset_password},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Verification codes
        .route("/auth/signup/code", post(request_signup_code))
        .route("/auth/signup/verify", post(complete_signup))
        .route("/auth/password-reset/code", post(request_password_reset))
        .route("/auth/password-reset/verify", post(reset_password))
        // Vouchers
        .route("/vouchers/claim-status", get(get_claim_status))
        .route("/vouchers/{voucher_id}/claim", post(claim_voucher))
        // Contact
        .route("/contact", post(submit_message))
        .with_state(state)
        // Outermost last: the id is set before tracing sees the request.
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
