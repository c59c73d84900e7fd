use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use daypass_auth_types::client_ip::ClientIp;

use crate::error::EntitlementError;
use crate::state::AppState;
use crate::usecase::contact::{SubmitMessageInput, SubmitMessageUseCase};

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub async fn submit_message(
    ClientIp(client_ip): ClientIp,
    State(state): State<AppState>,
    Json(body): Json<ContactRequest>,
) -> Result<StatusCode, EntitlementError> {
    let usecase = SubmitMessageUseCase {
        messages: state.message_repo(),
        limits: state.limits.clone(),
        clock: state.clock.clone(),
    };
    usecase
        .execute(SubmitMessageInput {
            name: body.name,
            email: body.email,
            subject: body.subject,
            message: body.message,
            client_ip,
        })
        .await?;
    Ok(StatusCode::CREATED)
}
