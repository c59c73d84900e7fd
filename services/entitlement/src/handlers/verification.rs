use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::EntitlementError;
use crate::state::AppState;
use crate::usecase::verification::{
    CompleteSignupInput, CompleteSignupUseCase, IssuedCode, RequestPasswordResetInput,
    RequestPasswordResetUseCase, RequestSignupCodeInput, RequestSignupCodeUseCase,
    ResetPasswordInput, ResetPasswordUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCodeResponse {
    pub expires_in: u64,
}

impl From<IssuedCode> for IssuedCodeResponse {
    fn from(issued: IssuedCode) -> Self {
        Self {
            expires_in: issued.expires_in,
        }
    }
}

// ── POST /auth/signup/code ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupCodeRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn request_signup_code(
    State(state): State<AppState>,
    Json(body): Json<SignupCodeRequest>,
) -> Result<(StatusCode, Json<IssuedCodeResponse>), EntitlementError> {
    let usecase = RequestSignupCodeUseCase {
        users: state.user_repo(),
        codes: state.verification_codes(),
        hash_cost: state.hash_cost,
    };
    let issued = usecase
        .execute(RequestSignupCodeInput {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

// ── POST /auth/signup/verify ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: String,
}

pub async fn complete_signup(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), EntitlementError> {
    let usecase = CompleteSignupUseCase {
        users: state.user_repo(),
        codes: state.verification_codes(),
    };
    let user_id = usecase
        .execute(CompleteSignupInput {
            email: body.email,
            code: body.code,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user_id.to_string(),
        }),
    ))
}

// ── POST /auth/password-reset/code ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordResetCodeRequest {
    pub email: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetCodeRequest>,
) -> Result<(StatusCode, Json<IssuedCodeResponse>), EntitlementError> {
    let usecase = RequestPasswordResetUseCase {
        users: state.user_repo(),
        codes: state.verification_codes(),
    };
    let issued = usecase
        .execute(RequestPasswordResetInput { email: body.email })
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

// ── POST /auth/password-reset/verify ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, EntitlementError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        codes: state.verification_codes(),
        hash_cost: state.hash_cost,
    };
    usecase
        .execute(ResetPasswordInput {
            email: body.email,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
