use chrono::{DateTime, Duration, Utc};

use daypass_domain::id::UserId;
use daypass_domain::user::{PASSWORD_PROVIDER, UserRole};
use daypass_domain::verification::CodePurpose;

use crate::domain::clock::Clock;
use crate::domain::code::{code_matches, generate_numeric_code, hash_code};
use crate::domain::password::{hash_password, validate_password};
use crate::domain::repository::{Mailer, UserRepository, VerificationCodeRepository};
use crate::domain::time_window::seconds_until;
use crate::domain::types::{
    CODE_LEN, CODE_TTL_SECS, EmailMessage, MAX_VERIFY_ATTEMPTS, PendingSignup, User,
    VerificationCode, normalize_email,
};
use crate::error::EntitlementError;

// ── VerificationCodes ────────────────────────────────────────────────────────

/// Outcome of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// Seconds until the code expires.
    pub expires_in: u64,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCode {
    /// Pending account details for `signup` codes.
    pub payload: Option<PendingSignup>,
}

/// Issues and verifies one-time codes for a `(address, purpose)` pair.
pub struct VerificationCodes<R, M, C>
where
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub codes: R,
    pub mailer: M,
    pub clock: C,
}

impl<R, M, C> VerificationCodes<R, M, C>
where
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    /// Send a fresh code, superseding any earlier one for the same pair.
    ///
    /// The resend cooldown is checked against the existing record before it is
    /// replaced, so re-issuing cannot reset the caller's own window.
    pub async fn issue(
        &self,
        address: &str,
        purpose: CodePurpose,
        payload: Option<PendingSignup>,
    ) -> Result<IssuedCode, EntitlementError> {
        let now = self.clock.now();

        if let Some(existing) = self.codes.find(address, purpose).await? {
            if let Some(retry_after_secs) = existing.resend_cooldown_remaining(now) {
                return Err(EntitlementError::RateLimited { retry_after_secs });
            }
        }

        let code = generate_numeric_code(CODE_LEN);
        let record = VerificationCode {
            address: address.to_owned(),
            purpose,
            code_hash: hash_code(&code),
            attempts: 0,
            max_attempts: MAX_VERIFY_ATTEMPTS,
            pending_payload: payload,
            created_at: now,
            expires_at: now + Duration::seconds(CODE_TTL_SECS),
        };
        self.codes.upsert(&record).await?;

        let message = render_code_email(address, purpose, &code);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!(error = %e, %address, %purpose, "code delivery failed, discarding code");
            self.codes.delete(address, purpose).await?;
            return Err(EntitlementError::DeliveryFailed);
        }

        tracing::info!(%address, %purpose, "verification code issued");
        Ok(IssuedCode {
            expires_in: seconds_until(record.expires_at, now),
        })
    }

    /// Check a submitted code. The record is consumed on success, on expiry
    /// and once attempts run out.
    ///
    /// Every comparison first reserves an attempt in storage, so concurrent
    /// guesses never exceed `max_attempts` evaluations. A match is accepted
    /// only by the caller whose conditional delete removes the record.
    pub async fn verify(
        &self,
        address: &str,
        purpose: CodePurpose,
        submitted: &str,
    ) -> Result<VerifiedCode, EntitlementError> {
        let now = self.clock.now();

        let record = self
            .codes
            .find(address, purpose)
            .await?
            .ok_or(EntitlementError::CodeNotFound)?;

        if record.is_expired_at(now) {
            self.codes.delete(address, purpose).await?;
            return Err(EntitlementError::CodeExpired);
        }

        if record.is_exhausted() {
            self.codes.delete(address, purpose).await?;
            return Err(EntitlementError::TooManyAttempts);
        }

        let Some(attempts) = self.codes.reserve_attempt(address, purpose, now).await? else {
            return Err(self.reject_unreservable(address, purpose, now).await?);
        };

        if !code_matches(submitted, &record.code_hash) {
            if attempts >= record.max_attempts {
                self.codes.delete(address, purpose).await?;
                tracing::warn!(%address, %purpose, "verification attempts exhausted");
                return Err(EntitlementError::TooManyAttempts);
            }
            return Err(EntitlementError::InvalidCode {
                attempts_remaining: record.max_attempts - attempts,
            });
        }

        if !self
            .codes
            .consume(address, purpose, &record.code_hash)
            .await?
        {
            return Err(EntitlementError::CodeNotFound);
        }
        Ok(VerifiedCode {
            payload: record.pending_payload,
        })
    }

    /// Classify a record that changed between the read and the reservation.
    async fn reject_unreservable(
        &self,
        address: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<EntitlementError, EntitlementError> {
        let Some(current) = self.codes.find(address, purpose).await? else {
            return Ok(EntitlementError::CodeNotFound);
        };
        self.codes.delete(address, purpose).await?;
        if current.is_expired_at(now) {
            Ok(EntitlementError::CodeExpired)
        } else {
            Ok(EntitlementError::TooManyAttempts)
        }
    }
}

fn render_code_email(address: &str, purpose: CodePurpose, code: &str) -> EmailMessage {
    let (subject, action) = match purpose {
        CodePurpose::Signup => ("Your Daypass signup code", "finish creating your account"),
        CodePurpose::PasswordReset => ("Your Daypass password reset code", "reset your password"),
    };
    let minutes = CODE_TTL_SECS / 60;
    EmailMessage {
        to: address.to_owned(),
        subject: subject.to_owned(),
        html: format!(
            "<p>Use this code to {action}:</p>\
             <p style=\"font-size:24px;letter-spacing:4px\"><strong>{code}</strong></p>\
             <p>It expires in {minutes} minutes. If you did not request it, ignore this email.</p>"
        ),
        text: format!(
            "Use this code to {action}: {code}\n\n\
             It expires in {minutes} minutes. If you did not request it, ignore this email."
        ),
    }
}

// ── RequestSignupCode ────────────────────────────────────────────────────────

pub struct RequestSignupCodeInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct RequestSignupCodeUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub users: U,
    pub codes: VerificationCodes<R, M, C>,
    /// bcrypt cost for the pending password hash.
    pub hash_cost: u32,
}

impl<U, R, M, C> RequestSignupCodeUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub async fn execute(
        &self,
        input: RequestSignupCodeInput,
    ) -> Result<IssuedCode, EntitlementError> {
        let email = normalize_email(&input.email);
        validate_password(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(EntitlementError::EmailTaken);
        }

        let payload = PendingSignup {
            name: input.name.trim().to_owned(),
            password_hash: hash_password(&input.password, self.hash_cost)?,
        };
        self.codes
            .issue(&email, CodePurpose::Signup, Some(payload))
            .await
    }
}

// ── CompleteSignup ───────────────────────────────────────────────────────────

pub struct CompleteSignupInput {
    pub email: String,
    pub code: String,
}

pub struct CompleteSignupUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub users: U,
    pub codes: VerificationCodes<R, M, C>,
}

impl<U, R, M, C> CompleteSignupUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    /// Verify the signup code and create the account it was holding.
    pub async fn execute(&self, input: CompleteSignupInput) -> Result<UserId, EntitlementError> {
        let email = normalize_email(&input.email);
        let verified = self
            .codes
            .verify(&email, CodePurpose::Signup, &input.code)
            .await?;
        let pending = verified.payload.ok_or_else(|| {
            EntitlementError::Internal(anyhow::anyhow!("signup code without pending payload"))
        })?;

        let now = self.codes.clock.now();
        let user = User {
            id: UserId(uuid::Uuid::now_v7()),
            name: pending.name,
            email,
            password_hash: Some(pending.password_hash),
            auth_provider: PASSWORD_PROVIDER.to_owned(),
            role: UserRole::User,
            is_active: true,
            points: 0,
            last_claim_at: None,
            claimed_vouchers: vec![],
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "account created");
        Ok(user.id)
    }
}

// ── RequestPasswordReset ─────────────────────────────────────────────────────

pub struct RequestPasswordResetInput {
    pub email: String,
}

pub struct RequestPasswordResetUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub users: U,
    pub codes: VerificationCodes<R, M, C>,
}

impl<U, R, M, C> RequestPasswordResetUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub async fn execute(
        &self,
        input: RequestPasswordResetInput,
    ) -> Result<IssuedCode, EntitlementError> {
        let email = normalize_email(&input.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(EntitlementError::UserNotFound)?;

        // A code is useless to an account that has no password to reset.
        if !user.uses_password() {
            return Err(EntitlementError::FederatedAccount {
                provider: user.auth_provider,
            });
        }

        self.codes
            .issue(&email, CodePurpose::PasswordReset, None)
            .await
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub users: U,
    pub codes: VerificationCodes<R, M, C>,
    pub hash_cost: u32,
}

impl<U, R, M, C> ResetPasswordUseCase<U, R, M, C>
where
    U: UserRepository,
    R: VerificationCodeRepository,
    M: Mailer,
    C: Clock,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), EntitlementError> {
        // Validate before verifying so a weak password does not burn the code.
        validate_password(&input.new_password)?;
        let email = normalize_email(&input.email);

        self.codes
            .verify(&email, CodePurpose::PasswordReset, &input.code)
            .await?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(EntitlementError::UserNotFound)?;
        let hash = hash_password(&input.new_password, self.hash_cost)?;
        self.users.update_password(user.id, &hash).await?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
