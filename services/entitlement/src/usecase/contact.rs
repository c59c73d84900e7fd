use std::sync::Arc;

use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::repository::MessageRepository;
use crate::domain::types::{ContactMessage, normalize_email};
use crate::error::EntitlementError;
use crate::usecase::rate_limit::{RateLimitDecision, RateLimiterState};

pub struct SubmitMessageInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub client_ip: String,
}

pub struct SubmitMessageUseCase<M, C>
where
    M: MessageRepository,
    C: Clock,
{
    pub messages: M,
    pub limits: Arc<RateLimiterState>,
    pub clock: C,
}

impl<M, C> SubmitMessageUseCase<M, C>
where
    M: MessageRepository,
    C: Clock,
{
    pub async fn execute(&self, input: SubmitMessageInput) -> Result<Uuid, EntitlementError> {
        let now = self.clock.now();

        if let RateLimitDecision::Blocked { retry_after_secs } =
            self.limits.limiter.check(&input.client_ip, now)
        {
            tracing::warn!(client_ip = %input.client_ip, retry_after_secs, "contact form rate limited");
            return Err(EntitlementError::RateLimited { retry_after_secs });
        }

        let email = normalize_email(&input.email);
        if let RateLimitDecision::Blocked { retry_after_secs } =
            self.limits.cooldown.check(&email, now)
        {
            return Err(EntitlementError::RateLimited { retry_after_secs });
        }

        let message = ContactMessage {
            id: Uuid::now_v7(),
            name: input.name.trim().to_owned(),
            email: email.clone(),
            subject: input.subject.trim().to_owned(),
            body: input.message,
            client_ip: input.client_ip,
            created_at: now,
        };
        if let Err(e) = self.messages.create(&message).await {
            self.limits.cooldown.forget(&email);
            return Err(e);
        }

        tracing::info!(message_id = %message.id, "contact message stored");
        Ok(message.id)
    }
}
