use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::domain::clock::Clock;
use crate::infra::db::{
    DbMessageRepository, DbUserRepository, DbVerificationCodeRepository, DbVoucherRepository,
};
use crate::infra::mail::HttpMailer;
use crate::usecase::rate_limit::RateLimiterState;
use crate::usecase::verification::VerificationCodes;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: HttpMailer,
    pub limits: Arc<RateLimiterState>,
    pub clock: Arc<dyn Clock>,
    /// bcrypt cost for stored password hashes.
    pub hash_cost: u32,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn voucher_repo(&self) -> DbVoucherRepository {
        DbVoucherRepository {
            db: self.db.clone(),
        }
    }

    pub fn message_repo(&self) -> DbMessageRepository {
        DbMessageRepository {
            db: self.db.clone(),
        }
    }

    pub fn verification_codes(
        &self,
    ) -> VerificationCodes<DbVerificationCodeRepository, HttpMailer, Arc<dyn Clock>> {
        VerificationCodes {
            codes: DbVerificationCodeRepository {
                db: self.db.clone(),
            },
            mailer: self.mailer.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}
