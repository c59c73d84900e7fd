use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use daypass_domain::id::{UserId, VoucherId};
use daypass_domain::user::{PASSWORD_PROVIDER, UserRole};
use daypass_domain::verification::CodePurpose;
use daypass_entitlement::domain::clock::Clock;
use daypass_entitlement::domain::repository::{
    Mailer, MessageRepository, UserRepository, VerificationCodeRepository, VoucherRepository,
};
use daypass_entitlement::domain::types::{
    BrandInfo, ClaimedVoucher, ContactMessage, EmailMessage, User, VerificationCode, Voucher,
};
use daypass_entitlement::error::EntitlementError;
use daypass_entitlement::usecase::verification::VerificationCodes;

// ── FixedClock ───────────────────────────────────────────────────────────────

/// Manually advanced clock. Clones share the same instant.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Midday UTC, far from any local midnight or DST switch.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    pub fn by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, EntitlementError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, EntitlementError> {
        Ok(self.by_email(email))
    }

    async fn create(&self, user: &User) -> Result<(), EntitlementError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(EntitlementError::EmailTaken);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), EntitlementError> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.password_hash = Some(password_hash.to_owned());
        }
        Ok(())
    }
}

// ── MockVoucherRepo ──────────────────────────────────────────────────────────

/// Voucher store that writes claims through to the shared user list.
#[derive(Clone)]
pub struct MockVoucherRepo {
    pub vouchers: Arc<Mutex<Vec<Voucher>>>,
    pub users: MockUserRepo,
}

impl MockVoucherRepo {
    pub fn new(vouchers: Vec<Voucher>, users: MockUserRepo) -> Self {
        Self {
            vouchers: Arc::new(Mutex::new(vouchers)),
            users,
        }
    }

    pub fn get(&self, id: VoucherId) -> Option<Voucher> {
        self.vouchers
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }
}

impl VoucherRepository for MockVoucherRepo {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, EntitlementError> {
        Ok(self.get(id))
    }

    async fn claim(
        &self,
        voucher_id: VoucherId,
        user_id: UserId,
        claimed: &ClaimedVoucher,
        reward_points: i64,
    ) -> Result<bool, EntitlementError> {
        // Let concurrent claimers reach this point before any of them writes.
        tokio::task::yield_now().await;

        let mut vouchers = self.vouchers.lock().unwrap();
        let Some(voucher) = vouchers.iter_mut().find(|v| v.id == voucher_id) else {
            return Ok(false);
        };
        if voucher.claimed_by.is_some() {
            return Ok(false);
        }
        voucher.claimed_by = Some(user_id);
        voucher.claimed_at = Some(claimed.claimed_at);

        let mut users = self.users.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == user_id) {
            u.claimed_vouchers.push(claimed.clone());
            u.points += reward_points;
            u.last_claim_at = Some(claimed.claimed_at);
        }
        Ok(true)
    }
}

// ── MockCodeRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockCodeRepo {
    pub codes: Arc<Mutex<HashMap<(String, CodePurpose), VerificationCode>>>,
}

impl MockCodeRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str, purpose: CodePurpose) -> Option<VerificationCode> {
        self.codes
            .lock()
            .unwrap()
            .get(&(address.to_owned(), purpose))
            .cloned()
    }
}

impl VerificationCodeRepository for MockCodeRepo {
    async fn find(
        &self,
        address: &str,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, EntitlementError> {
        // Concurrent verifiers all read before any of them reserves.
        tokio::task::yield_now().await;
        Ok(self.get(address, purpose))
    }

    async fn upsert(&self, code: &VerificationCode) -> Result<(), EntitlementError> {
        self.codes
            .lock()
            .unwrap()
            .insert((code.address.clone(), code.purpose), code.clone());
        Ok(())
    }

    async fn reserve_attempt(
        &self,
        address: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, EntitlementError> {
        tokio::task::yield_now().await;

        let mut codes = self.codes.lock().unwrap();
        let Some(c) = codes.get_mut(&(address.to_owned(), purpose)) else {
            return Ok(None);
        };
        if c.attempts >= c.max_attempts || c.expires_at <= now {
            return Ok(None);
        }
        c.attempts += 1;
        Ok(Some(c.attempts))
    }

    async fn consume(
        &self,
        address: &str,
        purpose: CodePurpose,
        code_hash: &str,
    ) -> Result<bool, EntitlementError> {
        tokio::task::yield_now().await;

        let mut codes = self.codes.lock().unwrap();
        let key = (address.to_owned(), purpose);
        if codes.get(&key).is_some_and(|c| c.code_hash == code_hash) {
            codes.remove(&key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete(&self, address: &str, purpose: CodePurpose) -> Result<(), EntitlementError> {
        self.codes
            .lock()
            .unwrap()
            .remove(&(address.to_owned(), purpose));
        Ok(())
    }
}

// ── MockMessageRepo ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMessageRepo {
    pub messages: Arc<Mutex<Vec<ContactMessage>>>,
    pub fail: bool,
}

impl MockMessageRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl MessageRepository for MockMessageRepo {
    async fn create(&self, message: &ContactMessage) -> Result<(), EntitlementError> {
        if self.fail {
            return Err(anyhow::anyhow!("store unavailable").into());
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ── Mailers ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// The 6-digit code from the most recent message.
    pub fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let last = sent.last().expect("no email sent");
        last.text
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| s.len() == 6)
            .expect("no code in email")
            .to_owned()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EntitlementError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct FailingMailer;

impl Mailer for FailingMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), EntitlementError> {
        Err(anyhow::anyhow!("provider returned 503").into())
    }
}

pub fn codes_with<M: Mailer>(
    repo: &MockCodeRepo,
    mailer: M,
    clock: &FixedClock,
) -> VerificationCodes<MockCodeRepo, M, FixedClock> {
    VerificationCodes {
        codes: repo.clone(),
        mailer,
        clock: clock.clone(),
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn test_user(email: &str) -> User {
    let now = base_time() - Duration::days(30);
    User {
        id: UserId(Uuid::now_v7()),
        name: "Test User".to_owned(),
        email: email.to_owned(),
        password_hash: Some(bcrypt::hash("old password", 4).unwrap()),
        auth_provider: PASSWORD_PROVIDER.to_owned(),
        role: UserRole::User,
        is_active: true,
        points: 0,
        last_claim_at: None,
        claimed_vouchers: vec![],
        created_at: now,
        updated_at: now,
    }
}

pub fn federated_user(email: &str) -> User {
    User {
        password_hash: None,
        auth_provider: "google".to_owned(),
        ..test_user(email)
    }
}

pub fn test_voucher(code: &str) -> Voucher {
    Voucher {
        id: VoucherId(Uuid::now_v7()),
        code: code.to_owned(),
        title: "Free coffee".to_owned(),
        brand: BrandInfo {
            name: "Bean Bar".to_owned(),
            logo_url: Some("https://cdn.example.com/bean.png".to_owned()),
        },
        expiry_date: base_time() + Duration::days(90),
        is_active: true,
        claimed_by: None,
        claimed_at: None,
    }
}
