use chrono::Duration;
use futures::future::join_all;

use daypass_domain::verification::CodePurpose;
use daypass_entitlement::domain::code::hash_code;
use daypass_entitlement::error::EntitlementError;
use daypass_entitlement::usecase::verification::{
    CompleteSignupInput, CompleteSignupUseCase, RequestPasswordResetInput,
    RequestPasswordResetUseCase, RequestSignupCodeInput, RequestSignupCodeUseCase,
    ResetPasswordInput, ResetPasswordUseCase,
};

use crate::helpers::{
    FailingMailer, FixedClock, MockCodeRepo, MockUserRepo, RecordingMailer, base_time, codes_with,
    federated_user, test_user,
};

const ADDR: &str = "user@example.com";

/// A wrong guess that cannot collide with the issued code.
fn wrong_code(right: &str) -> String {
    if right == "000000" {
        "111111".to_owned()
    } else {
        "000000".to_owned()
    }
}

// ── issue ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_hashed_code_and_send_it() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    let issued = codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();

    assert_eq!(issued.expires_in, 600);
    assert_eq!(mailer.count(), 1);
    let sent_code = mailer.last_code();
    let stored = repo.get(ADDR, CodePurpose::Signup).unwrap();
    assert_eq!(stored.code_hash, hash_code(&sent_code));
    assert_ne!(stored.code_hash, sent_code, "plaintext must not be stored");
    assert_eq!(stored.attempts, 0);
    assert_eq!(stored.expires_at, base_time() + Duration::minutes(10));
}

#[tokio::test]
async fn should_reject_resend_within_cooldown() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    clock.advance(Duration::seconds(10));
    let result = codes.issue(ADDR, CodePurpose::Signup, None).await;

    assert!(
        matches!(result, Err(EntitlementError::RateLimited { retry_after_secs: 50 })),
        "expected RateLimited(50), got {result:?}"
    );
    assert_eq!(mailer.count(), 1, "no second email within cooldown");
}

#[tokio::test]
async fn should_supersede_previous_code_after_cooldown() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    let first = mailer.last_code();
    clock.advance(Duration::seconds(61));
    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    let second = mailer.last_code();

    assert_eq!(repo.codes.lock().unwrap().len(), 1, "one live record per pair");
    let stored = repo.get(ADDR, CodePurpose::Signup).unwrap();
    assert_eq!(stored.code_hash, hash_code(&second));
    if first != second {
        let result = codes.verify(ADDR, CodePurpose::Signup, &first).await;
        assert!(matches!(result, Err(EntitlementError::InvalidCode { .. })));
    }
}

#[tokio::test]
async fn should_discard_code_when_delivery_fails() {
    let repo = MockCodeRepo::empty();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, FailingMailer, &clock);

    let result = codes.issue(ADDR, CodePurpose::PasswordReset, None).await;

    assert!(
        matches!(result, Err(EntitlementError::DeliveryFailed)),
        "expected DeliveryFailed, got {result:?}"
    );
    assert!(repo.get(ADDR, CodePurpose::PasswordReset).is_none());
}

// ── verify ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_consume_code_on_success() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::PasswordReset, None).await.unwrap();
    clock.advance(Duration::minutes(9));
    let verified = codes
        .verify(ADDR, CodePurpose::PasswordReset, &mailer.last_code())
        .await
        .unwrap();

    assert!(verified.payload.is_none());
    assert!(repo.get(ADDR, CodePurpose::PasswordReset).is_none());
    let again = codes
        .verify(ADDR, CodePurpose::PasswordReset, &mailer.last_code())
        .await;
    assert!(matches!(again, Err(EntitlementError::CodeNotFound)));
}

#[tokio::test]
async fn should_report_missing_code() {
    let repo = MockCodeRepo::empty();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, RecordingMailer::new(), &clock);

    let result = codes.verify(ADDR, CodePurpose::Signup, "123456").await;

    assert!(
        matches!(result, Err(EntitlementError::CodeNotFound)),
        "expected CodeNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_expire_code_after_ten_minutes() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    clock.advance(Duration::minutes(10) + Duration::seconds(1));
    let result = codes
        .verify(ADDR, CodePurpose::Signup, &mailer.last_code())
        .await;

    assert!(
        matches!(result, Err(EntitlementError::CodeExpired)),
        "expected CodeExpired, got {result:?}"
    );
    assert!(repo.get(ADDR, CodePurpose::Signup).is_none(), "expired record removed");
}

#[tokio::test]
async fn should_exhaust_code_on_fifth_wrong_attempt() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    let wrong = wrong_code(&mailer.last_code());

    for expected_remaining in [4, 3, 2, 1] {
        let result = codes.verify(ADDR, CodePurpose::Signup, &wrong).await;
        assert!(
            matches!(
                result,
                Err(EntitlementError::InvalidCode { attempts_remaining }) if attempts_remaining == expected_remaining
            ),
            "expected InvalidCode({expected_remaining}), got {result:?}"
        );
    }

    let fifth = codes.verify(ADDR, CodePurpose::Signup, &wrong).await;
    assert!(
        matches!(fifth, Err(EntitlementError::TooManyAttempts)),
        "expected TooManyAttempts, got {fifth:?}"
    );
    assert!(repo.get(ADDR, CodePurpose::Signup).is_none());

    let correct = codes
        .verify(ADDR, CodePurpose::Signup, &mailer.last_code())
        .await;
    assert!(matches!(correct, Err(EntitlementError::CodeNotFound)));
}

#[tokio::test]
async fn should_cap_concurrent_guesses_at_max_attempts() {
    const GUESSES: usize = 20;
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    let right = mailer.last_code();
    let wrong = wrong_code(&right);
    // The correct code arrives last, after the attempt budget is spent.
    let guesses: Vec<&str> = (0..GUESSES)
        .map(|i| if i == GUESSES - 1 { right.as_str() } else { wrong.as_str() })
        .collect();

    let results = join_all(
        guesses
            .iter()
            .map(|g| codes.verify(ADDR, CodePurpose::Signup, g)),
    )
    .await;

    assert!(
        results.iter().all(|r| r.is_err()),
        "no guess may succeed once attempts run out: {results:?}"
    );
    let invalid = results
        .iter()
        .filter(|r| matches!(r, Err(EntitlementError::InvalidCode { .. })))
        .count();
    assert!(invalid <= 4, "at most four wrong guesses are reported as invalid, got {invalid}");
    assert!(
        results.iter().all(|r| matches!(
            r,
            Err(EntitlementError::InvalidCode { .. }
                | EntitlementError::TooManyAttempts
                | EntitlementError::CodeNotFound)
        )),
        "{results:?}"
    );
    assert!(repo.get(ADDR, CodePurpose::Signup).is_none());
}

#[tokio::test]
async fn should_accept_code_for_exactly_one_concurrent_verifier() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::PasswordReset, None).await.unwrap();
    let right = mailer.last_code();

    let results = join_all(
        (0..2).map(|_| codes.verify(ADDR, CodePurpose::PasswordReset, &right)),
    )
    .await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1, "a code is consumed once: {results:?}");
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EntitlementError::CodeNotFound))),
        "{results:?}"
    );
    assert!(repo.get(ADDR, CodePurpose::PasswordReset).is_none());
}

#[tokio::test]
async fn should_keep_purposes_separate() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let codes = codes_with(&repo, mailer.clone(), &clock);

    codes.issue(ADDR, CodePurpose::Signup, None).await.unwrap();
    let result = codes
        .verify(ADDR, CodePurpose::PasswordReset, &mailer.last_code())
        .await;

    assert!(matches!(result, Err(EntitlementError::CodeNotFound)));
    assert!(repo.get(ADDR, CodePurpose::Signup).is_some());
}

// ── signup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_account_after_signup_code_verified() {
    let users = MockUserRepo::empty();
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());

    let request = RequestSignupCodeUseCase {
        users: users.clone(),
        codes: codes_with(&repo, mailer.clone(), &clock),
        hash_cost: 4,
    };
    request
        .execute(RequestSignupCodeInput {
            name: " Alice ".to_owned(),
            email: "Alice@Example.com".to_owned(),
            password: "correct horse".to_owned(),
        })
        .await
        .unwrap();

    let pending = repo.get("alice@example.com", CodePurpose::Signup).unwrap();
    let payload = pending.pending_payload.unwrap();
    assert_ne!(payload.password_hash, "correct horse");
    assert!(users.by_email("alice@example.com").is_none(), "no account before verify");

    let complete = CompleteSignupUseCase {
        users: users.clone(),
        codes: codes_with(&repo, mailer.clone(), &clock),
    };
    let user_id = complete
        .execute(CompleteSignupInput {
            email: "alice@example.com".to_owned(),
            code: mailer.last_code(),
        })
        .await
        .unwrap();

    let user = users.get(user_id).unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.points, 0);
    assert!(user.is_active);
    assert!(user.last_claim_at.is_none());
    assert!(bcrypt::verify("correct horse", user.password_hash.as_deref().unwrap()).unwrap());
}

#[tokio::test]
async fn should_reject_signup_for_registered_email() {
    let users = MockUserRepo::new(vec![test_user(ADDR)]);
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let uc = RequestSignupCodeUseCase {
        users,
        codes: codes_with(&repo, mailer.clone(), &clock),
        hash_cost: 4,
    };

    let result = uc
        .execute(RequestSignupCodeInput {
            name: "Bob".to_owned(),
            email: ADDR.to_owned(),
            password: "long enough".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(EntitlementError::EmailTaken)),
        "expected EmailTaken, got {result:?}"
    );
    assert_eq!(mailer.count(), 0);
}

#[tokio::test]
async fn should_reject_short_signup_password() {
    let repo = MockCodeRepo::empty();
    let clock = FixedClock::at(base_time());
    let uc = RequestSignupCodeUseCase {
        users: MockUserRepo::empty(),
        codes: codes_with(&repo, RecordingMailer::new(), &clock),
        hash_cost: 4,
    };

    let result = uc
        .execute(RequestSignupCodeInput {
            name: "Bob".to_owned(),
            email: ADDR.to_owned(),
            password: "short".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(EntitlementError::InvalidPassword)));
    assert!(repo.get(ADDR, CodePurpose::Signup).is_none());
}

// ── password reset ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_with_valid_code() {
    let user = test_user(ADDR);
    let users = MockUserRepo::new(vec![user.clone()]);
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());

    let request = RequestPasswordResetUseCase {
        users: users.clone(),
        codes: codes_with(&repo, mailer.clone(), &clock),
    };
    let issued = request
        .execute(RequestPasswordResetInput {
            email: ADDR.to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(issued.expires_in, 600);

    let reset = ResetPasswordUseCase {
        users: users.clone(),
        codes: codes_with(&repo, mailer.clone(), &clock),
        hash_cost: 4,
    };
    reset
        .execute(ResetPasswordInput {
            email: ADDR.to_owned(),
            code: mailer.last_code(),
            new_password: "brand new secret".to_owned(),
        })
        .await
        .unwrap();

    let updated = users.get(user.id).unwrap();
    let hash = updated.password_hash.unwrap();
    assert!(bcrypt::verify("brand new secret", &hash).unwrap());
    assert!(!bcrypt::verify("old password", &hash).unwrap());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_reset_email() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let uc = RequestPasswordResetUseCase {
        users: MockUserRepo::empty(),
        codes: codes_with(&repo, mailer.clone(), &clock),
    };

    let result = uc
        .execute(RequestPasswordResetInput {
            email: "nobody@example.com".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(EntitlementError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert_eq!(mailer.count(), 0);
}

#[tokio::test]
async fn should_refuse_reset_for_federated_account() {
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    let uc = RequestPasswordResetUseCase {
        users: MockUserRepo::new(vec![federated_user(ADDR)]),
        codes: codes_with(&repo, mailer.clone(), &clock),
    };

    let result = uc
        .execute(RequestPasswordResetInput {
            email: ADDR.to_owned(),
        })
        .await;

    match result {
        Err(e @ EntitlementError::FederatedAccount { .. }) => {
            assert!(e.to_string().contains("google"));
        }
        other => panic!("expected FederatedAccount, got {other:?}"),
    }
    assert_eq!(mailer.count(), 0);
}

#[tokio::test]
async fn should_keep_code_when_new_password_too_short() {
    let users = MockUserRepo::new(vec![test_user(ADDR)]);
    let repo = MockCodeRepo::empty();
    let mailer = RecordingMailer::new();
    let clock = FixedClock::at(base_time());
    codes_with(&repo, mailer.clone(), &clock)
        .issue(ADDR, CodePurpose::PasswordReset, None)
        .await
        .unwrap();

    let reset = ResetPasswordUseCase {
        users,
        codes: codes_with(&repo, mailer.clone(), &clock),
        hash_cost: 4,
    };
    let result = reset
        .execute(ResetPasswordInput {
            email: ADDR.to_owned(),
            code: mailer.last_code(),
            new_password: "short".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(EntitlementError::InvalidPassword)));
    let stored = repo.get(ADDR, CodePurpose::PasswordReset).unwrap();
    assert_eq!(stored.attempts, 0);
}
