//! AccountService tests
//!
//! Sign-up, verification, login and password reset against a real SQLite database.

mod common;

use common::{PASSWORD, TestEnv, email_of};
use unswtalk::errors::TalkError;
use unswtalk::services::SignupForm;

fn form(z_id: &str) -> SignupForm {
    SignupForm {
        z_id: z_id.to_string(),
        name: "Andrew Taylor".to_string(),
        email: email_of(z_id),
        password: PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn test_signup_mails_verification_link() {
    let env = TestEnv::new().await;
    env.services.accounts.signup(form("z5000001")).await.unwrap();

    let sent = env.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "z5000001@student.unsw.edu.au");
    assert_eq!(sent[0].subject, "UNSWtalk Account Verification");

    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    assert!(link.starts_with("/verify/"));
}

#[tokio::test]
async fn test_signup_rejects_bad_input() {
    let env = TestEnv::new().await;

    let bad_zid = SignupForm {
        z_id: "5000001".to_string(),
        ..form("z5000001")
    };
    let short_password = SignupForm {
        password: "abc".to_string(),
        ..form("z5000001")
    };
    let no_name = SignupForm {
        name: "   ".to_string(),
        ..form("z5000001")
    };

    for bad in [bad_zid, short_password, no_name] {
        let err = env.services.accounts.signup(bad).await.unwrap_err();
        assert!(matches!(err, TalkError::Validation(_)), "got {:?}", err);
    }
    assert!(env.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let env = TestEnv::new().await;
    env.services.accounts.signup(form("z5000001")).await.unwrap();

    let err = env.services.accounts.signup(form("z5000001")).await.unwrap_err();
    assert!(matches!(err, TalkError::Conflict(_)));
}

#[tokio::test]
async fn test_login_requires_verification() {
    let env = TestEnv::new().await;
    env.services.accounts.signup(form("z5000001")).await.unwrap();

    let err = env
        .services
        .accounts
        .login("z5000001", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Forbidden(_)));

    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    let token = link.trim_start_matches("/verify/");
    let verified = env.services.accounts.verify(token).await.unwrap();
    assert_eq!(verified, "z5000001");

    let user = env.services.accounts.login("z5000001", PASSWORD).await.unwrap();
    assert!(user.verified);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_user() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    let wrong = env
        .services
        .accounts
        .login("z5000001", "not-the-password")
        .await
        .unwrap_err();
    let unknown = env
        .services
        .accounts
        .login("z5999999", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong, TalkError::Unauthorized(_)));
    assert!(matches!(unknown, TalkError::Unauthorized(_)));
    // Same wording for both so the form does not reveal which accounts exist
    assert_eq!(wrong.message(), unknown.message());
}

#[tokio::test]
async fn test_verify_rejects_garbage_token() {
    let env = TestEnv::new().await;
    let err = env.services.accounts.verify("not-a-token").await.unwrap_err();
    assert!(matches!(err, TalkError::Token(_)));
}

#[tokio::test]
async fn test_session_token_round_trip() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    let token = env.services.accounts.session_token("z5000001").unwrap();
    assert_eq!(
        env.services.accounts.session_user(&token).as_deref(),
        Some("z5000001")
    );
    assert_eq!(env.services.accounts.session_user("tampered"), None);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    env.services.accounts.request_reset("z5000001").await.unwrap();
    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    let token = link.trim_start_matches("/reset/").to_string();

    assert_eq!(env.services.accounts.reset_target(&token).await.unwrap(), "z5000001");

    let err = env.services.accounts.reset(&token, "abc").await.unwrap_err();
    assert!(matches!(err, TalkError::Validation(_)));

    env.services
        .accounts
        .reset(&token, "a-brand-new-password")
        .await
        .unwrap();

    assert!(
        env.services
            .accounts
            .login("z5000001", PASSWORD)
            .await
            .is_err()
    );
    env.services
        .accounts
        .login("z5000001", "a-brand-new-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_verifies_unverified_account() {
    let env = TestEnv::new().await;
    env.services.accounts.signup(form("z5000001")).await.unwrap();

    env.services.accounts.request_reset("z5000001").await.unwrap();
    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    let token = link.trim_start_matches("/reset/");

    let user = env
        .services
        .accounts
        .reset(token, "another-password")
        .await
        .unwrap();
    assert!(user.verified);
    env.services
        .accounts
        .login("z5000001", "another-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_request_for_unknown_user() {
    let env = TestEnv::new().await;
    let err = env
        .services
        .accounts
        .request_reset("z5999999")
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::NotFound(_)));
}

#[tokio::test]
async fn test_reset_link_is_single_use() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    env.services.accounts.request_reset("z5000001").await.unwrap();
    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    let token = link.trim_start_matches("/reset/").to_string();

    env.services
        .accounts
        .reset(&token, "first-new-password")
        .await
        .unwrap();

    let err = env
        .services
        .accounts
        .reset(&token, "second-new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Token(_)));
    assert!(env.services.accounts.reset_target(&token).await.is_err());

    env.services
        .accounts
        .login("z5000001", "first-new-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_newer_reset_request_supersedes_older_link() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    env.services.accounts.request_reset("z5000001").await.unwrap();
    let first = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    env.services.accounts.request_reset("z5000001").await.unwrap();
    let second = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    assert_ne!(first, second);

    let old_token = first.trim_start_matches("/reset/");
    let err = env
        .services
        .accounts
        .reset(old_token, "stale-link-password")
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::Token(_)));

    let new_token = second.trim_start_matches("/reset/");
    env.services
        .accounts
        .reset(new_token, "fresh-link-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_password_change_spends_pending_reset_link() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;

    env.services.accounts.request_reset("z5000001").await.unwrap();
    let link = env.mailer.last_link_to(&email_of("z5000001")).unwrap();
    let token = link.trim_start_matches("/reset/").to_string();

    env.services
        .accounts
        .set_password("z5000001", "changed-in-settings")
        .await
        .unwrap();

    assert!(env.services.accounts.reset_target(&token).await.is_err());
}
