//! Integration tests for `ApiClient` against the in-process stub gateway.

use std::time::Duration;

use placement_api::stub::{StubGateway, StubJob};
use placement_api::{ApiClient, ApiError, RegisterRequest};
use placement_session::Role;
use serde::Deserialize;

// =========================================================================
// Helpers
// =========================================================================

async fn setup() -> (StubGateway, ApiClient) {
    let gateway = StubGateway::start().await.expect("stub should bind");
    let client =
        ApiClient::new(&gateway.base_url(), Duration::from_secs(5)).expect("valid base url");
    (gateway, client)
}

#[derive(Debug, Deserialize)]
struct Profile {
    email: String,
    name: String,
    role: Role,
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_valid_credentials_returns_token_and_role() {
    let (gateway, client) = setup().await;
    gateway.add_user("boss@acme.io", "pw", Role::Employer);

    let creds = client.login("boss@acme.io", "pw").await.unwrap();

    assert_eq!(creds.role, Role::Employer);
    assert_eq!(creds.token.len(), 32);
    assert_eq!(gateway.active_sessions(), 1);
}

#[tokio::test]
async fn test_login_wrong_password_is_invalid_credentials() {
    let (gateway, client) = setup().await;
    gateway.add_user("a@b.c", "right", Role::Student);

    let result = client.login("a@b.c", "wrong").await;

    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    assert_eq!(gateway.active_sessions(), 0);
}

#[tokio::test]
async fn test_login_unknown_user_is_invalid_credentials() {
    let (_gateway, client) = setup().await;

    let result = client.login("nobody@b.c", "pw").await;

    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_unreachable_gateway_is_transport_error() {
    // Bind and drop a stub so the port is (almost certainly) closed.
    let base = {
        let gateway = StubGateway::start().await.unwrap();
        gateway.base_url()
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let client = ApiClient::new(&base, Duration::from_secs(2)).unwrap();

    let result = client.login("a@b.c", "pw").await;

    assert!(matches!(result, Err(ApiError::Transport(_))));
}

// =========================================================================
// Registration and password reset
// =========================================================================

#[tokio::test]
async fn test_register_then_login_succeeds() {
    let (_gateway, client) = setup().await;

    let user = client
        .register(&RegisterRequest {
            name: "Ana".into(),
            email: "ana@uni.edu".into(),
            password: "pw".into(),
            role: Role::Student,
        })
        .await
        .unwrap();
    assert_eq!(user.email, "ana@uni.edu");
    assert_eq!(user.role, Role::Student);

    let creds = client.login("ana@uni.edu", "pw").await.unwrap();
    assert_eq!(creds.role, Role::Student);
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected_with_detail() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "pw", Role::Student);

    let result = client
        .register(&RegisterRequest {
            name: "Ana".into(),
            email: "ana@uni.edu".into(),
            password: "other".into(),
            role: Role::Student,
        })
        .await;

    match result {
        Err(ApiError::Rejected { status, detail }) => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Email already registered");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reset_password_flow_changes_password() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "old", Role::Student);

    let message = client.forgot_password("ana@uni.edu").await.unwrap();
    assert!(!message.is_empty());

    let reset_token = gateway.last_reset_token("ana@uni.edu").unwrap();
    client.reset_password(&reset_token, "new").await.unwrap();

    assert!(matches!(
        client.login("ana@uni.edu", "old").await,
        Err(ApiError::InvalidCredentials)
    ));
    assert!(client.login("ana@uni.edu", "new").await.is_ok());
}

#[tokio::test]
async fn test_reset_password_bad_token_is_rejected() {
    let (_gateway, client) = setup().await;

    let result = client.reset_password("not-a-token", "new").await;

    assert!(matches!(result, Err(ApiError::Rejected { status: 400, .. })));
}

#[tokio::test]
async fn test_forgot_password_unknown_email_still_acknowledged() {
    let (gateway, client) = setup().await;

    assert!(client.forgot_password("ghost@uni.edu").await.is_ok());
    assert!(gateway.last_reset_token("ghost@uni.edu").is_none());
}

// =========================================================================
// Authenticated requests
// =========================================================================

#[tokio::test]
async fn test_get_with_valid_token_returns_body() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "pw", Role::Student);
    let creds = client.login("ana@uni.edu", "pw").await.unwrap();

    let profile: Profile = client.get(&creds.token, "user/profile").await.unwrap();

    assert_eq!(profile.email, "ana@uni.edu");
    assert_eq!(profile.role, Role::Student);
}

#[tokio::test]
async fn test_get_after_revocation_is_unauthorized() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "pw", Role::Student);
    let creds = client.login("ana@uni.edu", "pw").await.unwrap();

    gateway.revoke_all();
    let result: Result<Profile, _> = client.get(&creds.token, "/user/profile").await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_get_wrong_role_is_rejected_not_unauthorized() {
    let (gateway, client) = setup().await;
    gateway.add_user("boss@acme.io", "pw", Role::Employer);
    let creds = client.login("boss@acme.io", "pw").await.unwrap();

    let result: Result<serde_json::Value, _> = client.get(&creds.token, "admin/alumni").await;

    match result {
        Err(err @ ApiError::Rejected { status: 403, .. }) => assert!(!err.is_unauthorized()),
        other => panic!("expected 403, got {other:?}"),
    }
}

#[tokio::test]
async fn test_put_updates_profile() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "pw", Role::Student);
    let creds = client.login("ana@uni.edu", "pw").await.unwrap();

    let updated: Profile = client
        .put(&creds.token, "user/profile", &serde_json::json!({ "name": "Ana M." }))
        .await
        .unwrap();

    assert_eq!(updated.name, "Ana M.");
}

#[tokio::test]
async fn test_post_then_delete_job_with_empty_response() {
    let (gateway, client) = setup().await;
    gateway.add_user("boss@acme.io", "pw", Role::Employer);
    let creds = client.login("boss@acme.io", "pw").await.unwrap();

    let job: StubJob = client
        .post(
            &creds.token,
            "jobs",
            &serde_json::json!({ "title": "Intern", "company": "Acme" }),
        )
        .await
        .unwrap();
    assert_eq!(job.posted_by, "boss@acme.io");

    // 204 No Content decodes as unit.
    let () = client
        .delete(&creds.token, &format!("jobs/{}", job.id))
        .await
        .unwrap();

    let jobs: Vec<StubJob> = client.get(&creds.token, "jobs").await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn test_get_unexpected_body_is_invalid_response() {
    let (gateway, client) = setup().await;
    gateway.add_user("ana@uni.edu", "pw", Role::Student);
    gateway.add_job("Intern", "Acme");
    let creds = client.login("ana@uni.edu", "pw").await.unwrap();

    // /jobs returns a list, not a profile object.
    let result: Result<Profile, _> = client.get(&creds.token, "jobs").await;

    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
}
