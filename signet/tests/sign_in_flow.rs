//! End-to-end sign-in, sign-up, and credential flows over the mock transport.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use pretty_assertions::assert_eq;
use signet::prelude::*;
use signet::MockTransport;

const PASSWORD_CHALLENGE: &str = r#"{"challenge_type":"password","continuation_token":"ct-pw"}"#;
const OOB_CHALLENGE: &str = r#"{
    "challenge_type": "oob",
    "continuation_token": "ct-oob",
    "challenge_target_label": "u***@contoso.com",
    "challenge_channel": "email",
    "code_length": 8
}"#;

fn client(transport: MockTransport) -> NativeAuthClient {
    let config = ClientConfiguration::new("client-1", "https://contoso.ciamlogin.com/contoso")
        .unwrap()
        .with_scopes(["openid", "offline_access"]);
    NativeAuthClient::with_transport(config, Arc::new(transport))
}

fn token_body(username: &str, oid: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"preferred_username": username, "oid": oid})
            .to_string()
            .as_bytes(),
    );
    serde_json::json!({
        "token_type": "Bearer",
        "scope": "openid offline_access",
        "expires_in": 3600,
        "ext_expires_in": 7200,
        "access_token": "at-1",
        "refresh_token": "rt-1",
        "id_token": format!("{header}.{payload}.sig"),
    })
    .to_string()
}

#[tokio::test]
async fn test_password_sign_in_end_to_end() {
    let client = client(
        MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(200, token_body("user@contoso.com", "oid-1")),
    );

    let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
    let account = match client.sign_in(parameters).await {
        SignInStartOutcome::Completed(account) => account,
        other => panic!("expected completion, got {other:?}"),
    };

    assert_eq!(account.username(), "user@contoso.com");
    assert_eq!(account.home_account_id(), "oid-1");
    assert_eq!(account.token_result().access_token, "at-1");
    assert_eq!(account.refresh_token(), Some("rt-1"));
}

#[tokio::test]
async fn test_code_sign_in_with_resend() {
    let client = client(
        MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, OOB_CHALLENGE)
            .with_json(
                200,
                r#"{
                    "challenge_type": "oob",
                    "continuation_token": "ct-oob-2",
                    "challenge_target_label": "u***@contoso.com",
                    "challenge_channel": "email",
                    "code_length": 8
                }"#,
            )
            .with_json(200, token_body("user@contoso.com", "oid-1")),
    );

    let state = match client.sign_in(SignInParameters::new("user@contoso.com")).await {
        SignInStartOutcome::CodeRequired { state, .. } => state,
        other => panic!("expected code required, got {other:?}"),
    };

    let controller = client.sign_in_controller();
    let fresh = match controller.resend_code(&state).await {
        SignInResendCodeOutcome::CodeRequired { state, .. } => state,
        SignInResendCodeOutcome::Error(error) => panic!("resend failed: {error}"),
    };

    // the old state was consumed by the resend
    match controller.submit_code("12345678", &state).await {
        SignInVerifyCodeOutcome::Error { new_state, .. } => assert!(new_state.is_none()),
        other => panic!("expected invalid-state error, got {other:?}"),
    }

    match controller.submit_code("12345678", &fresh).await {
        SignInVerifyCodeOutcome::Completed(account) => {
            assert_eq!(account.username(), "user@contoso.com");
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_up_then_silent_sign_in() {
    let client = client(
        MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-start"}"#)
            .with_json(200, OOB_CHALLENGE)
            .with_json(200, r#"{"continuation_token":"ct-done"}"#)
            .with_json(200, token_body("new@contoso.com", "oid-2")),
    );

    let state = match client.sign_up(SignUpParameters::new("new@contoso.com")).await {
        SignUpStartOutcome::CodeRequired { state, .. } => state,
        SignUpStartOutcome::Error(error) => panic!("sign-up failed: {error}"),
    };

    let sign_in_state = match client.sign_up_controller().submit_code("12345678", &state).await {
        SignUpVerifyCodeOutcome::Completed(sign_in_state) => sign_in_state,
        other => panic!("expected completion, got {other:?}"),
    };

    match client
        .sign_in_controller()
        .sign_in_after_sign_up(&sign_in_state)
        .await
    {
        SignInAfterSignUpOutcome::Completed(account) => {
            assert_eq!(account.username(), "new@contoso.com");
            assert_eq!(account.home_account_id(), "oid-2");
        }
        SignInAfterSignUpOutcome::Error(error) => panic!("silent sign-in failed: {error}"),
    }
}

#[tokio::test]
async fn test_refresh_and_sign_out() {
    let transport = MockTransport::new()
        .with_json(200, r#"{"continuation_token":"ct-init"}"#)
        .with_json(200, PASSWORD_CHALLENGE)
        .with_json(200, token_body("user@contoso.com", "oid-1"))
        .with_json(
            200,
            token_body("user@contoso.com", "oid-1")
                .replace("at-1", "at-2")
                .replace("rt-1", "rt-2"),
        );
    let client = client(transport);

    let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
    let account = match client.sign_in(parameters).await {
        SignInStartOutcome::Completed(account) => account,
        other => panic!("expected completion, got {other:?}"),
    };

    // force a refresh even though the cached token is still valid
    let refreshed = match client.retrieve_access_token(&account, true).await {
        RetrieveAccessTokenOutcome::Completed {
            access_token,
            account,
        } => {
            assert_eq!(access_token.token, "at-2");
            account
        }
        RetrieveAccessTokenOutcome::Error(error) => panic!("refresh failed: {error}"),
    };
    assert_eq!(refreshed.refresh_token(), Some("rt-2"));

    match client.sign_out(&refreshed).await {
        SignOutOutcome::Completed => {}
        SignOutOutcome::Error(error) => panic!("sign-out failed: {error}"),
    }
}

#[tokio::test]
async fn test_mfa_demand_surfaces_as_browser_required() {
    let client = client(
        MockTransport::new()
            .with_json(200, r#"{"continuation_token":"ct-init"}"#)
            .with_json(200, PASSWORD_CHALLENGE)
            .with_json(
                400,
                r#"{"error":"invalid_grant","error_codes":[50079],"error_description":"MFA required."}"#,
            ),
    );

    let parameters = SignInParameters::new("user@contoso.com").with_password("hunter2");
    match client.sign_in(parameters).await {
        SignInStartOutcome::Error(error) => {
            assert!(error.is_browser_required());
            assert_eq!(error.message(), "MFA required.");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_failure_never_leaks_raw() {
    let client = client(MockTransport::new()); // empty queue: every send fails

    match client.sign_in(SignInParameters::new("user@contoso.com")).await {
        SignInStartOutcome::Error(error) => {
            assert!(!error.is_browser_required());
            assert!(!error.message().is_empty());
        }
        other => panic!("expected error, got {other:?}"),
    }
}
