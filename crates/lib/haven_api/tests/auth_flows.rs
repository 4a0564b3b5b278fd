//! End-to-end orchestrator flows over the in-memory store and identity
//! provider: sign-up, sign-in, refresh rotation, and bearer verification.

use std::sync::Arc;

use haven_api::error::{ApiError, Severity};
use haven_api::models::{AuthStage, RequestContext, SignInInput, SignUpInput};
use haven_api::services::auth;
use haven_api::AppState;
use haven_core::config::AuthConfig;
use haven_core::identity::memory::MemoryIdentityProvider;
use haven_core::models::auth::{Client, NewUser, Role, User};
use haven_core::store::memory::MemoryAuthStore;
use haven_core::store::{StoreError, UserStore};

fn test_state() -> (AppState, Arc<MemoryAuthStore>, Arc<MemoryIdentityProvider>) {
    let store = Arc::new(MemoryAuthStore::new());
    store.add_client(Client {
        id: "client-1".into(),
        name: "Web".into(),
        key: "web-key".into(),
        enabled: true,
    });
    let identity = Arc::new(MemoryIdentityProvider::new());
    let config = AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        issuer: "haven.test".into(),
        session_token_expire_secs: 900,
        refresh_token_expire_secs: 86_400,
    };
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        identity.clone(),
        config,
    );
    (state, store, identity)
}

fn ctx() -> RequestContext {
    RequestContext {
        client_key: Some("web-key".into()),
        app_id: Some("app-1".into()),
        user_agent: Some("tests".into()),
        ipv4: None,
    }
}

fn signup_input(email: &str, phone: &str) -> SignUpInput {
    SignUpInput {
        name: "Asha Rao".into(),
        phone_number: phone.into(),
        email: email.into(),
        password: "Abcdef1!".into(),
        user_role: vec![Role::Tenant],
    }
}

#[tokio::test]
async fn sign_up_returns_tokens_and_verification_step() {
    let (state, store, _) = test_state();
    let result = auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("sign up");

    assert!(!result.token.is_empty());
    assert!(!result.refresh_token.is_empty());
    assert_ne!(result.token, result.refresh_token);
    assert_eq!(AuthStage::SignUp, result.auth_step.previous);
    assert_eq!(
        AuthStage::RedirectToEmailVerification,
        result.auth_step.next
    );

    // The session token is immediately usable as a bearer credential.
    let authed = auth::verify_bearer(&state, &result.token)
        .await
        .expect("bearer verifies");
    assert_eq!(result.id, authed.user.id);
    assert_eq!(Some(authed.session.id), authed.user.session_ref);
    assert_eq!(1, store.session_count());
}

#[tokio::test]
async fn duplicate_email_is_a_field_level_validation_error() {
    let (state, _, _) = test_state();
    auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("first sign up");

    let err = auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000002"))
        .await
        .unwrap_err();
    assert_eq!("INVALID_INPUT", err.code());
    assert_eq!(Severity::Info, err.severity());
    let fields = err.field_errors().expect("structured payload");
    assert!(fields.iter().any(|f| f.field == "email"));
}

#[tokio::test]
async fn weak_password_is_rejected_before_any_side_effect() {
    let (state, store, _) = test_state();
    let mut input = signup_input("asha@example.com", "9000000001");
    input.password = "abcdefgh".into();

    let err = auth::sign_up(&state, &ctx(), input).await.unwrap_err();
    let fields = err.field_errors().expect("payload");
    assert!(fields.iter().any(|f| f.field == "password"));
    assert!(store.find_by_email("asha@example.com").await.unwrap().is_none());
    assert_eq!(0, store.session_count());
}

#[tokio::test]
async fn missing_app_id_fails_before_any_session_is_written() {
    let (state, store, _) = test_state();
    let mut bad_ctx = ctx();
    bad_ctx.app_id = None;

    let err = auth::sign_up(
        &state,
        &bad_ctx,
        signup_input("asha@example.com", "9000000001"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::ClientInvalid));
    assert_eq!("CLIENT_HEADERS_INVALID", err.code());
    assert_eq!(0, store.session_count());
}

#[tokio::test]
async fn unknown_client_key_is_client_invalid() {
    let (state, _, _) = test_state();
    let mut bad_ctx = ctx();
    bad_ctx.client_key = Some("not-a-client".into());

    let err = auth::sign_up(
        &state,
        &bad_ctx,
        signup_input("asha@example.com", "9000000001"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::ClientInvalid));
}

/// User store whose writes fail, standing in for a database outage between
/// provider account creation and the local record insert.
struct WriteFailingUsers(Arc<MemoryAuthStore>);

#[async_trait::async_trait]
impl UserStore for WriteFailingUsers {
    async fn create_user(&self, _new_user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Conflict("writes disabled".into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.0.find_by_email(email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.0.find_by_id(id).await
    }

    async fn exists_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<bool, StoreError> {
        self.0.exists_by_email_or_phone(email, phone).await
    }

    async fn attach_session(
        &self,
        user_id: &str,
        session_row_id: &str,
    ) -> Result<(), StoreError> {
        self.0.attach_session(user_id, session_row_id).await
    }
}

#[tokio::test]
async fn failed_user_record_rolls_back_the_provider_account() {
    let store = Arc::new(MemoryAuthStore::new());
    store.add_client(Client {
        id: "client-1".into(),
        name: "Web".into(),
        key: "web-key".into(),
        enabled: true,
    });
    let identity = Arc::new(MemoryIdentityProvider::new());
    let config = AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        issuer: "haven.test".into(),
        session_token_expire_secs: 900,
        refresh_token_expire_secs: 86_400,
    };
    let state = AppState::new(
        Arc::new(WriteFailingUsers(store.clone())),
        store.clone(),
        store.clone(),
        identity.clone(),
        config,
    );

    let err = auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AccountCreationFailed));
    // The provider account was rolled back, so the email is reclaimable and
    // no half-created identity can authenticate.
    assert!(
        identity
            .issue_id_token("asha@example.com", "Abcdef1!")
            .is_none()
    );
    assert_eq!(0, store.session_count());
}

#[tokio::test]
async fn sign_in_with_provider_issued_token() {
    let (state, _, identity) = test_state();
    auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("sign up");

    let id_token = identity
        .issue_id_token("asha@example.com", "Abcdef1!")
        .expect("id token");
    let result = auth::sign_in(
        &state,
        &ctx(),
        SignInInput {
            email: "asha@example.com".into(),
            id_token,
        },
    )
    .await
    .expect("sign in");

    assert_eq!(AuthStage::SignIn, result.auth_step.previous);
    // Email not yet verified, so sign-in routes back to verification.
    assert_eq!(
        AuthStage::RedirectToEmailVerification,
        result.auth_step.next
    );
}

#[tokio::test]
async fn sign_in_rejects_a_bad_id_token() {
    let (state, _, _) = test_state();
    auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("sign up");

    let err = auth::sign_in(
        &state,
        &ctx(),
        SignInInput {
            email: "asha@example.com".into(),
            id_token: "forged".into(),
        },
    )
    .await
    .unwrap_err();
    let fields = err.field_errors().expect("payload");
    assert!(fields.iter().any(|f| f.field == "idToken"));
}

#[tokio::test]
async fn sign_in_rejects_an_unknown_email() {
    let (state, _, _) = test_state();
    let err = auth::sign_in(
        &state,
        &ctx(),
        SignInInput {
            email: "nobody@example.com".into(),
            id_token: "anything".into(),
        },
    )
    .await
    .unwrap_err();
    let fields = err.field_errors().expect("payload");
    assert!(fields.iter().any(|f| f.field == "email"));
}

#[tokio::test]
async fn refresh_rotates_the_session_and_invalidates_old_tokens() {
    let (state, store, _) = test_state();
    let first = auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("sign up");

    let second = auth::refresh(&state, &ctx(), &first.refresh_token)
        .await
        .expect("refresh");
    assert_eq!(AuthStage::RefreshSession, second.auth_step.previous);
    assert!(!second.token.is_empty());
    assert_eq!(1, store.session_count());

    // The superseded session's tokens no longer verify.
    assert!(matches!(
        auth::refresh(&state, &ctx(), &first.refresh_token)
            .await
            .unwrap_err(),
        ApiError::Unauthenticated
    ));
    assert!(matches!(
        auth::verify_bearer(&state, &first.token).await.unwrap_err(),
        ApiError::Unauthenticated
    ));

    // The fresh pair works.
    auth::verify_bearer(&state, &second.token)
        .await
        .expect("new bearer verifies");
}

#[tokio::test]
async fn a_refresh_token_is_not_a_bearer_credential() {
    let (state, _, _) = test_state();
    let result = auth::sign_up(&state, &ctx(), signup_input("asha@example.com", "9000000001"))
        .await
        .expect("sign up");

    // Same signature, same session — but the jti binds to the refresh slot.
    assert!(matches!(
        auth::verify_bearer(&state, &result.refresh_token)
            .await
            .unwrap_err(),
        ApiError::Unauthenticated
    ));
}
