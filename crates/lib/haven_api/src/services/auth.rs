//! Auth orchestrator — sign-up / sign-in / refresh / bearer verification.
//!
//! Composes the client registry, identity provider, user store, session
//! manager, and token service into the resolver-facing flows. Every exit is
//! one of the typed [`ApiError`] kinds; unexpected failures are wrapped,
//! never leaked.

use tracing::{debug, info, warn};

use haven_core::auth::AuthError;
use haven_core::auth::session::CreateSessionInput;
use haven_core::auth::validate::{self, FieldError, SignUpFields};
use haven_core::identity::IdentityProvider;
use haven_core::models::auth::{NewUser, Permission, Session, TokenClaims, TokenKind, User};
use haven_core::store::{SessionStore, UserStore};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Auth, AuthStage, AuthStep, RequestContext, SignInInput, SignUpInput};

/// A verified bearer identity, injected into resolver context for
/// already-authenticated calls.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session: Session,
    pub claims: TokenClaims,
}

/// `signUp` mutation flow.
///
/// Validate → create provider account → persist user → admission check →
/// create session → issue token pair → compose `Auth`.
pub async fn sign_up(
    state: &AppState,
    ctx: &RequestContext,
    input: SignUpInput,
) -> ApiResult<Auth> {
    let mut errors = validate::validate_sign_up(&SignUpFields {
        name: &input.name,
        email: &input.email,
        password: &input.password,
        phone_number: &input.phone_number,
        roles: &input.user_role,
    });
    if errors.is_empty() {
        let taken = state
            .users
            .exists_by_email_or_phone(&input.email, &input.phone_number)
            .await
            .map_err(|e| ApiError::unknown("signup uniqueness probe", e))?;
        if taken {
            errors.push(FieldError::new("email", "Email address already exist"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let Some(external_auth_id) = state
        .identity
        .create_account(
            &input.name,
            &input.email,
            &input.password,
            Some(&input.phone_number),
        )
        .await
    else {
        warn!(email = %input.email, "identity provider rejected account creation");
        return Err(ApiError::AccountCreationFailed);
    };

    let user = match state
        .users
        .create_user(NewUser {
            external_auth_id: external_auth_id.clone(),
            name: input.name,
            email: input.email,
            phone_number: Some(input.phone_number),
            roles: input.user_role,
            permissions: vec![Permission::default_user()],
        })
        .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "user record creation failed");
            // Roll back the provider account so the email is not left
            // claimed by an orphan the user can never sign in with.
            if !state.identity.delete_account(&external_auth_id).await {
                warn!(uid = %external_auth_id, "provider account rollback failed");
            }
            return Err(ApiError::AccountCreationFailed);
        }
    };

    let session = create_session(state, ctx, &user).await?;
    let (token, refresh_token) = issue_token_pair(state, ctx, &user, &session)?;

    info!(user_id = %user.id, "sign-up complete");
    Ok(Auth::from_user(
        &user,
        token,
        refresh_token,
        AuthStep {
            previous: AuthStage::SignUp,
            next: AuthStage::RedirectToEmailVerification,
        },
    ))
}

/// `signIn` mutation flow. Credential proof is a provider-issued id token
/// checked against the user's stored external uid.
pub async fn sign_in(
    state: &AppState,
    ctx: &RequestContext,
    input: SignInInput,
) -> ApiResult<Auth> {
    let errors = validate::validate_sign_in(&input.email, &input.id_token);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .users
        .find_by_email(&input.email)
        .await
        .map_err(|e| ApiError::unknown("signin user lookup", e))?
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldError::new(
                "email",
                "Email address does not exist",
            )])
        })?;

    let verified = state
        .identity
        .verify_id_token(&input.id_token, &user.external_auth_id)
        .await;
    if !verified {
        debug!(user_id = %user.id, "id token rejected by provider");
        return Err(ApiError::Validation(vec![FieldError::new(
            "idToken",
            "Invalid token received",
        )]));
    }

    let session = create_session(state, ctx, &user).await?;
    let (token, refresh_token) = issue_token_pair(state, ctx, &user, &session)?;

    info!(user_id = %user.id, "sign-in complete");
    Ok(Auth::from_user(
        &user,
        token,
        refresh_token,
        AuthStep {
            previous: AuthStage::SignIn,
            next: post_auth_stage(&user),
        },
    ))
}

/// Exchange a refresh token for a fresh session and token pair.
///
/// Single-use rotation: the superseded session is removed, so both of its
/// tokens stop verifying the moment the exchange succeeds.
pub async fn refresh(
    state: &AppState,
    ctx: &RequestContext,
    refresh_token: &str,
) -> ApiResult<Auth> {
    let (user, old_session, _claims) =
        resolve_token(state, refresh_token, TokenKind::Refresh).await?;

    state
        .sessions
        .delete_by_session_id(&old_session.session_id)
        .await
        .map_err(|e| ApiError::unknown("refresh rotation", e))?;

    let session = create_session(state, ctx, &user).await?;
    let (token, new_refresh) = issue_token_pair(state, ctx, &user, &session)?;

    debug!(user_id = %user.id, "session refreshed");
    Ok(Auth::from_user(
        &user,
        token,
        new_refresh,
        AuthStep {
            previous: AuthStage::RefreshSession,
            next: post_auth_stage(&user),
        },
    ))
}

/// Verify an `Authorization: Bearer` session token for an
/// already-authenticated call.
pub async fn verify_bearer(state: &AppState, token: &str) -> ApiResult<AuthenticatedUser> {
    let (user, session, claims) = resolve_token(state, token, TokenKind::Session).await?;
    Ok(AuthenticatedUser {
        user,
        session,
        claims,
    })
}

/// Decode a token, load its session and user, and enforce the
/// jti-to-session binding. Failure detail is logged only.
async fn resolve_token(
    state: &AppState,
    token: &str,
    kind: TokenKind,
) -> ApiResult<(User, Session, TokenClaims)> {
    let claims = state.tokens.decode(token).map_err(|e| {
        debug!(error = %e, "bearer token decode failed");
        ApiError::Unauthenticated
    })?;
    let session = state
        .sessions
        .find_by_session_id(&claims.sub)
        .await
        .map_err(|e| ApiError::unknown("session lookup", e))?
        .ok_or(ApiError::Unauthenticated)?;
    if !state.tokens.verify(token, kind, &session) {
        return Err(ApiError::Unauthenticated);
    }
    let user = state
        .users
        .find_by_id(&session.user_id)
        .await
        .map_err(|e| ApiError::unknown("user lookup", e))?
        .ok_or(ApiError::Unauthenticated)?;
    Ok((user, session, claims))
}

/// Create a session from the request headers, mapping admission failures to
/// `ClientInvalid` and everything else to `SessionCreationFailed`.
async fn create_session(
    state: &AppState,
    ctx: &RequestContext,
    user: &User,
) -> ApiResult<Session> {
    let app_id = ctx.app_id.clone().unwrap_or_default();
    if app_id.trim().is_empty() {
        return Err(ApiError::ClientInvalid);
    }
    state
        .session_manager
        .create_session(CreateSessionInput {
            client_key: ctx.client_key.clone().unwrap_or_default(),
            user_id: user.id.clone(),
            app_id,
            user_agent: ctx.user_agent.clone(),
            ipv4: ctx.ipv4.clone(),
        })
        .await
        .map_err(|e| match e {
            AuthError::ClientInvalid | AuthError::MissingAppId => ApiError::ClientInvalid,
            other => {
                warn!(error = %other, "session creation failed");
                ApiError::SessionCreationFailed
            }
        })
}

/// Generate the session and refresh tokens for a new session.
fn issue_token_pair(
    state: &AppState,
    ctx: &RequestContext,
    user: &User,
    session: &Session,
) -> ApiResult<(String, String)> {
    let app_id = ctx.app_id.as_deref().unwrap_or_default();
    let token = state
        .tokens
        .generate(TokenKind::Session, app_id, user, session)
        .map_err(|e| {
            warn!(error = %e, "session token generation failed");
            ApiError::TokenGenerationFailed
        })?;
    let refresh_token = state
        .tokens
        .generate(TokenKind::Refresh, app_id, user, session)
        .map_err(|e| {
            warn!(error = %e, "refresh token generation failed");
            ApiError::TokenGenerationFailed
        })?;
    Ok((token, refresh_token))
}

/// Where a signed-in user lands: home once the email is verified,
/// otherwise back to verification.
fn post_auth_stage(user: &User) -> AuthStage {
    if user.email_verified {
        AuthStage::RedirectToHome
    } else {
        AuthStage::RedirectToEmailVerification
    }
}
