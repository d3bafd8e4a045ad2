/// Authentication endpoints
///
/// Signup, confirmation, login, and password reset are delegated to the
/// external identity provider; this module owns the HTTP surface, the login
/// throttle, and session-cookie issuance.
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register identity with the provider
/// - `POST /auth/confirm` - Confirm signup with the emailed code
/// - `POST /auth/login` - Verify credentials, apply the throttle, set cookies
/// - `GET  /auth/session` - Check presence of a valid session cookie
/// - `POST /auth/logout` - Clear session cookies
/// - `POST /auth/forgot-password` - Trigger the provider reset flow
/// - `POST /auth/reset-password` - Complete a password reset with the code
///
/// # Session cookies
///
/// Login sets three http-only cookies issued by the provider:
/// `access_token` and `id_token` (1 hour) and `refresh_token` (24 hours),
/// all `SameSite=Lax`, `Path=/`. The `Secure` flag follows configuration.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use taskdeck_shared::auth::throttle::{format_remaining, ThrottleStatus};
use taskdeck_shared::idp::IdpError;
use taskdeck_shared::models::user::User;
use validator::Validate;

/// Cookie lifetime for access and id tokens
const SESSION_COOKIE_HOURS: i64 = 1;

/// Cookie lifetime for the refresh token
const REFRESH_COOKIE_HOURS: i64 = 24;

/// Signup and login request
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password is not strong enough"))]
    pub password: String,
}

/// Confirmation request
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Verification code from the signup email
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password-reset completion request
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Reset code from the email
    #[validate(length(min = 1, message = "Reset code is required"))]
    pub code: String,

    /// New password
    #[validate(length(min = 8, message = "Password is not strong enough"))]
    pub password: String,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// Human-readable outcome
    pub message: String,

    /// Provider-issued subject identifier
    pub user_sub: String,
}

fn session_cookie(name: &'static str, value: String, hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(hours))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Register a new identity with the provider
///
/// The provider emails a verification code; the account is unusable until
/// `POST /auth/confirm` succeeds. Password length is checked here before
/// the gateway is reached.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed (email format, password length)
/// - `400 Bad Request`: Provider rejection (already exists, weak password)
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> ApiResult<Json<SignupResponse>> {
    req.validate()?;

    let output = state.idp.sign_up(&req.email, &req.password).await?;

    tracing::info!(email = %req.email, "Signup initiated");

    Ok(Json(SignupResponse {
        message: "Signup successful. A verification code has been sent to your email.".to_string(),
        user_sub: output.user_sub,
    }))
}

/// Confirm a signup with the emailed code
///
/// On success the local shadow user row is created (idempotently), keyed by
/// email.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid or expired code
pub async fn confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.idp.confirm_sign_up(&req.email, &req.code).await?;

    let user = User::upsert_by_email(&state.db, &req.email, None).await?;

    tracing::info!(email = %req.email, user_id = %user.id, "Signup confirmed");

    Ok(Json(MessageResponse {
        message: "Signup confirmed. You can now log in.".to_string(),
    }))
}

/// Login: verify credentials, apply the throttle, issue session cookies
///
/// The throttle is consulted before the provider call; while locked, the
/// attempt never reaches the credential check and the failure count is not
/// touched. A credential mismatch under the threshold reports attempts
/// remaining; the failure that reaches the maximum, and every attempt while
/// locked, reports the remaining lockout time as minutes and seconds.
///
/// # Errors
///
/// - `429 Too Many Requests`: Locked out (with `Retry-After`)
/// - `401 Unauthorized`: Incorrect credentials
/// - `400 Bad Request`: Other provider rejection (e.g. unconfirmed user)
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<AuthRequest>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    // Reject locked-out attempts before touching the provider
    if let ThrottleStatus::Locked { remaining } = state.throttle.status(&req.email) {
        return Err(lockout_error(remaining));
    }

    let tokens = match state.idp.initiate_auth(&req.email, &req.password).await {
        Ok(tokens) => tokens,
        Err(IdpError::NotAuthorized) => {
            return Err(match state.throttle.record_failure(&req.email) {
                ThrottleStatus::Locked { remaining } => lockout_error(remaining),
                ThrottleStatus::Open { attempts_remaining } => ApiError::Unauthorized(format!(
                    "Incorrect username or password. {} attempts remaining",
                    attempts_remaining
                )),
            });
        }
        Err(e) => return Err(e.into()),
    };

    state.throttle.record_success(&req.email);

    tracing::info!(email = %req.email, "Login successful");

    let secure = state.config.api.cookie_secure;
    let mut jar = jar
        .add(session_cookie(
            "access_token",
            tokens.access_token,
            SESSION_COOKIE_HOURS,
            secure,
        ))
        .add(session_cookie(
            "id_token",
            tokens.id_token,
            SESSION_COOKIE_HOURS,
            secure,
        ));

    if let Some(refresh_token) = tokens.refresh_token {
        jar = jar.add(session_cookie(
            "refresh_token",
            refresh_token,
            REFRESH_COOKIE_HOURS,
            secure,
        ));
    }

    Ok((
        jar,
        Json(MessageResponse {
            message: "Login successful".to_string(),
        }),
    ))
}

fn lockout_error(remaining: chrono::Duration) -> ApiError {
    ApiError::RateLimitExceeded {
        retry_after: remaining.num_seconds().max(0) as u64,
        message: format!(
            "Too many failed login attempts. Try again in {}",
            format_remaining(remaining)
        ),
    }
}

/// Check presence of a session cookie
///
/// # Errors
///
/// - `401 Unauthorized`: No access-token cookie present
pub async fn session(jar: CookieJar) -> ApiResult<Json<MessageResponse>> {
    if jar.get("access_token").is_none() {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Session active".to_string(),
    }))
}

/// Clear all session cookies
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar
        .add(removal_cookie("access_token"))
        .add(removal_cookie("id_token"))
        .add(removal_cookie("refresh_token"));

    (
        jar,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// Trigger the provider's password-reset flow
///
/// # Errors
///
/// - `400 Bad Request`: Provider rejection (e.g. reset limit exceeded)
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.idp.forgot_password(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Password reset code sent to your email".to_string(),
    }))
}

/// Complete a password reset with the emailed code
///
/// # Errors
///
/// - `422 Unprocessable Entity`: New password too short
/// - `400 Bad Request`: Invalid or expired code
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .idp
        .confirm_forgot_password(&req.email, &req.code, &req.password)
        .await?;

    tracing::info!(email = %req.email, "Password reset completed");

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_validation() {
        let req = AuthRequest {
            email: "a@x.com".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());

        let req = AuthRequest {
            email: "a@x.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_email_validation() {
        let req = EmailRequest {
            email: "not-an-email".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_lockout_error_message_format() {
        let err = lockout_error(chrono::Duration::seconds(300));
        match err {
            ApiError::RateLimitExceeded {
                retry_after,
                message,
            } => {
                assert_eq!(retry_after, 300);
                assert_eq!(
                    message,
                    "Too many failed login attempts. Try again in 5m 0s"
                );
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("access_token", "tok".to_string(), 1, false);
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));
    }
}
