/// Account endpoints
///
/// # Endpoints
///
/// - `POST /api/account/register` - Start registration, mails an activation link
/// - `GET  /api/account/verify/:token` - Activate and sign in
/// - `POST /api/account/login` - Sign in
/// - `GET  /api/account` - Current profile
/// - `PUT  /api/account` - Change email and/or password
/// - `POST /api/account/forgot/:email` - Mail a reset link
/// - `GET  /api/account/reset/:token` - Check a reset link
/// - `POST /api/account/reset` - Set a new password with a reset token
///
/// Sign-in routes return a session token to send back as
/// `Authorization: Bearer <token>`.

use crate::{
    app::{AppState, AuthContext},
    error::ApiResult,
    routes::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use daybook_shared::auth::jwt::{create_token, Claims, SessionLength};
use daybook_shared::models::user::Profile;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,

    /// Length policy is enforced by the account service
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Keep the session for 30 days instead of 24 hours
    #[serde(default)]
    pub persist: bool,
}

/// Profile change request; omitted fields are left alone
#[derive(Debug, Default, Deserialize)]
pub struct ModifyAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,

    pub password: String,
}

/// Signed-in session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token
    pub token: String,

    pub expires_at: DateTime<Utc>,

    pub profile: Profile,
}

fn start_session(state: &AppState, profile: Profile, length: SessionLength) -> ApiResult<SessionResponse> {
    let claims = Claims::new(profile.user_id.clone(), length);
    let token = create_token(&claims, state.jwt_secret())?;

    Ok(SessionResponse {
        token,
        expires_at: claims.expires_at(),
        profile,
    })
}

/// Starts a registration
///
/// # Errors
///
/// - `422`: Invalid email or password
/// - `409`: Email belongs to an active account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate()?;

    state
        .services
        .accounts
        .create_verification(&req.email, &req.password)
        .await?;

    Ok(Json(ApiResponse::empty()))
}

/// Redeems an activation link and signs the new user in
///
/// # Errors
///
/// - `404`: Unknown or already used token
/// - `409`: Email was activated by another account meanwhile
pub async fn verify(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    let accounts = &state.services.accounts;
    let user_id = accounts.activate(&token).await?;
    let profile = accounts.get_profile(&user_id).await?;

    let session = start_session(&state, profile, SessionLength::Session)?;
    Ok(Json(ApiResponse::ok(session)))
}

/// Signs in with email and password
///
/// # Errors
///
/// - `404`: Wrong email or password, or the account is not active yet
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    req.validate()?;

    let profile = state
        .services
        .accounts
        .login(&req.email, &req.password)
        .await?;

    let session = start_session(&state, profile, SessionLength::from_persist(req.persist))?;
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Profile>>> {
    let profile = state.services.accounts.get_profile(&auth.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ModifyAccountRequest>,
) -> ApiResult<Json<ApiResponse<Profile>>> {
    let profile = state
        .services
        .accounts
        .update_profile(&auth.user_id, req.email.as_deref(), req.password.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(profile)))
}

/// Mails a reset link
///
/// Always reports success so the response does not reveal whether the
/// address has an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Json<ApiResponse<()>> {
    if let Err(e) = state.services.accounts.request_password_reset(&email).await {
        tracing::warn!(error = %e, "Password reset request failed");
    }

    Json(ApiResponse::empty())
}

/// # Errors
///
/// - `404`: Unknown, used or expired token
pub async fn check_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.accounts.check_reset_token(&token).await?;
    Ok(Json(ApiResponse::empty()))
}

/// # Errors
///
/// - `404`: Unknown, used or expired token
/// - `422`: Password outside the length policy
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate()?;

    state
        .services
        .accounts
        .consume_reset(&req.token, &req.password)
        .await?;

    Ok(Json(ApiResponse::empty()))
}
