/// Account and session endpoints
use crate::{
    account::{
        AssignRolesRequest, InitiatePasswordResetRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest, Role, VerifyEmailRequest,
    },
    api::{middleware, ApiResponse},
    auth::AdminUser,
    context::AppContext,
    db::user::PublicUser,
    error::ApiResult,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users", post(register))
        .route("/otp-verifications", post(verify_email))
        .route("/sessions", post(login).delete(logout))
        .route("/tokens", post(refresh_token))
        .route("/password-reset-requests", post(initiate_password_reset))
        .route("/passwords", post(reset_password))
        .route("/roles/:user_id", post(assign_roles))
}

/// Register endpoint
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    let user = ctx.accounts.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User registered successfully", user)),
    ))
}

/// Email OTP verification endpoint
async fn verify_email(
    State(ctx): State<AppContext>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    ctx.accounts.verify_email(req).await?;

    Ok(Json(ApiResponse::message("Email verified successfully")))
}

/// Login endpoint. The token pair is delivered as session cookies and the
/// account (sans secrets) in the body.
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<PublicUser>>)> {
    let outcome = ctx.accounts.login(req).await?;

    let jar = jar
        .add(middleware::session_cookie(
            middleware::ACCESS_COOKIE,
            outcome.access_token,
        ))
        .add(middleware::session_cookie(
            middleware::REFRESH_COOKIE,
            outcome.refresh_token,
        ));

    Ok((jar, Json(ApiResponse::new("Login success", outcome.user))))
}

/// Logout endpoint. Always succeeds; clears the session cookies either way.
async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ApiResponse<()>>)> {
    let token = middleware::extract_refresh_token(&headers);
    ctx.accounts.logout(token).await?;

    let jar = middleware::clear_session_cookies(jar);

    Ok((jar, Json(ApiResponse::message("Logged out successfully"))))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshedToken {
    access_token: String,
}

/// Refresh endpoint. An absent refresh token is treated as an implicit
/// logout signal, not an error.
async fn refresh_token(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ApiResponse<RefreshedToken>>)> {
    let Some(token) = middleware::extract_refresh_token(&headers) else {
        let jar = middleware::clear_session_cookies(jar);
        return Ok((
            jar,
            Json(ApiResponse::message("User logged out successfully")),
        ));
    };

    let access_token = ctx.accounts.refresh_access_token(&token).await?;

    let jar = jar.add(middleware::session_cookie(
        middleware::ACCESS_COOKIE,
        access_token.clone(),
    ));

    Ok((
        jar,
        Json(ApiResponse::new(
            "Token refreshed",
            RefreshedToken { access_token },
        )),
    ))
}

/// Password reset initiation endpoint
async fn initiate_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<InitiatePasswordResetRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    ctx.accounts.initiate_password_reset(req).await?;

    Ok(Json(ApiResponse::message("OTP sent to email")))
}

/// Password reset completion endpoint
async fn reset_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    ctx.accounts.reset_password(req).await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// Role assignment endpoint, admin only
async fn assign_roles(
    State(ctx): State<AppContext>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    Json(req): Json<AssignRolesRequest>,
) -> ApiResult<Json<ApiResponse<Vec<Role>>>> {
    let roles = ctx.accounts.assign_roles(&user_id, req).await?;

    Ok(Json(ApiResponse::new(
        "User roles updated successfully",
        roles,
    )))
}
