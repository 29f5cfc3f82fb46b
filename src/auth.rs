/// Authentication extractors
use crate::{
    account::Role,
    api::middleware::extract_access_token,
    context::AppContext,
    db::user::PublicUser,
    error::ApiError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated requester - extracts and validates the access token,
/// resolving it to a live account without secret fields
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        // Token from the session cookie or the Authorization header
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Unauthorized request".to_string()))?;

        let user = state.accounts.validate_access_token(&token).await?;

        Ok(AuthUser(user))
    }
}

/// Authenticated requester whose token claims must carry the admin role.
/// The role check reads the claims only; handlers are never reached by a
/// non-admin caller.
#[derive(Debug, Clone)]
pub struct AdminUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppContext> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Unauthorized request".to_string()))?;

        let user = state
            .accounts
            .validate_role_token(&token, &[Role::Admin])
            .await?;

        Ok(AdminUser(user))
    }
}
