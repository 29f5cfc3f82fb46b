/// Signed session tokens
///
/// Access and refresh tokens are HS256 JWTs signed with distinct secrets.
/// Access tokens carry the role claims so the authorization gate never needs
/// a store lookup; the refresh-derived reissue path deliberately omits them
/// and is short-lived, so role-gated calls require a fresh login.
use crate::{
    account::Role,
    error::{ApiError, ApiResult},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token lifetime
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
/// Refresh token lifetime
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 1;
/// Lifetime of an access token minted from a refresh token
pub const REISSUED_ACCESS_TTL_SECONDS: i64 = 30;

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies session tokens
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
}

impl TokenIssuer {
    pub fn new(access_secret: String, refresh_secret: String) -> Self {
        Self {
            access_secret,
            refresh_secret,
        }
    }

    pub fn issue_access_token(
        &self,
        user_id: &str,
        email: &str,
        roles: &[Role],
    ) -> ApiResult<String> {
        self.sign(
            user_id,
            email,
            Some(roles.to_vec()),
            Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            &self.access_secret,
        )
    }

    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        roles: &[Role],
    ) -> ApiResult<String> {
        self.sign(
            user_id,
            email,
            Some(roles.to_vec()),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
            &self.refresh_secret,
        )
    }

    /// Mint a short-lived access token from a validated refresh token.
    /// Carries no role claims.
    pub fn reissue_access_token(&self, user_id: &str, email: &str) -> ApiResult<String> {
        self.sign(
            user_id,
            email,
            None,
            Duration::seconds(REISSUED_ACCESS_TTL_SECONDS),
            &self.access_secret,
        )
    }

    fn sign(
        &self,
        user_id: &str,
        email: &str,
        roles: Option<Vec<Role>>,
        ttl: Duration,
        secret: &str,
    ) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_access_token(&self, token: &str) -> ApiResult<Claims> {
        Self::verify(token, &self.access_secret)
    }

    pub fn verify_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        Self::verify(token, &self.refresh_secret)
    }

    fn verify(token: &str, secret: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ApiError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::Authentication("Invalid token signature".to_string())
            }
            _ => ApiError::Authentication(format!("Invalid token: {}", e)),
        })
    }
}
