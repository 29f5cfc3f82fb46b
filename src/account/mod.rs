/// Account lifecycle and session management
///
/// Handles registration, email verification, login, token refresh, password
/// reset, and role assignment.

mod manager;
pub mod otp;
pub mod password;
pub mod roles;
mod tokens;

pub use manager::AccountManager;
pub use roles::Role;
pub use tokens::{
    Claims, TokenIssuer, ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS,
    REISSUED_ACCESS_TTL_SECONDS,
};

use crate::db::user::PublicUser;
use serde::Deserialize;

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Email verification request
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// Login request; the identifier is a username or an email
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Password reset initiation request
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePasswordResetRequest {
    pub email: Option<String>,
}

/// Password reset completion request
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub password: Option<String>,
}

/// Role assignment request
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolesRequest {
    pub roles: Option<Vec<String>>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}
